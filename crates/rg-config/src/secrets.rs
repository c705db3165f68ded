//! secrets.yaml lookup for `!secret` tags

use crate::error::{ConfigError, ConfigResult};
use serde_yaml::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name secrets are read from, next to the device config
pub const SECRETS_FILE: &str = "secrets.yaml";

/// Secrets loaded from secrets.yaml
#[derive(Debug, Clone)]
pub struct Secrets {
    values: HashMap<String, String>,
    path: PathBuf,
}

impl Secrets {
    /// Load secrets from `<config_dir>/secrets.yaml`
    ///
    /// A missing file yields an empty store; `!secret` lookups then fail
    /// individually with [`ConfigError::SecretNotFound`].
    pub fn load(config_dir: &Path) -> ConfigResult<Self> {
        let path = config_dir.join(SECRETS_FILE);

        if !path.exists() {
            debug!("No {} at {:?}", SECRETS_FILE, path);
            return Ok(Self {
                values: HashMap::new(),
                path,
            });
        }

        let content = fs::read_to_string(&path).map_err(|e| ConfigError::ReadFile {
            path: path.clone(),
            source: e,
        })?;
        Self::parse(&content, path)
    }

    /// Parse secrets from YAML text
    pub fn parse(content: &str, path: PathBuf) -> ConfigResult<Self> {
        let raw: HashMap<String, Value> =
            serde_yaml::from_str(content).map_err(|e| ConfigError::ParseYaml {
                path: path.clone(),
                source: e,
            })?;

        let mut values = HashMap::with_capacity(raw.len());
        for (key, value) in raw {
            let text = scalar_to_string(&value).ok_or_else(|| ConfigError::InvalidValue {
                key: key.clone(),
                reason: "secrets must be scalar values".to_string(),
            })?;
            values.insert(key, text);
        }

        debug!("Loaded {} secrets from {:?}", values.len(), path);
        Ok(Self { values, path })
    }

    /// Look up a secret by key
    pub fn get(&self, key: &str) -> ConfigResult<&str> {
        self.values
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| ConfigError::SecretNotFound {
                key: key.to_string(),
                path: self.path.clone(),
            })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Default for Secrets {
    fn default() -> Self {
        Self {
            values: HashMap::new(),
            path: PathBuf::from(SECRETS_FILE),
        }
    }
}

/// Render a scalar YAML value as text; collections yield `None`
pub(crate) fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some(String::new()),
        _ => None,
    }
}
