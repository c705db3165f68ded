//! `substitutions:` block and `${name}` expansion

use crate::error::{ConfigError, ConfigResult};
use crate::secrets::scalar_to_string;
use indexmap::IndexMap;
use regex::{Captures, Regex};
use serde_yaml::{Mapping, Value};
use std::sync::OnceLock;
use tracing::trace;

/// Top-level key holding the substitution variables
pub const SUBSTITUTIONS_KEY: &str = "substitutions";

fn pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\$\{([A-Za-z0-9_]+)\}|\$([A-Za-z0-9_]+)").expect("substitution pattern")
    })
}

/// Substitution variables, in declaration order
#[derive(Debug, Clone, Default)]
pub struct Substitutions {
    vars: IndexMap<String, String>,
}

impl Substitutions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a mapping of scalar values
    pub fn from_mapping(mapping: &Mapping) -> ConfigResult<Self> {
        let mut vars = IndexMap::new();
        for (key, value) in mapping {
            let name = key.as_str().ok_or_else(|| ConfigError::InvalidValue {
                key: SUBSTITUTIONS_KEY.to_string(),
                reason: format!("substitution names must be strings, got {:?}", key),
            })?;
            if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(ConfigError::InvalidValue {
                    key: format!("{}.{}", SUBSTITUTIONS_KEY, name),
                    reason: "substitution names may only contain letters, digits and underscores"
                        .to_string(),
                });
            }
            let text = scalar_to_string(value).ok_or_else(|| ConfigError::InvalidValue {
                key: format!("{}.{}", SUBSTITUTIONS_KEY, name),
                reason: "substitution values must be scalars".to_string(),
            })?;
            vars.insert(name.to_string(), text);
        }
        Ok(Self { vars })
    }

    /// Remove the `substitutions:` block from a document and parse it
    pub fn take_from_document(document: &mut Value) -> ConfigResult<Self> {
        let Some(root) = document.as_mapping_mut() else {
            return Ok(Self::new());
        };
        match root.remove(SUBSTITUTIONS_KEY) {
            None | Some(Value::Null) => Ok(Self::new()),
            Some(Value::Mapping(mapping)) => Self::from_mapping(&mapping),
            Some(_) => Err(ConfigError::InvalidValue {
                key: SUBSTITUTIONS_KEY.to_string(),
                reason: "expected a mapping".to_string(),
            }),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Expand variables in every string scalar of `value`
    ///
    /// With `strict`, an undefined `${name}` is an error. Bare `$name`
    /// references that are undefined are always left untouched.
    pub fn apply(&self, value: Value, strict: bool) -> ConfigResult<Value> {
        match value {
            Value::String(s) => Ok(Value::String(self.expand(&s, strict)?)),
            Value::Sequence(seq) => seq
                .into_iter()
                .map(|v| self.apply(v, strict))
                .collect::<ConfigResult<Vec<_>>>()
                .map(Value::Sequence),
            Value::Mapping(map) => {
                let mut out = Mapping::with_capacity(map.len());
                for (k, v) in map {
                    out.insert(k, self.apply(v, strict)?);
                }
                Ok(Value::Mapping(out))
            }
            other => Ok(other),
        }
    }

    /// Expand variables in a single string
    pub fn expand(&self, input: &str, strict: bool) -> ConfigResult<String> {
        if !input.contains('$') {
            return Ok(input.to_string());
        }

        let mut missing = None;
        let expanded = pattern().replace_all(input, |caps: &Captures| {
            let (name, braced) = match (caps.get(1), caps.get(2)) {
                (Some(m), _) => (m.as_str(), true),
                (None, Some(m)) => (m.as_str(), false),
                (None, None) => unreachable!("pattern has two alternatives"),
            };
            match self.vars.get(name) {
                Some(v) => v.clone(),
                None => {
                    if strict && braced && missing.is_none() {
                        missing = Some(name.to_string());
                    }
                    caps[0].to_string()
                }
            }
        });

        if let Some(name) = missing {
            return Err(ConfigError::UndefinedSubstitution { name });
        }
        trace!("Expanded '{}' -> '{}'", input, expanded);
        Ok(expanded.into_owned())
    }
}
