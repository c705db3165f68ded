//! Device YAML loader with custom tag support
//!
//! Supported tags:
//! - `!secret key` - value from secrets.yaml
//! - `!include path` - another YAML file, relative to the including file
//! - `!include {file: path, vars: {..}}` - include with extra substitutions
//! - `!env_var NAME [default]` - environment variable
//!
//! After tags are resolved the top-level `substitutions:` block is removed
//! and its variables are expanded across the document.

use crate::error::{ConfigError, ConfigResult};
use crate::secrets::Secrets;
use crate::substitutions::Substitutions;
use serde_yaml::value::TaggedValue;
use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// YAML loader resolving device-config tags
pub struct YamlLoader {
    config_dir: PathBuf,
    secrets: Secrets,
    /// Files currently being loaded, outermost first
    include_stack: Vec<PathBuf>,
}

impl YamlLoader {
    /// Create a loader for `config_dir`, reading its secrets.yaml
    pub fn new(config_dir: impl Into<PathBuf>) -> ConfigResult<Self> {
        let config_dir = config_dir.into();
        let secrets = Secrets::load(&config_dir)?;
        Ok(Self::with_secrets(config_dir, secrets))
    }

    /// Create a loader with pre-loaded secrets
    pub fn with_secrets(config_dir: impl Into<PathBuf>, secrets: Secrets) -> Self {
        Self {
            config_dir: config_dir.into(),
            secrets,
            include_stack: Vec::new(),
        }
    }

    /// Load a device config file: resolve tags, then apply substitutions
    pub fn load_document(&mut self, path: impl AsRef<Path>) -> ConfigResult<Value> {
        let mut document = self.load_file(path)?;
        finish_document(&mut document)
    }

    /// Load a device config from text: resolve tags, then apply substitutions
    pub fn load_document_str(&mut self, content: &str, source: &Path) -> ConfigResult<Value> {
        let mut document = self.load_str(content, source)?;
        finish_document(&mut document)
    }

    /// Load a YAML file and resolve its tags, without substitutions
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> ConfigResult<Value> {
        let resolved = self.resolve(path.as_ref());
        // Canonical paths so `sub/../a.yaml` and `a.yaml` compare equal
        let path = fs::canonicalize(&resolved).map_err(|e| ConfigError::ReadFile {
            path: resolved,
            source: e,
        })?;
        debug!("Loading YAML file: {:?}", path);

        if self.include_stack.contains(&path) {
            return Err(ConfigError::CircularInclude { path });
        }

        let content = fs::read_to_string(&path).map_err(|e| ConfigError::ReadFile {
            path: path.clone(),
            source: e,
        })?;

        self.include_stack.push(path.clone());
        let result = self.load_str(&content, &path);
        self.include_stack.pop();
        result
    }

    /// Parse YAML text and resolve its tags
    pub fn load_str(&mut self, content: &str, source: &Path) -> ConfigResult<Value> {
        let value: Value = serde_yaml::from_str(content).map_err(|e| ConfigError::ParseYaml {
            path: source.to_path_buf(),
            source: e,
        })?;
        self.resolve_tags(value, source)
    }

    fn resolve_tags(&mut self, value: Value, source: &Path) -> ConfigResult<Value> {
        match value {
            Value::Tagged(tagged) => self.resolve_tag(*tagged, source),
            Value::Sequence(seq) => seq
                .into_iter()
                .map(|v| self.resolve_tags(v, source))
                .collect::<ConfigResult<Vec<_>>>()
                .map(Value::Sequence),
            Value::Mapping(map) => {
                let mut out = Mapping::with_capacity(map.len());
                for (k, v) in map {
                    out.insert(k, self.resolve_tags(v, source)?);
                }
                Ok(Value::Mapping(out))
            }
            other => Ok(other),
        }
    }

    fn resolve_tag(&mut self, tagged: TaggedValue, source: &Path) -> ConfigResult<Value> {
        trace!("Resolving tag {} in {:?}", tagged.tag, source);

        if tagged.tag == "secret" {
            self.secret(tagged.value)
        } else if tagged.tag == "include" {
            self.include(tagged.value, source)
        } else if tagged.tag == "env_var" {
            env_var(tagged.value)
        } else {
            // Unknown tags (e.g. !lambda) pass through for the consumer
            let value = self.resolve_tags(tagged.value, source)?;
            Ok(Value::Tagged(Box::new(TaggedValue {
                tag: tagged.tag,
                value,
            })))
        }
    }

    fn secret(&self, value: Value) -> ConfigResult<Value> {
        let Value::String(key) = value else {
            return Err(ConfigError::InvalidValue {
                key: "!secret".to_string(),
                reason: "secret key must be a string".to_string(),
            });
        };
        let secret = self.secrets.get(&key)?;
        debug!("Substituted secret '{}'", key);
        Ok(Value::String(secret.to_string()))
    }

    fn include(&mut self, value: Value, source: &Path) -> ConfigResult<Value> {
        let (file, vars) = match value {
            Value::String(file) => (file, None),
            Value::Mapping(mut map) => {
                let file = match map.remove("file") {
                    Some(Value::String(file)) => file,
                    _ => {
                        return Err(ConfigError::InvalidInclude {
                            path: source.to_path_buf(),
                            reason: "mapping form requires a string 'file' key".to_string(),
                        })
                    }
                };
                let vars = match map.remove("vars") {
                    None | Some(Value::Null) => None,
                    Some(Value::Mapping(vars)) => Some(Substitutions::from_mapping(&vars)?),
                    Some(_) => {
                        return Err(ConfigError::InvalidInclude {
                            path: source.to_path_buf(),
                            reason: "'vars' must be a mapping".to_string(),
                        })
                    }
                };
                (file, vars)
            }
            other => {
                return Err(ConfigError::InvalidInclude {
                    path: source.to_path_buf(),
                    reason: format!("expected a path or mapping, got {:?}", other),
                })
            }
        };

        let base = source.parent().unwrap_or(&self.config_dir);
        let target = base.join(&file);
        debug!("Including {:?} from {:?}", target, source);

        let included = self.load_file(&target)?;
        match vars {
            // Leave unknown ${..} for the document-level pass
            Some(vars) => vars.apply(included, false),
            None => Ok(included),
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.config_dir.join(path)
        }
    }

    pub fn secrets(&self) -> &Secrets {
        &self.secrets
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }
}

/// `!env_var NAME` or `!env_var NAME default value`
fn env_var(value: Value) -> ConfigResult<Value> {
    let Value::String(spec) = value else {
        return Err(ConfigError::InvalidValue {
            key: "!env_var".to_string(),
            reason: "environment variable name must be a string".to_string(),
        });
    };

    let (name, default) = match spec.trim().split_once(char::is_whitespace) {
        Some((name, default)) => (name, Some(default.trim())),
        None => (spec.trim(), None),
    };

    match (std::env::var(name), default) {
        (Ok(v), _) => Ok(Value::String(v)),
        (Err(_), Some(default)) => {
            debug!("Environment variable '{}' unset, using default", name);
            Ok(Value::String(default.to_string()))
        }
        (Err(_), None) => Err(ConfigError::EnvVarNotFound {
            var: name.to_string(),
        }),
    }
}

fn finish_document(document: &mut Value) -> ConfigResult<Value> {
    let substitutions = Substitutions::take_from_document(document)?;
    substitutions.apply(std::mem::take(document), true)
}

/// Load a device config file relative to `config_dir`
pub fn load_yaml(config_dir: impl Into<PathBuf>, file: impl AsRef<Path>) -> ConfigResult<Value> {
    YamlLoader::new(config_dir)?.load_document(file)
}

/// Load a device config from a string, resolving includes against `config_dir`
pub fn load_yaml_string(
    config_dir: impl Into<PathBuf>,
    content: &str,
    source_name: &str,
) -> ConfigResult<Value> {
    let config_dir = config_dir.into();
    let source = config_dir.join(source_name);
    YamlLoader::new(config_dir)?.load_document_str(content, &source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: &str) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_load_plain() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "garage.yaml", "esphome:\n  name: garage\n");

        let doc = load_yaml(dir.path(), "garage.yaml").unwrap();
        assert_eq!(doc["esphome"]["name"], Value::String("garage".to_string()));
    }

    #[test]
    fn test_secret() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "secrets.yaml", "door_name: Main Door\n");
        write(dir.path(), "garage.yaml", "name: !secret door_name\n");

        let doc = load_yaml(dir.path(), "garage.yaml").unwrap();
        assert_eq!(doc["name"], Value::String("Main Door".to_string()));
    }

    #[test]
    fn test_missing_secret() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "garage.yaml", "name: !secret nope\n");

        let result = load_yaml(dir.path(), "garage.yaml");
        assert!(matches!(result, Err(ConfigError::SecretNotFound { key, .. }) if key == "nope"));
    }

    #[test]
    fn test_include_relative_to_including_file() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "common/sensors.yaml", "- platform: ratgdo\n  type: motion\n");
        write(
            dir.path(),
            "garage.yaml",
            "binary_sensor: !include common/sensors.yaml\n",
        );

        let doc = load_yaml(dir.path(), "garage.yaml").unwrap();
        let sensors = doc["binary_sensor"].as_sequence().unwrap();
        assert_eq!(sensors.len(), 1);
        assert_eq!(sensors[0]["type"], Value::String("motion".to_string()));
    }

    #[test]
    fn test_include_with_vars() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "sensor.yaml",
            "platform: ratgdo\ntype: ${kind}\nname: ${door} ${kind}\n",
        );
        write(
            dir.path(),
            "garage.yaml",
            "substitutions:\n  door: Garage\nbinary_sensor:\n  - !include {file: sensor.yaml, vars: {kind: motion}}\n",
        );

        let doc = load_yaml(dir.path(), "garage.yaml").unwrap();
        let sensor = &doc["binary_sensor"][0];
        assert_eq!(sensor["type"], Value::String("motion".to_string()));
        assert_eq!(sensor["name"], Value::String("Garage motion".to_string()));
    }

    #[test]
    fn test_circular_include() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.yaml", "b: !include b.yaml\n");
        write(dir.path(), "b.yaml", "a: !include a.yaml\n");

        let result = load_yaml(dir.path(), "a.yaml");
        assert!(matches!(result, Err(ConfigError::CircularInclude { .. })));
    }

    #[test]
    fn test_circular_include_through_parent_dir() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.yaml", "b: !include sub/b.yaml\n");
        write(dir.path(), "sub/b.yaml", "a: !include ../a.yaml\n");

        let result = load_yaml(dir.path(), "a.yaml");
        assert!(matches!(result, Err(ConfigError::CircularInclude { .. })));
    }

    #[test]
    fn test_missing_include() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.yaml", "b: !include nowhere.yaml\n");

        let result = load_yaml(dir.path(), "a.yaml");
        assert!(matches!(result, Err(ConfigError::ReadFile { .. })));
    }

    #[test]
    fn test_env_var_with_default() {
        let dir = TempDir::new().unwrap();
        std::env::set_var("RG_CONFIG_TEST_PIN", "D5");
        write(
            dir.path(),
            "garage.yaml",
            "pin: !env_var RG_CONFIG_TEST_PIN\nother: !env_var RG_CONFIG_TEST_UNSET D7\n",
        );

        let doc = load_yaml(dir.path(), "garage.yaml").unwrap();
        assert_eq!(doc["pin"], Value::String("D5".to_string()));
        assert_eq!(doc["other"], Value::String("D7".to_string()));
        std::env::remove_var("RG_CONFIG_TEST_PIN");
    }

    #[test]
    fn test_env_var_missing() {
        let result = env_var(Value::String("RG_CONFIG_TEST_DEFINITELY_UNSET".to_string()));
        assert!(matches!(result, Err(ConfigError::EnvVarNotFound { .. })));
    }

    #[test]
    fn test_undefined_substitution() {
        let dir = TempDir::new().unwrap();
        let result = load_yaml_string(dir.path(), "name: ${nope}\n", "garage.yaml");
        assert!(matches!(result, Err(ConfigError::UndefinedSubstitution { .. })));
    }

    #[test]
    fn test_unknown_tag_passes_through() {
        let dir = TempDir::new().unwrap();
        let doc = load_yaml_string(dir.path(), "code: !lambda return true;\n", "garage.yaml")
            .unwrap();
        assert!(matches!(doc["code"], Value::Tagged(_)));
    }
}
