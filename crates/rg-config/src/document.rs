//! Device document
//!
//! Splits a loaded device config into the parts the ratgdo generator
//! consumes: the `ratgdo:` hub entries and the `binary_sensor:` entries
//! whose platform is `ratgdo`.

use serde_yaml::Value;
use std::path::Path;
use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::loader::load_yaml;

/// Key selecting the platform of a platform-style component entry
pub const PLATFORM_KEY: &str = "platform";

/// A raw config entry with its location in the document
#[derive(Debug, Clone, PartialEq)]
pub struct RawEntry {
    /// Path of the entry for error messages, e.g. `binary_sensor.2`
    pub path: String,
    /// The entry mapping, with `platform` removed
    pub value: Value,
}

/// The parts of a device config the ratgdo generator consumes
#[derive(Debug, Clone, Default)]
pub struct DeviceDocument {
    /// `esphome: name:` of the device, if present
    pub device_name: Option<String>,
    /// Entries of the `ratgdo:` component
    pub hubs: Vec<RawEntry>,
    /// `binary_sensor:` entries with `platform: ratgdo`
    pub binary_sensors: Vec<RawEntry>,
}

impl DeviceDocument {
    /// Load and split a device config file
    pub fn load(config_dir: impl AsRef<Path>, file: impl AsRef<Path>) -> ConfigResult<Self> {
        let yaml = load_yaml(config_dir.as_ref(), file)?;
        Self::from_yaml(&yaml, rg_core::DOMAIN)
    }

    /// Split an already loaded document
    ///
    /// `domain` is both the hub component key and the child platform name.
    pub fn from_yaml(yaml: &Value, domain: &str) -> ConfigResult<Self> {
        let root = yaml.as_mapping().ok_or_else(|| ConfigError::InvalidValue {
            key: "root".to_string(),
            reason: "configuration must be a mapping".to_string(),
        })?;

        let device_name = root
            .get("esphome")
            .and_then(|e| e.get("name"))
            .and_then(Value::as_str)
            .map(str::to_string);

        let hubs = match root.get(domain) {
            None | Some(Value::Null) => Vec::new(),
            Some(hub @ Value::Mapping(_)) => vec![RawEntry {
                path: domain.to_string(),
                value: hub.clone(),
            }],
            Some(Value::Sequence(seq)) => seq
                .iter()
                .enumerate()
                .map(|(i, v)| RawEntry {
                    path: format!("{}.{}", domain, i),
                    value: v.clone(),
                })
                .collect(),
            Some(_) => {
                return Err(ConfigError::InvalidValue {
                    key: domain.to_string(),
                    reason: "expected a mapping or a list of mappings".to_string(),
                })
            }
        };

        let binary_sensors = platform_entries(root.get("binary_sensor"), "binary_sensor", domain)?;

        debug!(
            "Device document: {} {} hub(s), {} {} binary sensor(s)",
            hubs.len(),
            domain,
            binary_sensors.len(),
            domain
        );

        Ok(Self {
            device_name,
            hubs,
            binary_sensors,
        })
    }
}

/// Collect the entries of a platform-style component that belong to `platform`
fn platform_entries(
    section: Option<&Value>,
    component: &str,
    platform: &str,
) -> ConfigResult<Vec<RawEntry>> {
    let entries = match section {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Sequence(seq)) => seq,
        Some(_) => {
            return Err(ConfigError::InvalidValue {
                key: component.to_string(),
                reason: "expected a list of platform entries".to_string(),
            })
        }
    };

    let mut out = Vec::new();
    for (i, entry) in entries.iter().enumerate() {
        let path = format!("{}.{}", component, i);
        let mut map = entry
            .as_mapping()
            .cloned()
            .ok_or_else(|| ConfigError::InvalidValue {
                key: path.clone(),
                reason: "expected a mapping".to_string(),
            })?;

        match map.remove(PLATFORM_KEY) {
            Some(Value::String(p)) if p == platform => out.push(RawEntry {
                path,
                value: Value::Mapping(map),
            }),
            Some(Value::String(other)) => {
                debug!("Skipping {} with platform '{}'", path, other);
            }
            _ => {
                return Err(ConfigError::InvalidValue {
                    key: format!("{}.{}", path, PLATFORM_KEY),
                    reason: "required string key 'platform' is missing".to_string(),
                })
            }
        }
    }
    Ok(out)
}
