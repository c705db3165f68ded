//! Device YAML configuration loading
//!
//! This crate loads a device config with the tags device configs use:
//!
//! - `!secret key` - Substitute from secrets.yaml
//! - `!include path` - Include another YAML file
//! - `!include {file: path, vars: {..}}` - Include with extra substitutions
//! - `!env_var VAR [default]` - Environment variable substitution
//!
//! and then expands the top-level `substitutions:` block. [`DeviceDocument`]
//! picks out the ratgdo hub and binary-sensor entries.
//!
//! # Example
//!
//! ```ignore
//! use rg_config::DeviceDocument;
//!
//! let doc = DeviceDocument::load("/config", "garage.yaml")?;
//! for entry in &doc.binary_sensors {
//!     println!("{}: {:?}", entry.path, entry.value);
//! }
//! ```

mod document;
mod error;
mod loader;
mod secrets;
mod substitutions;

pub use document::{DeviceDocument, RawEntry, PLATFORM_KEY};
pub use error::{ConfigError, ConfigResult};
pub use loader::{load_yaml, load_yaml_string, YamlLoader};
pub use secrets::{Secrets, SECRETS_FILE};
pub use substitutions::{Substitutions, SUBSTITUTIONS_KEY};

// Re-export serde_yaml::Value for convenience
pub use serde_yaml::Value;
