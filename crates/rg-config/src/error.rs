//! Error types for configuration loading

use std::path::PathBuf;
use thiserror::Error;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that can occur while loading a device configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a file
    #[error("failed to read file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse YAML
    #[error("failed to parse YAML in {path}: {source}")]
    ParseYaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// Secret not found
    #[error("secret '{key}' not defined in {path}")]
    SecretNotFound { key: String, path: PathBuf },

    /// Invalid include argument
    #[error("invalid !include in {path}: {reason}")]
    InvalidInclude { path: PathBuf, reason: String },

    /// Circular include detected
    #[error("circular include detected: {path}")]
    CircularInclude { path: PathBuf },

    /// Environment variable not set and no default given
    #[error("environment variable '{var}' not set")]
    EnvVarNotFound { var: String },

    /// `${name}` used but never defined
    #[error("substitution '{name}' is not defined")]
    UndefinedSubstitution { name: String },

    /// Invalid configuration value
    #[error("invalid configuration value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },
}
