//! Validation errors

use rg_core::{ComponentId, IdError};
use thiserror::Error;

/// Result type for config validation
pub type ValidationResult<T> = Result<T, ValidationError>;

/// A config entry was rejected
///
/// Every variant carries the entry path (e.g. `binary_sensor.0`) and, where
/// one exists, the offending field.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{path}: expected a mapping")]
    NotAMapping { path: String },

    #[error("{path}: required key '{field}' not provided")]
    MissingField { path: String, field: String },

    #[error("{path}.{field}: unknown value '{value}', valid options are {}", .allowed.join(", "))]
    UnknownValue {
        path: String,
        field: String,
        value: String,
        allowed: Vec<String>,
    },

    #[error("{path}.{field}: {reason}")]
    InvalidValue {
        path: String,
        field: String,
        reason: String,
    },

    #[error("{path}: extra keys not allowed: {}", .keys.join(", "))]
    ExtraKeys { path: String, keys: Vec<String> },

    #[error("{path}.{field}: {source}")]
    InvalidId {
        path: String,
        field: String,
        #[source]
        source: IdError,
    },

    #[error("{path}.{field}: ID '{id}' does not name a declared {expected}")]
    UnknownParent {
        path: String,
        field: String,
        id: ComponentId,
        expected: String,
    },

    #[error("{path}.{field}: no {expected} is declared to attach to")]
    NoParent {
        path: String,
        field: String,
        expected: String,
    },

    #[error("{path}.{field}: several {expected} components are declared ({}), please specify one", .candidates.join(", "))]
    AmbiguousParent {
        path: String,
        field: String,
        expected: String,
        candidates: Vec<String>,
    },

    #[error("{path}.id: ID '{id}' redefined (first declared at {first})")]
    DuplicateId {
        path: String,
        id: ComponentId,
        first: String,
    },
}

impl ValidationError {
    /// Path of the rejected entry
    pub fn path(&self) -> &str {
        match self {
            ValidationError::NotAMapping { path }
            | ValidationError::MissingField { path, .. }
            | ValidationError::UnknownValue { path, .. }
            | ValidationError::InvalidValue { path, .. }
            | ValidationError::ExtraKeys { path, .. }
            | ValidationError::InvalidId { path, .. }
            | ValidationError::UnknownParent { path, .. }
            | ValidationError::NoParent { path, .. }
            | ValidationError::AmbiguousParent { path, .. }
            | ValidationError::DuplicateId { path, .. } => path,
        }
    }

    /// The offending field, when the error concerns a single one
    pub fn field(&self) -> Option<&str> {
        match self {
            ValidationError::MissingField { field, .. }
            | ValidationError::UnknownValue { field, .. }
            | ValidationError::InvalidValue { field, .. }
            | ValidationError::InvalidId { field, .. }
            | ValidationError::UnknownParent { field, .. }
            | ValidationError::NoParent { field, .. }
            | ValidationError::AmbiguousParent { field, .. } => Some(field.as_str()),
            ValidationError::DuplicateId { .. } => Some("id"),
            ValidationError::NotAMapping { .. } | ValidationError::ExtraKeys { .. } => None,
        }
    }
}
