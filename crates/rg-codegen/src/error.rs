//! Error types for code generation

use rg_core::ComponentId;
use thiserror::Error;

/// Result type for code generation
pub type CodegenResult<T> = Result<T, CodegenError>;

/// Errors raised while appending to a build script
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CodegenError {
    /// The same ID was declared twice
    #[error("ID '{id}' is already declared")]
    DuplicateId { id: ComponentId },

    /// An action referenced an ID that was never declared
    #[error("ID '{id}' not found (referenced by '{referenced_by}')")]
    UnknownId {
        id: ComponentId,
        referenced_by: String,
    },
}
