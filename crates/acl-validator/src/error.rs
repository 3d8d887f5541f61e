//! Error types for the runtime validator

use acl_types::TypesError;
use thiserror::Error;

/// Validator errors
#[derive(Debug, Error)]
pub enum ValidatorError {
    /// Configuration could not be loaded
    #[error("config error: {0}")]
    Config(String),

    /// Configured prefix table is invalid
    #[error("invalid prefix table: {0}")]
    PrefixTable(#[from] TypesError),
}

/// Result type for validator operations
pub type ValidatorResult<T> = Result<T, ValidatorError>;
