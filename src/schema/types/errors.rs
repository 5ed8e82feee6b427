use thiserror::Error;

/// Errors raised by schema lookup and definition handling.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// No schema is registered under the requested uid.
    #[error("Schema not found: {0}")]
    NotFound(String),

    /// An attribute definition or reference was invalid.
    #[error("Invalid attribute: {0}")]
    InvalidAttribute(String),
}
