//! Error types for the bigwall query engine.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, BigWallError>;

/// Errors surfaced to callers.
///
/// Empty query results and stale completions are not errors: the former turn
/// into explicit no-data values, the latter are dropped by the session.
#[derive(Debug, Error)]
pub enum BigWallError {
    /// Rejected query request (non-finite center, non-positive radius).
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Malformed record or coordinate supplied at load time.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Input parsed but was not shaped as expected.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("Serialization error: {0}")]
    SerializationErrorWithContext(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
