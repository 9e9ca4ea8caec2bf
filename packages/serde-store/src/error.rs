//! Error type for the payload layer.

use thiserror::Error;

use crate::path::PathError;

/// Errors raised while converting, loading or applying payloads.
#[derive(Debug, Error)]
pub enum PayloadError {
    /// Resolution or write failure in the core layer.
    #[error(transparent)]
    Core(#[from] recstore_core::Error),

    /// A dotted payload key is malformed.
    #[error(transparent)]
    Path(#[from] PathError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Computed values have no serialized form.
    #[error("cannot serialize computed value at '{key}' ({hook})")]
    Unserializable { key: String, hook: String },

    /// A payload or child payload was not a mapping.
    #[error("expected a mapping, found {found}")]
    NotAMapping { found: String },
}

impl PayloadError {
    /// True if the underlying core error is a missing key.
    pub fn is_key_not_found(&self) -> bool {
        matches!(self, PayloadError::Core(e) if e.is_key_not_found())
    }
}

/// Result type alias for payload operations.
pub type Result<T> = std::result::Result<T, PayloadError>;
