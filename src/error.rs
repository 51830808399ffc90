//! Error types for the asset identification resolver.
//!
//! Only caller mistakes surface as errors: a malformed signature database,
//! a bad configuration file, an invalid fingerprint string or a scan root that
//! cannot be listed. Everything that goes wrong with individual files during a
//! scan is reported through [`crate::core::issues::DetectionIssue`] instead.

use thiserror::Error;

/// Main error type for resolver operations.
#[derive(Debug, Error)]
pub enum ResolverError {
    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A fingerprint string that is not 32 hex digits
    #[error("Invalid fingerprint: {0}")]
    InvalidFingerprint(String),

    /// A signature or table entry that fails validation at load time
    #[error("Invalid signature for '{game_id}': {message}")]
    InvalidSignature { game_id: String, message: String },

    /// Invalid input data
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The caller asked the scan to stop
    #[error("Scan cancelled")]
    Cancelled,
}

impl ResolverError {
    pub(crate) fn invalid_signature(game_id: &str, message: impl Into<String>) -> Self {
        ResolverError::InvalidSignature {
            game_id: game_id.to_string(),
            message: message.into(),
        }
    }
}

/// Result type alias for resolver operations
pub type Result<T> = std::result::Result<T, ResolverError>;
