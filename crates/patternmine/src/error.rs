//! Error types for the patternmine library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for patternmine operations.
#[derive(Debug, Error)]
pub enum PatternError {
    /// Error reading or accessing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A configured field never appears in the input records.
    #[error("Field '{field}' is not present in any record of dataset '{dataset}'")]
    MissingField { dataset: String, field: String },

    /// Dispatch addressed a receiver that is not registered.
    #[error("Agent '{receiver}' not found")]
    RouteNotFound { receiver: String },

    /// A receiver got a message kind it does not implement.
    #[error("Agent '{receiver}' does not support message type '{kind}'")]
    UnsupportedMessageKind { receiver: String, kind: String },

    /// A free-text query did not match any known pattern.
    #[error("Pattern not recognized: {0}")]
    UnknownQuery(String),
}

/// Result type alias for patternmine operations.
pub type Result<T> = std::result::Result<T, PatternError>;
