//! Error types for the Helios assistant.

use thiserror::Error;

/// Result type alias using HeliosError.
pub type Result<T> = std::result::Result<T, HeliosError>;

/// Errors that can occur in the Helios assistant.
#[derive(Error, Debug)]
pub enum HeliosError {
    /// The search call exceeded its time bound.
    #[error("Retrieval timed out after {timeout_ms}ms")]
    RetrievalTimeout { timeout_ms: u64 },

    /// The search backend failed or returned an error.
    #[error("Retrieval failed: {message}")]
    Retrieval { message: String },

    /// An expected field is missing from a hit.
    #[error("Schema mismatch: field '{field}' missing from hit in index '{index}'")]
    SchemaMismatch { index: String, field: String },

    /// A hit came back from an index with no configured descriptor.
    #[error("Schema mismatch: hit from index '{index}', which has no configured descriptor")]
    UnknownIndex { index: String },

    /// The completion model failed or timed out.
    #[error("Completion failed: {message}")]
    Completion { message: String },

    /// Invalid argument provided.
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl HeliosError {
    /// Create a retrieval error.
    pub fn retrieval(message: impl Into<String>) -> Self {
        Self::Retrieval {
            message: message.into(),
        }
    }

    /// Create a schema mismatch error.
    pub fn schema_mismatch(index: impl Into<String>, field: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            index: index.into(),
            field: field.into(),
        }
    }

    /// Create an unknown index error.
    pub fn unknown_index(index: impl Into<String>) -> Self {
        Self::UnknownIndex {
            index: index.into(),
        }
    }

    /// Create a completion error.
    pub fn completion(message: impl Into<String>) -> Self {
        Self::Completion {
            message: message.into(),
        }
    }

    /// Create an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Get a stable error code for display and logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::RetrievalTimeout { .. } => "RETRIEVAL_TIMEOUT",
            Self::Retrieval { .. } => "RETRIEVAL_ERROR",
            Self::SchemaMismatch { .. } | Self::UnknownIndex { .. } => "SCHEMA_MISMATCH",
            Self::Completion { .. } => "COMPLETION_ERROR",
            Self::InvalidArgument { .. } => "INVALID_ARGUMENT",
            Self::Io(_) => "IO_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::Config { .. } => "CONFIG_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = HeliosError::schema_mismatch("opendata-chat", "semantic_field");
        let text = err.to_string();
        assert!(text.contains("opendata-chat"));
        assert!(text.contains("semantic_field"));
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            HeliosError::RetrievalTimeout { timeout_ms: 10_000 }.error_code(),
            "RETRIEVAL_TIMEOUT"
        );
        assert_eq!(
            HeliosError::completion("boom").error_code(),
            "COMPLETION_ERROR"
        );
        assert_eq!(HeliosError::config("missing").error_code(), "CONFIG_ERROR");
        assert_eq!(HeliosError::unknown_index("C").error_code(), "SCHEMA_MISMATCH");
    }

    #[test]
    fn test_unknown_index_display_names_index_only() {
        let text = HeliosError::unknown_index("C").to_string();
        assert!(text.contains("'C'"));
        assert!(text.contains("no configured descriptor"));
        assert!(!text.contains("field"));
    }
}
