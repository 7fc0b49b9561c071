//! Error handling for motorbench
//!
//! Crate-wide error type built on thiserror. Transcoding failures have their
//! own [`ParseError`](crate::transcoder::ParseError) and convert into
//! [`BenchError::Parse`].

use thiserror::Error;

use crate::transcoder::ParseError;

/// Main error type for motorbench
#[derive(Error, Debug)]
pub enum BenchError {
    /// IO errors (document files, store directory)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors (config, store index)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Test document could not be parsed
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Definition store errors
    #[error("Store error: {0}")]
    Store(String),

    /// Editing operation addressed something that does not exist
    #[error("Editor error: {0}")]
    Editor(String),

    /// Validation errors (user input, schema checks)
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias for motorbench operations
pub type Result<T> = std::result::Result<T, BenchError>;

impl BenchError {
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    pub fn editor(msg: impl Into<String>) -> Self {
        Self::Editor(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BenchError::store("no saved definition at 'x.yaml'");
        assert_eq!(err.to_string(), "Store error: no saved definition at 'x.yaml'");

        let err = BenchError::validation("'x' is not a number");
        assert_eq!(err.to_string(), "Validation error: 'x' is not a number");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: BenchError = io_err.into();
        assert!(matches!(err, BenchError::Io(_)));
    }

    #[test]
    fn test_parse_error_conversion() {
        let err: BenchError = ParseError::MissingSequence.into();
        assert!(matches!(err, BenchError::Parse(_)));
        assert!(err.to_string().starts_with("Parse error:"));
    }
}
