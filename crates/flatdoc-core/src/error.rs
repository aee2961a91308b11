//! Error types for flatdoc operations
//!
//! Contract violations (unmatched `*_end`, missing string table, corrupt
//! indices during decode) panic instead of returning an error. The variants
//! here cover conditions that depend on runtime data.

use std::fmt;

/// Result type alias for flatdoc operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for flatdoc operations
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A value could not be mapped onto the node set
    #[error("Serialization failed: {0}")]
    Serialize(String),

    /// Map key of a type that has no string form
    #[error("Map key must be a string, got {0}")]
    KeyMustBeString(&'static str),

    /// Integer does not fit the 64-bit signed node representation
    #[error("Integer {0} is outside the i64 range")]
    IntegerOutOfRange(String),

    /// A per-record handler failed and the whole batch was abandoned
    #[error("Handler failed on record {record}: {message}")]
    Handler {
        /// Position of the failing record in the batch
        record: usize,
        /// Handler error description
        message: String,
    },

    /// Batch received from elsewhere is structurally inconsistent
    #[error("Invalid batch: {0}")]
    InvalidBatch(String),

    /// I/O error while rendering output
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a serialization error
    pub fn serialize(message: impl Into<String>) -> Self {
        Self::Serialize(message.into())
    }

    /// Create a handler error for the record at `record`
    pub fn handler(record: usize, message: impl fmt::Display) -> Self {
        Self::Handler {
            record,
            message: message.to_string(),
        }
    }

    /// Create an invalid batch error
    pub fn invalid_batch(message: impl Into<String>) -> Self {
        Self::InvalidBatch(message.into())
    }
}

impl serde::ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Self::Serialize(msg.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handler_error_message() {
        let err = Error::handler(3, "boom");
        assert_eq!(err.to_string(), "Handler failed on record 3: boom");
    }

    #[test]
    fn test_serde_custom_error() {
        let err = <Error as serde::ser::Error>::custom("bad value");
        assert!(matches!(err, Error::Serialize(ref m) if m == "bad value"));
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::other("disk gone");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.to_string().contains("disk gone"));
    }
}
