//! Error types for the liquidity signal pipeline.

use crate::types::RawMessage;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Numeric type a message field is coerced to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericType {
    Integer,
    Float,
}

impl fmt::Display for NumericType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericType::Integer => f.write_str("integer"),
            NumericType::Float => f.write_str("float"),
        }
    }
}

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    Coercion,
    Config,
    Data,
    Io,
    Json,
}

/// Main error type for the liquidity signal pipeline.
#[derive(Error, Debug)]
pub enum Error {
    /// The schema predicate rejected the message.
    #[error("Invalid message format")]
    Validation {
        /// The rejected message, kept for diagnostics.
        message: RawMessage,
    },

    /// A numeric field is present but cannot be coerced.
    #[error("Cannot coerce field '{field}' to {expected}: {value}")]
    Coercion {
        field: String,
        expected: NumericType,
        value: Value,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data error (input that is not a message at all).
    #[error("Data error: {0}")]
    Data(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a validation error carrying the rejected message.
    pub fn validation(message: RawMessage) -> Self {
        Error::Validation { message }
    }

    /// Create a coercion error for `field`.
    pub fn coercion(field: impl Into<String>, expected: NumericType, value: Value) -> Self {
        Error::Coercion {
            field: field.into(),
            expected,
            value,
        }
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create a data error.
    pub fn data(msg: impl Into<String>) -> Self {
        Error::Data(msg.into())
    }

    /// Get the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation { .. } => ErrorKind::Validation,
            Error::Coercion { .. } => ErrorKind::Coercion,
            Error::Config(_) => ErrorKind::Config,
            Error::Data(_) => ErrorKind::Data,
            Error::Io(_) => ErrorKind::Io,
            Error::Json(_) => ErrorKind::Json,
        }
    }

    /// The rejected message, for validation errors.
    pub fn rejected_message(&self) -> Option<&RawMessage> {
        match self {
            Error::Validation { message } => Some(message),
            _ => None,
        }
    }
}
