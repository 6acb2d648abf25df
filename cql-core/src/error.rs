//! Error types for CQL type serialization.

use std::io;
use thiserror::Error;

/// The main error type for codec, dispatcher and type parser operations.
#[derive(Debug, Error)]
pub enum CqlError {
    /// A value or descriptor cannot be mapped to a codec.
    #[error("invalid type: {0}")]
    InvalidType(String),

    /// The wire bytes do not match what the declared type requires.
    #[error("malformed data: {0}")]
    MalformedData(String),

    /// Incompatible codec registrations or missing out-of-band type information.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A vector value does not have the declared number of elements.
    #[error("vector dimension mismatch: provided {provided} elements, expected {expected}")]
    VectorDimensionMismatch {
        /// Number of elements in the value.
        provided: usize,
        /// Dimension declared by the type descriptor.
        expected: usize,
    },

    /// A textual type name could not be parsed.
    #[error("type parse error: {0}")]
    TypeParse(String),

    /// I/O errors from the standard library.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl CqlError {
    pub(crate) fn unknown_target_type(what: impl std::fmt::Display) -> Self {
        CqlError::InvalidType(format!("unknown target type: {}", what))
    }

    pub(crate) fn insufficient(needed: usize, available: usize) -> Self {
        CqlError::MalformedData(format!(
            "insufficient data: need {} bytes, have {}",
            needed, available
        ))
    }
}

/// A specialized `Result` type for CQL serialization operations.
pub type Result<T> = std::result::Result<T, CqlError>;
