//! Error types for data parsing in linak-types.

use thiserror::Error;

/// Errors that can occur when parsing desk telemetry.
///
/// This error type is platform-agnostic and does not include
/// BLE-specific errors (those belong in linak-core).
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ParseError {
    /// Not enough bytes to decode the value.
    #[error("Insufficient bytes: requires {expected} bytes, got {actual}")]
    InsufficientBytes {
        /// Minimum number of bytes needed.
        expected: usize,
        /// Number of bytes received.
        actual: usize,
    },

    /// A value was present but could not be interpreted.
    #[error("Invalid value: {0}")]
    InvalidValue(String),
}

/// Result type alias using linak-types' ParseError type.
pub type ParseResult<T> = std::result::Result<T, ParseError>;
