//! Error types for data parsing in roomenv-types.

use thiserror::Error;

/// Errors that can occur when decoding probe payloads or query parameters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// Granularity name is not one of minute, hour, day, month, year.
    #[error("unknown time grouping {0:?}; expected one of [minute, hour, day, month, year]")]
    UnknownGranularity(String),

    /// Payload is not a valid probe measure.
    #[cfg(feature = "serde")]
    #[error("Invalid payload: {0}")]
    InvalidPayload(#[source] serde_json::Error),
}

/// Result type alias using roomenv-types' ParseError type.
pub type ParseResult<T> = std::result::Result<T, ParseError>;
