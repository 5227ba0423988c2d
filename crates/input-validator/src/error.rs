//! Validation Error Types

use thiserror::Error;

/// Errors during request validation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Value out of allowed range
    #[error("{field} value {value} is out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    /// Time window is empty or inverted
    #[error("Invalid time window: start {start}s, end {end}s")]
    InvalidWindow { start: f64, end: f64 },

    /// Invalid identifier format
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// Missing required field
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
}
