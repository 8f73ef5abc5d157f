//! Range Error Types

use thiserror::Error;

/// Errors raised while validating readings or threshold tables
#[derive(Debug, Clone, Error)]
pub enum RangeError {
    /// Distance outside the sensor's usable window
    #[error("distance {value} cm is out of range [{min}, {max}]")]
    OutOfRange { value: f64, min: f64, max: f64 },

    /// No echo arrived before the timeout
    #[error("echo timed out")]
    Timeout,

    /// Threshold table is not strictly increasing or not positive
    #[error("invalid threshold table: {0}")]
    InvalidThresholds(String),
}
