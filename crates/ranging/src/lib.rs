//! Range Sensing
//!
//! Distance readings from the ultrasonic sensor and the tier buckets the
//! fusion loop derives from them:
//! - Echo-time to centimeter conversion
//! - Timeout and out-of-window readings mapped to a sentinel distance
//! - Configurable, monotonic threshold tables

mod error;
mod reading;
mod tier;

pub use error::RangeError;
pub use reading::{
    distance_from_echo, EchoWindow, RangeReading, DEFAULT_MAX_VALID_CM, HALF_SPEED_OF_SOUND_CM_PER_S,
    TIMEOUT_SENTINEL_CM,
};
pub use tier::{ThresholdTable, Tier};

/// Source of distance readings.
///
/// Implementations must return within a bounded time even when the sensor
/// stays silent, reporting `valid = false` instead of blocking.
pub trait RangeSource: Send {
    /// Take one reading
    fn read(&mut self) -> RangeReading;
}
