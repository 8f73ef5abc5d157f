//! Range Readings and Echo Conversion

use crate::error::RangeError;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::debug;

/// Half the speed of sound in air (cm/s); the echo travels out and back
pub const HALF_SPEED_OF_SOUND_CM_PER_S: f64 = 17_150.0;

/// Distance reported for timeouts and rejected readings.
/// Always beyond any monitored range so it classifies as safe.
pub const TIMEOUT_SENTINEL_CM: f64 = 999.0;

/// Upper end of the HC-SR04 usable window
pub const DEFAULT_MAX_VALID_CM: f64 = 400.0;

/// Convert an echo pulse width into centimeters, rounded to 0.01 cm
pub fn distance_from_echo(pulse: Duration) -> f64 {
    let cm = pulse.as_secs_f64() * HALF_SPEED_OF_SOUND_CM_PER_S;
    (cm * 100.0).round() / 100.0
}

/// Usable distance window of the sensor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EchoWindow {
    /// Minimum accepted distance (cm)
    pub min_cm: f64,
    /// Maximum accepted distance (cm)
    pub max_cm: f64,
}

impl Default for EchoWindow {
    fn default() -> Self {
        Self {
            min_cm: 0.0,
            max_cm: DEFAULT_MAX_VALID_CM,
        }
    }
}

impl EchoWindow {
    /// Check a distance against the window
    pub fn check(&self, distance_cm: f64) -> Result<f64, RangeError> {
        if distance_cm.is_nan() || distance_cm < self.min_cm || distance_cm > self.max_cm {
            Err(RangeError::OutOfRange {
                value: distance_cm,
                min: self.min_cm,
                max: self.max_cm,
            })
        } else {
            Ok(distance_cm)
        }
    }
}

/// One distance sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeReading {
    /// Distance in centimeters (sentinel when invalid)
    pub distance_cm: f64,
    /// Whether the sensor produced a usable echo
    pub valid: bool,
    /// When the sample was taken
    pub at: Instant,
}

impl RangeReading {
    /// A usable reading
    pub fn valid(distance_cm: f64, at: Instant) -> Self {
        Self {
            distance_cm,
            valid: true,
            at,
        }
    }

    /// A timed-out or rejected reading
    pub fn timeout(at: Instant) -> Self {
        Self {
            distance_cm: TIMEOUT_SENTINEL_CM,
            valid: false,
            at,
        }
    }

    /// Build a reading from a measured echo pulse.
    ///
    /// `None` means no echo before the driver's timeout.
    pub fn from_echo(pulse: Option<Duration>, window: &EchoWindow, at: Instant) -> Self {
        let checked = pulse
            .ok_or(RangeError::Timeout)
            .map(distance_from_echo)
            .and_then(|cm| window.check(cm));

        match checked {
            Ok(cm) => Self::valid(cm, at),
            Err(e) => {
                debug!("Discarding range sample: {}", e);
                Self::timeout(at)
            }
        }
    }

    /// Distance to use for classification
    pub fn effective_distance(&self) -> f64 {
        if self.valid {
            self.distance_cm
        } else {
            TIMEOUT_SENTINEL_CM
        }
    }
}
