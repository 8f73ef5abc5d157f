//! Obstacle Tiers

use crate::error::RangeError;
use crate::reading::{RangeReading, TIMEOUT_SENTINEL_CM};
use serde::{Deserialize, Serialize};

/// Obstacle severity bucket, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tier {
    Safe,
    Far,
    Close,
    VeryClose,
}

impl Tier {
    /// Spoken phrase for an alerting tier
    pub fn phrase(&self) -> Option<&'static str> {
        match self {
            Tier::Safe => None,
            Tier::Far => Some("Far"),
            Tier::Close => Some("Close"),
            Tier::VeryClose => Some("Very close"),
        }
    }

    /// Whether this tier raises an alert
    pub fn is_alert(&self) -> bool {
        *self != Tier::Safe
    }
}

/// Upper bounds (inclusive, cm) of each alerting tier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdTable {
    pub very_close_cm: f64,
    pub close_cm: f64,
    pub far_cm: f64,
}

impl Default for ThresholdTable {
    fn default() -> Self {
        Self::long_range()
    }
}

impl ThresholdTable {
    /// Create a validated table
    pub fn new(very_close_cm: f64, close_cm: f64, far_cm: f64) -> Result<Self, RangeError> {
        let table = Self {
            very_close_cm,
            close_cm,
            far_cm,
        };
        table.validate()?;
        Ok(table)
    }

    /// Handheld cane profile (alerts within half a meter)
    pub fn short_range() -> Self {
        Self {
            very_close_cm: 10.0,
            close_cm: 30.0,
            far_cm: 50.0,
        }
    }

    /// Camera-assisted profile (alerts within three meters)
    pub fn long_range() -> Self {
        Self {
            very_close_cm: 100.0,
            close_cm: 200.0,
            far_cm: 300.0,
        }
    }

    /// Bounds must be positive, strictly increasing and below the timeout sentinel
    pub fn validate(&self) -> Result<(), RangeError> {
        let bounds = [self.very_close_cm, self.close_cm, self.far_cm];
        if bounds.iter().any(|b| !b.is_finite() || *b <= 0.0) {
            return Err(RangeError::InvalidThresholds(format!(
                "bounds must be positive and finite: {:?}",
                bounds
            )));
        }
        if !(self.very_close_cm < self.close_cm && self.close_cm < self.far_cm) {
            return Err(RangeError::InvalidThresholds(format!(
                "bounds must be strictly increasing: {:?}",
                bounds
            )));
        }
        if self.far_cm >= TIMEOUT_SENTINEL_CM {
            return Err(RangeError::InvalidThresholds(format!(
                "far bound {} must stay below the timeout sentinel {}",
                self.far_cm, TIMEOUT_SENTINEL_CM
            )));
        }
        Ok(())
    }

    /// Map a distance to its tier. NaN is treated as no obstacle.
    pub fn classify(&self, distance_cm: f64) -> Tier {
        if distance_cm.is_nan() {
            Tier::Safe
        } else if distance_cm <= self.very_close_cm {
            Tier::VeryClose
        } else if distance_cm <= self.close_cm {
            Tier::Close
        } else if distance_cm <= self.far_cm {
            Tier::Far
        } else {
            Tier::Safe
        }
    }

    /// Classify a reading. Invalid readings sit at the timeout sentinel,
    /// beyond every validated bound.
    pub fn classify_reading(&self, reading: &RangeReading) -> Tier {
        self.classify(reading.effective_distance())
    }
}
