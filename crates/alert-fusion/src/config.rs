//! Fusion configuration

use crate::advisory::AdvisoryStyle;
use ranging::ThresholdTable;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Fusion loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    /// Distance buckets
    pub thresholds: ThresholdTable,

    /// Minimum time between range samples (ms)
    pub sampling_interval_ms: u64,

    /// Minimum time between spoken obstacle advisories (ms)
    pub audio_alert_interval_ms: u64,

    /// Minimum time between accepted toggle presses (ms)
    pub toggle_debounce_ms: u64,

    /// Delay before re-reading the identify button to confirm a press (ms)
    pub identify_confirm_ms: u64,

    /// Poll period while waiting for the identify button release (ms)
    pub release_poll_ms: u64,

    /// Upper bound on the release wait (ms)
    pub release_timeout_ms: u64,

    /// LED blinks when identification starts
    pub blink_count: u32,

    /// LED on/off half-period of the blink (ms)
    pub blink_half_period_ms: u64,

    /// Light the LED for far obstacles too
    pub led_on_far: bool,

    /// Wording of obstacle advisories
    pub advisory_style: AdvisoryStyle,

    /// Speak "enabled"/"disabled" on toggle
    pub announce_mode_changes: bool,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            thresholds: ThresholdTable::long_range(),
            sampling_interval_ms: 200,
            audio_alert_interval_ms: 5000,
            toggle_debounce_ms: 500,
            identify_confirm_ms: 300,
            release_poll_ms: 100,
            release_timeout_ms: 10_000,
            blink_count: 3,
            blink_half_period_ms: 100,
            led_on_far: false,
            advisory_style: AdvisoryStyle::Positional,
            announce_mode_changes: true,
        }
    }
}

impl FusionConfig {
    /// Short-range cane profile: half-meter alerts, distance wording, LED for every alert
    pub fn short_range() -> Self {
        Self {
            thresholds: ThresholdTable::short_range(),
            led_on_far: true,
            advisory_style: AdvisoryStyle::Distance,
            ..Default::default()
        }
    }

    pub fn sampling_interval(&self) -> Duration {
        Duration::from_millis(self.sampling_interval_ms)
    }

    pub fn audio_alert_interval(&self) -> Duration {
        Duration::from_millis(self.audio_alert_interval_ms)
    }

    pub fn toggle_debounce(&self) -> Duration {
        Duration::from_millis(self.toggle_debounce_ms)
    }

    pub fn identify_confirm(&self) -> Duration {
        Duration::from_millis(self.identify_confirm_ms)
    }

    pub fn release_poll(&self) -> Duration {
        Duration::from_millis(self.release_poll_ms)
    }

    pub fn release_timeout(&self) -> Duration {
        Duration::from_millis(self.release_timeout_ms)
    }

    pub fn blink_half_period(&self) -> Duration {
        Duration::from_millis(self.blink_half_period_ms)
    }
}
