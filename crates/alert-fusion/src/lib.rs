//! Alert Fusion
//!
//! The control-loop core. Each tick it:
//! - Samples the range sensor at its own cadence
//! - Buckets the distance into a tier and, for alerting tiers, resolves the
//!   obstacle position from the latest vision report
//! - Drives the LED and vibration motors
//! - Rate-limits spoken advisories through the speech queue
//!
//! A debounced mode controller switches between continuous monitoring and
//! one-shot object identification.

pub mod actuation;
pub mod advisory;
pub mod config;
pub mod engine;
pub mod limiter;
pub mod mode;

pub use actuation::{ActuationPattern, Actuator};
pub use advisory::AdvisoryStyle;
pub use config::FusionConfig;
pub use engine::{AlertFusionEngine, Peripherals, TickOutcome};
pub use limiter::SpeechRateLimiter;
pub use mode::{ButtonInput, Mode, ModeController};

pub use speech::AdvisoryMessage;

use ranging::RangeError;
use thiserror::Error;

/// Fusion error types
#[derive(Error, Debug)]
pub enum FusionError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] RangeError),

    #[error("Invalid vision threshold: {0}")]
    VisionThreshold(f32),
}
