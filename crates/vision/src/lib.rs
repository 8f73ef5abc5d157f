//! Vision Reports
//!
//! Object detections from the camera, reduced to what the alert loop needs:
//! - Horizontal zone (left, front, right third of the frame)
//! - Class label and confidence
//! - Primary-position resolution and per-label deduplication

pub mod config;
pub mod detection;

pub use config::{SideTieBreak, VisionConfig};
pub use detection::{Detection, DetectionSet, Position, PositionCounts};

use thiserror::Error;

/// Vision error types
#[derive(Error, Debug)]
pub enum VisionError {
    #[error("Frame capture failed: {0}")]
    Capture(String),
}

/// Source of classified detections for the current frame
pub trait VisionSource: Send {
    /// Run one detection pass, keeping detections at or above `confidence_threshold`
    fn classify(&mut self, confidence_threshold: f32) -> Result<DetectionSet, VisionError>;
}
