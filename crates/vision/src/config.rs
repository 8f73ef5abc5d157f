//! Vision configuration

use serde::{Deserialize, Serialize};

/// How an equal, nonzero left/right count is resolved when front is lower
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SideTieBreak {
    /// Report the obstacle as ahead (both motors)
    #[default]
    Front,
    /// Favor the left side
    Left,
    /// Favor the right side
    Right,
}

/// Vision configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionConfig {
    /// Confidence threshold for continuous avoidance passes
    pub avoidance_confidence: f32,

    /// Confidence threshold for one-shot identification passes
    pub identification_confidence: f32,

    /// Left/right tie resolution
    pub side_tie_break: SideTieBreak,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            avoidance_confidence: 0.25,
            identification_confidence: 0.3,
            side_tie_break: SideTieBreak::Front,
        }
    }
}
