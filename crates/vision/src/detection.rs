//! Detections and zone resolution

use crate::config::SideTieBreak;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Horizontal third of the field of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Position {
    Left,
    Front,
    Right,
}

impl Position {
    /// Zone of a horizontal pixel coordinate in a frame of `frame_width` pixels
    pub fn from_center_x(center_x: u32, frame_width: u32) -> Self {
        let center_x = u64::from(center_x);
        let left_boundary = u64::from(frame_width) / 3;
        let right_boundary = 2 * u64::from(frame_width) / 3;

        if center_x < left_boundary {
            Position::Left
        } else if center_x > right_boundary {
            Position::Right
        } else {
            Position::Front
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Position::Left => "left",
            Position::Front => "front",
            Position::Right => "right",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One classified object in a frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Zone of the bounding-box center
    pub position: Position,

    /// Class label (e.g. "person", "chair")
    pub label: String,

    /// Detection confidence in [0, 1]
    pub confidence: f32,
}

impl Detection {
    pub fn new(position: Position, label: impl Into<String>, confidence: f32) -> Self {
        Self {
            position,
            label: label.into(),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    /// Build a detection from a bounding box's horizontal extent
    pub fn from_bbox(
        label: impl Into<String>,
        confidence: f32,
        x1: u32,
        x2: u32,
        frame_width: u32,
    ) -> Self {
        let center_x = ((u64::from(x1) + u64::from(x2)) / 2) as u32;
        Self::new(Position::from_center_x(center_x, frame_width), label, confidence)
    }
}

/// Detection counts per zone
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PositionCounts {
    pub left: usize,
    pub front: usize,
    pub right: usize,
}

impl PositionCounts {
    /// Resolve the dominant zone.
    ///
    /// Front wins whenever it is at least as frequent as either side;
    /// otherwise the strictly larger side wins and an exact side tie goes
    /// through `tie_break`.
    pub fn primary(&self, tie_break: SideTieBreak) -> Position {
        if self.front >= self.left && self.front >= self.right {
            Position::Front
        } else if self.left > self.right {
            Position::Left
        } else if self.right > self.left {
            Position::Right
        } else {
            match tie_break {
                SideTieBreak::Front => Position::Front,
                SideTieBreak::Left => Position::Left,
                SideTieBreak::Right => Position::Right,
            }
        }
    }
}

/// Ordered detections for one frame; empty means nothing was seen
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionSet {
    detections: Vec<Detection>,
}

impl DetectionSet {
    pub fn new(detections: Vec<Detection>) -> Self {
        Self { detections }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }

    pub fn len(&self) -> usize {
        self.detections.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Detection> {
        self.detections.iter()
    }

    /// Keep only detections at or above `threshold`
    pub fn above(&self, threshold: f32) -> DetectionSet {
        Self::new(
            self.detections
                .iter()
                .filter(|d| d.confidence >= threshold)
                .cloned()
                .collect(),
        )
    }

    /// Count detections per zone
    pub fn counts(&self) -> PositionCounts {
        self.detections
            .iter()
            .fold(PositionCounts::default(), |mut counts, d| {
                match d.position {
                    Position::Left => counts.left += 1,
                    Position::Front => counts.front += 1,
                    Position::Right => counts.right += 1,
                }
                counts
            })
    }

    /// Dominant zone; an empty set defaults to front
    pub fn primary_position(&self, tie_break: SideTieBreak) -> Position {
        if self.is_empty() {
            return Position::Front;
        }
        self.counts().primary(tie_break)
    }

    /// One detection per label, keeping the most confident instance.
    /// Labels stay in first-seen order.
    pub fn dedup_by_label(&self) -> Vec<Detection> {
        let mut unique: Vec<Detection> = Vec::new();
        for detection in &self.detections {
            match unique.iter_mut().find(|u| u.label == detection.label) {
                Some(existing) => {
                    if detection.confidence > existing.confidence {
                        *existing = detection.clone();
                    }
                }
                None => unique.push(detection.clone()),
            }
        }
        unique
    }
}

impl From<Vec<Detection>> for DetectionSet {
    fn from(detections: Vec<Detection>) -> Self {
        Self::new(detections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn set(left: usize, front: usize, right: usize) -> DetectionSet {
        let mut detections = Vec::new();
        detections.extend((0..left).map(|_| Detection::new(Position::Left, "chair", 0.8)));
        detections.extend((0..front).map(|_| Detection::new(Position::Front, "person", 0.8)));
        detections.extend((0..right).map(|_| Detection::new(Position::Right, "door", 0.8)));
        DetectionSet::new(detections)
    }

    #[test]
    fn test_zone_split() {
        assert_eq!(Position::from_center_x(100, 640), Position::Left);
        assert_eq!(Position::from_center_x(213, 640), Position::Front);
        assert_eq!(Position::from_center_x(320, 640), Position::Front);
        assert_eq!(Position::from_center_x(426, 640), Position::Front);
        assert_eq!(Position::from_center_x(427, 640), Position::Right);
    }

    #[test]
    fn test_from_bbox() {
        let d = Detection::from_bbox("person", 0.9, 500, 600, 640);
        assert_eq!(d.position, Position::Right);
        assert_eq!(d.label, "person");
    }

    #[test]
    fn test_from_bbox_extreme_coordinates() {
        let d = Detection::from_bbox("x", 0.5, u32::MAX - 1, u32::MAX - 1, 640);
        assert_eq!(d.position, Position::Right);

        let wide = Detection::from_bbox("x", 0.5, u32::MAX - 2, u32::MAX, u32::MAX);
        assert_eq!(wide.position, Position::Right);
        assert_eq!(Position::from_center_x(u32::MAX / 2, u32::MAX), Position::Front);
    }

    #[test]
    fn test_primary_position_rules() {
        let tie = SideTieBreak::Front;
        assert_eq!(set(2, 1, 0).primary_position(tie), Position::Left);
        assert_eq!(set(1, 1, 0).primary_position(tie), Position::Front);
        assert_eq!(set(0, 0, 3).primary_position(tie), Position::Right);
        assert_eq!(DetectionSet::empty().primary_position(tie), Position::Front);
    }

    #[test]
    fn test_side_tie_break() {
        let tied = set(1, 0, 1);
        assert_eq!(tied.primary_position(SideTieBreak::Front), Position::Front);
        assert_eq!(tied.primary_position(SideTieBreak::Left), Position::Left);
        assert_eq!(tied.primary_position(SideTieBreak::Right), Position::Right);
    }

    #[test]
    fn test_dedup_keeps_highest_confidence() {
        let detections = DetectionSet::new(vec![
            Detection::new(Position::Left, "person", 0.4),
            Detection::new(Position::Front, "chair", 0.6),
            Detection::new(Position::Right, "person", 0.9),
        ]);

        let unique = detections.dedup_by_label();
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].label, "person");
        assert_eq!(unique[0].confidence, 0.9);
        assert_eq!(unique[0].position, Position::Right);
        assert_eq!(unique[1].label, "chair");
    }

    #[test]
    fn test_above_threshold() {
        let detections = DetectionSet::new(vec![
            Detection::new(Position::Left, "cup", 0.2),
            Detection::new(Position::Front, "chair", 0.3),
        ]);
        assert_eq!(detections.above(0.25).len(), 1);
        assert_eq!(detections.above(0.3).len(), 1);
        assert!(detections.above(0.5).is_empty());
    }

    proptest! {
        #[test]
        fn front_wins_when_not_outnumbered(left in 0usize..5, front in 0usize..5, right in 0usize..5) {
            let primary = set(left, front, right).primary_position(SideTieBreak::Left);
            if front >= left && front >= right {
                prop_assert_eq!(primary, Position::Front);
            } else {
                prop_assert_ne!(primary, Position::Front);
            }
        }
    }
}
