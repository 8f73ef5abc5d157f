//! Advisory wording

use ranging::Tier;
use serde::{Deserialize, Serialize};
use vision::Position;

/// How obstacle advisories are phrased
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvisoryStyle {
    /// "Close obstacle at left"
    #[default]
    Positional,
    /// "Close obstacle detected at 25 centimeters"
    Distance,
}

impl AdvisoryStyle {
    /// Compose the advisory for an alerting tier; `None` when safe
    pub fn compose(&self, tier: Tier, position: Position, distance_cm: f64) -> Option<String> {
        let phrase = tier.phrase()?;
        let text = match self {
            AdvisoryStyle::Positional => format!("{} obstacle at {}", phrase, position),
            AdvisoryStyle::Distance => {
                let cm = distance_cm.max(0.0) as u32;
                match tier {
                    Tier::VeryClose => format!("Warning! Very close obstacle at {} centimeters", cm),
                    Tier::Close => format!("Close obstacle detected at {} centimeters", cm),
                    _ => format!("Obstacle ahead at {} centimeters", cm),
                }
            }
        };
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positional_wording() {
        let style = AdvisoryStyle::Positional;
        assert_eq!(
            style.compose(Tier::VeryClose, Position::Front, 5.0).as_deref(),
            Some("Very close obstacle at front")
        );
        assert_eq!(
            style.compose(Tier::Far, Position::Left, 250.0).as_deref(),
            Some("Far obstacle at left")
        );
        assert_eq!(style.compose(Tier::Safe, Position::Front, 500.0), None);
    }

    #[test]
    fn test_distance_wording() {
        let style = AdvisoryStyle::Distance;
        assert_eq!(
            style.compose(Tier::VeryClose, Position::Front, 5.7).as_deref(),
            Some("Warning! Very close obstacle at 5 centimeters")
        );
        assert_eq!(
            style.compose(Tier::Close, Position::Right, 25.0).as_deref(),
            Some("Close obstacle detected at 25 centimeters")
        );
        assert_eq!(
            style.compose(Tier::Far, Position::Left, 42.0).as_deref(),
            Some("Obstacle ahead at 42 centimeters")
        );
    }
}
