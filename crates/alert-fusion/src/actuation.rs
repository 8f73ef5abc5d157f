//! Actuation patterns

use ranging::Tier;
use serde::{Deserialize, Serialize};
use vision::Position;

/// Logical state of the LED and the two vibration motors
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActuationPattern {
    pub led: bool,
    pub left_motor: bool,
    pub right_motor: bool,
}

impl ActuationPattern {
    /// Everything off
    pub const OFF: Self = Self {
        led: false,
        left_motor: false,
        right_motor: false,
    };

    /// LED only, used for the identification blink
    pub const LED_ONLY: Self = Self {
        led: true,
        left_motor: false,
        right_motor: false,
    };

    /// Pattern for an obstacle of `tier` at `position`.
    ///
    /// Motors follow the side (both for front); the LED is lit for close
    /// and very close obstacles, and for far ones only when `led_on_far`.
    pub fn for_alert(tier: Tier, position: Position, led_on_far: bool) -> Self {
        let led = match tier {
            Tier::Safe => return Self::OFF,
            Tier::Far => led_on_far,
            Tier::Close | Tier::VeryClose => true,
        };

        let (left_motor, right_motor) = match position {
            Position::Left => (true, false),
            Position::Right => (false, true),
            Position::Front => (true, true),
        };

        Self {
            led,
            left_motor,
            right_motor,
        }
    }

    pub fn is_off(&self) -> bool {
        *self == Self::OFF
    }
}

/// Writes patterns to the physical output lines.
///
/// Only the control loop calls this, so implementations need no locking.
pub trait Actuator: Send {
    fn apply(&mut self, pattern: ActuationPattern);
}
