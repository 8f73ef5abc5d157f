//! Simulated peripherals
//!
//! Stand-ins for the ultrasonic sensor, camera, buttons and vibration
//! motors so the control loop can run on a development host.

use crate::config::SimulationConfig;
use alert_fusion::{ActuationPattern, Actuator, ButtonInput, Peripherals};
use ranging::{EchoWindow, RangeReading, RangeSource, HALF_SPEED_OF_SOUND_CM_PER_S};
use std::time::{Duration, Instant};
use tracing::info;
use vision::{Detection, DetectionSet, VisionError, VisionSource};

/// Range source sweeping back and forth between two distances
#[derive(Debug, Clone)]
pub struct SweepRangeSource {
    window: EchoWindow,
    min_cm: f64,
    max_cm: f64,
    step_cm: f64,
    current_cm: f64,
    approaching: bool,
}

impl SweepRangeSource {
    pub fn new(min_cm: f64, max_cm: f64, step_cm: f64) -> Self {
        let (min_cm, max_cm) = if min_cm <= max_cm {
            (min_cm, max_cm)
        } else {
            (max_cm, min_cm)
        };
        Self {
            window: EchoWindow::default(),
            min_cm,
            max_cm,
            step_cm: step_cm.abs(),
            current_cm: max_cm,
            approaching: true,
        }
    }

    fn advance(&mut self) {
        if self.approaching {
            self.current_cm -= self.step_cm;
            if self.current_cm <= self.min_cm {
                self.current_cm = self.min_cm;
                self.approaching = false;
            }
        } else {
            self.current_cm += self.step_cm;
            if self.current_cm >= self.max_cm {
                self.current_cm = self.max_cm;
                self.approaching = true;
            }
        }
    }
}

impl RangeSource for SweepRangeSource {
    fn read(&mut self) -> RangeReading {
        let pulse = Duration::from_secs_f64(self.current_cm.max(0.0) / HALF_SPEED_OF_SOUND_CM_PER_S);
        let reading = RangeReading::from_echo(Some(pulse), &self.window, Instant::now());
        self.advance();
        reading
    }
}

/// Camera that reports the same objects on every frame
#[derive(Debug, Clone, Default)]
pub struct FixedVisionSource {
    detections: Vec<Detection>,
}

impl FixedVisionSource {
    pub fn new(detections: Vec<Detection>) -> Self {
        Self { detections }
    }
}

impl VisionSource for FixedVisionSource {
    fn classify(&mut self, confidence_threshold: f32) -> Result<DetectionSet, VisionError> {
        Ok(DetectionSet::new(self.detections.clone()).above(confidence_threshold))
    }
}

/// Button that is never pressed
#[derive(Debug, Clone, Copy, Default)]
pub struct IdleButton;

impl ButtonInput for IdleButton {
    fn is_asserted(&mut self) -> bool {
        false
    }
}

/// Actuator that logs pattern changes instead of driving pins
#[derive(Debug, Default)]
pub struct LoggingActuator {
    current: ActuationPattern,
}

impl LoggingActuator {
    pub fn current(&self) -> ActuationPattern {
        self.current
    }
}

impl Actuator for LoggingActuator {
    fn apply(&mut self, pattern: ActuationPattern) {
        if pattern != self.current {
            info!(
                "LED={} LEFT={} RIGHT={}",
                on_off(pattern.led),
                on_off(pattern.left_motor),
                on_off(pattern.right_motor)
            );
            self.current = pattern;
        }
    }
}

fn on_off(state: bool) -> &'static str {
    if state {
        "ON"
    } else {
        "OFF"
    }
}

/// Assemble a full simulated peripheral set
pub fn peripherals(config: &SimulationConfig) -> Peripherals {
    Peripherals {
        range: Box::new(SweepRangeSource::new(
            config.min_cm,
            config.max_cm,
            config.step_cm,
        )),
        vision: Box::new(FixedVisionSource::new(config.detections.clone())),
        actuator: Box::new(LoggingActuator::default()),
        toggle_button: Some(Box::new(IdleButton)),
        identify_button: Some(Box::new(IdleButton)),
    }
}
