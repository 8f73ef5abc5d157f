//! Alert Fusion Engine

use crate::actuation::{ActuationPattern, Actuator};
use crate::config::FusionConfig;
use crate::limiter::SpeechRateLimiter;
use crate::mode::{ButtonInput, Mode, ModeController};
use crate::FusionError;
use ranging::{RangeReading, RangeSource, Tier};
use speech::{AdvisoryMessage, SpeechDispatcher};
use std::thread;
use std::time::Instant;
use tracing::{debug, info, warn};
use vision::{DetectionSet, Position, VisionConfig, VisionSource};

/// Hardware collaborators owned by the engine
pub struct Peripherals {
    pub range: Box<dyn RangeSource>,
    pub vision: Box<dyn VisionSource>,
    pub actuator: Box<dyn Actuator>,
    /// Enables/disables monitoring; absent in single-button builds
    pub toggle_button: Option<Box<dyn ButtonInput>>,
    /// Triggers one-shot identification
    pub identify_button: Option<Box<dyn ButtonInput>>,
}

/// Result of one control-loop iteration
#[derive(Debug, Clone, PartialEq)]
pub struct TickOutcome {
    /// Pattern written to the actuator this tick
    pub pattern: ActuationPattern,
    /// Advisory handed to the speech queue, if the rate limiter allowed one
    pub advisory: Option<AdvisoryMessage>,
    /// Tier, when detection logic ran
    pub tier: Option<Tier>,
    /// Resolved position, for alerting tiers
    pub position: Option<Position>,
}

impl TickOutcome {
    fn idle(tier: Option<Tier>) -> Self {
        Self {
            pattern: ActuationPattern::OFF,
            advisory: None,
            tier,
            position: None,
        }
    }
}

/// Fuses range and vision into actuation and speech, once per tick
pub struct AlertFusionEngine {
    config: FusionConfig,
    vision_config: VisionConfig,
    peripherals: Peripherals,
    speech: SpeechDispatcher,
    mode: ModeController,
    limiter: SpeechRateLimiter,
    last_sample_at: Option<Instant>,
    last_reading: Option<RangeReading>,
}

impl AlertFusionEngine {
    /// Create an engine; fails on an invalid threshold table or vision thresholds
    pub fn new(
        config: FusionConfig,
        vision_config: VisionConfig,
        peripherals: Peripherals,
        speech: SpeechDispatcher,
    ) -> Result<Self, FusionError> {
        config.thresholds.validate()?;
        for threshold in [
            vision_config.avoidance_confidence,
            vision_config.identification_confidence,
        ] {
            if !(0.0..=1.0).contains(&threshold) {
                return Err(FusionError::VisionThreshold(threshold));
            }
        }

        info!(
            "Creating fusion engine: thresholds={:?}, style={:?}",
            config.thresholds, config.advisory_style
        );

        Ok(Self {
            mode: ModeController::new(config.toggle_debounce()),
            limiter: SpeechRateLimiter::new(config.audio_alert_interval()),
            config,
            vision_config,
            peripherals,
            speech,
            last_sample_at: None,
            last_reading: None,
        })
    }

    pub fn mode(&self) -> Mode {
        self.mode.mode()
    }

    /// Most recent range reading, for display
    pub fn last_reading(&self) -> Option<&RangeReading> {
        self.last_reading.as_ref()
    }

    /// Run one control-loop iteration and apply the resulting pattern
    pub fn tick(&mut self, now: Instant) -> TickOutcome {
        self.poll_toggle(now);

        if self.poll_identify() {
            self.run_identification();
        }

        let outcome = match self.mode.mode() {
            Mode::Identifying | Mode::Monitoring { enabled: false } => TickOutcome::idle(None),
            Mode::Monitoring { enabled: true } => self.fuse(now),
        };

        self.peripherals.actuator.apply(outcome.pattern);
        outcome
    }

    /// Switch every output off
    pub fn all_off(&mut self) {
        self.peripherals.actuator.apply(ActuationPattern::OFF);
    }

    fn fuse(&mut self, now: Instant) -> TickOutcome {
        let reading = self.sample_range(now);
        let tier = self.config.thresholds.classify_reading(&reading);

        if !tier.is_alert() {
            debug!(
                "Distance: {:.1} cm - Safe{}",
                reading.distance_cm,
                if reading.valid { "" } else { " (no echo)" }
            );
            return TickOutcome::idle(Some(tier));
        }

        let detections = self.detect(self.vision_config.avoidance_confidence);
        let position = detections.primary_position(self.vision_config.side_tie_break);
        let pattern = ActuationPattern::for_alert(tier, position, self.config.led_on_far);

        debug!(
            "Distance: {:.1} cm - {:?} at {} ({} detections)",
            reading.distance_cm,
            tier,
            position,
            detections.len()
        );

        let advisory = if self.limiter.should_speak(now) {
            self.config
                .advisory_style
                .compose(tier, position, reading.distance_cm)
                .map(|text| {
                    let message = AdvisoryMessage::new(text, now);
                    self.speech.enqueue_message(message.clone());
                    self.limiter.record(now);
                    message
                })
        } else {
            None
        };

        TickOutcome {
            pattern,
            advisory,
            tier: Some(tier),
            position: Some(position),
        }
    }

    fn sample_range(&mut self, now: Instant) -> RangeReading {
        if let (Some(at), Some(reading)) = (self.last_sample_at, self.last_reading) {
            if now.saturating_duration_since(at) < self.config.sampling_interval() {
                return reading;
            }
        }

        let reading = self.peripherals.range.read();
        self.last_sample_at = Some(now);
        self.last_reading = Some(reading);
        reading
    }

    fn detect(&mut self, threshold: f32) -> DetectionSet {
        match self.peripherals.vision.classify(threshold) {
            Ok(detections) => detections.above(threshold),
            Err(e) => {
                warn!("Vision unavailable, assuming obstacle ahead: {}", e);
                DetectionSet::empty()
            }
        }
    }

    fn announce(&self, text: impl Into<String>) {
        self.speech.enqueue(text);
    }

    fn poll_toggle(&mut self, now: Instant) {
        let asserted = match self.peripherals.toggle_button.as_mut() {
            Some(button) => button.is_asserted(),
            None => return,
        };

        match self.mode.on_toggle(asserted, now) {
            Some(true) => {
                if self.config.announce_mode_changes {
                    self.announce("Obstacle detection enabled");
                }
            }
            Some(false) => {
                self.all_off();
                self.limiter.reset();
                if self.config.announce_mode_changes {
                    self.announce("Obstacle detection disabled");
                }
            }
            None => {}
        }
    }

    /// Detect a confirmed rising edge on the identify button
    fn poll_identify(&mut self) -> bool {
        let Some(button) = self.peripherals.identify_button.as_mut() else {
            return false;
        };

        if !self.mode.on_identify_sample(button.is_asserted()) {
            return false;
        }

        thread::sleep(self.config.identify_confirm());
        let confirmed = button.is_asserted();
        self.mode.set_identify_level(confirmed);

        if !confirmed {
            debug!("Identify press discarded as noise");
        }
        confirmed
    }

    /// One-shot identification, run inline on the control loop
    fn run_identification(&mut self) {
        info!("Identification requested, suspending obstacle alerts");
        self.mode.begin_identification();
        self.all_off();

        self.announce("Object detection mode");
        self.blink();

        let unique = self
            .detect(self.vision_config.identification_confidence)
            .dedup_by_label();

        if unique.is_empty() {
            info!("No objects detected in frame");
            self.announce("No objects detected");
        } else {
            for detection in &unique {
                info!(
                    "Object detected: {} at {} (confidence: {:.2})",
                    detection.label, detection.position, detection.confidence
                );
                self.announce(format!("Detected {}", detection.label));
            }
            if unique.len() > 1 {
                self.announce(format!("Total {} objects detected", unique.len()));
            }
        }

        self.announce("Returning to obstacle detection");
        self.mode.finish_identification();
        info!("Identification complete, mode {:?}", self.mode.mode());

        self.wait_for_identify_release();
    }

    fn blink(&mut self) {
        let half_period = self.config.blink_half_period();
        for _ in 0..self.config.blink_count {
            self.peripherals.actuator.apply(ActuationPattern::LED_ONLY);
            thread::sleep(half_period);
            self.peripherals.actuator.apply(ActuationPattern::OFF);
            thread::sleep(half_period);
        }
    }

    /// Block until the identify button is released, bounded by the release timeout
    fn wait_for_identify_release(&mut self) {
        let Some(button) = self.peripherals.identify_button.as_mut() else {
            return;
        };

        let started = Instant::now();
        let mut held = button.is_asserted();
        while held && started.elapsed() < self.config.release_timeout() {
            thread::sleep(self.config.release_poll());
            held = button.is_asserted();
        }

        if held {
            warn!(
                "Identify button still held after {} ms, resuming anyway",
                self.config.release_timeout_ms
            );
        }
        self.mode.set_identify_level(held);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advisory::AdvisoryStyle;
    use ranging::ThresholdTable;
    use speech::{AdvisoryReceiver, TextClarityNormalizer};
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use vision::{Detection, VisionError};

    #[derive(Clone, Default)]
    struct Shared {
        distance: Arc<Mutex<Option<f64>>>,
        range_reads: Arc<Mutex<usize>>,
        detections: Arc<Mutex<Option<DetectionSet>>>,
        vision_thresholds: Arc<Mutex<Vec<f32>>>,
        applied: Arc<Mutex<Vec<ActuationPattern>>>,
    }

    struct FakeRange(Shared);

    impl RangeSource for FakeRange {
        fn read(&mut self) -> RangeReading {
            *self.0.range_reads.lock().unwrap() += 1;
            match *self.0.distance.lock().unwrap() {
                Some(cm) => RangeReading::valid(cm, Instant::now()),
                None => RangeReading::timeout(Instant::now()),
            }
        }
    }

    struct FakeVision(Shared);

    impl VisionSource for FakeVision {
        fn classify(&mut self, threshold: f32) -> Result<DetectionSet, VisionError> {
            self.0.vision_thresholds.lock().unwrap().push(threshold);
            self.0
                .detections
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| VisionError::Capture("camera unplugged".to_string()))
        }
    }

    struct FakeActuator(Shared);

    impl Actuator for FakeActuator {
        fn apply(&mut self, pattern: ActuationPattern) {
            self.0.applied.lock().unwrap().push(pattern);
        }
    }

    /// Button that replays scripted levels, then rests at a held level
    #[derive(Clone, Default)]
    struct ScriptedButton {
        levels: Arc<Mutex<VecDeque<bool>>>,
        resting: Arc<Mutex<bool>>,
    }

    impl ScriptedButton {
        fn press(&self, levels: &[bool]) {
            self.levels.lock().unwrap().extend(levels.iter().copied());
        }

        fn hold(&self, held: bool) {
            *self.resting.lock().unwrap() = held;
        }
    }

    impl ButtonInput for ScriptedButton {
        fn is_asserted(&mut self) -> bool {
            let next = self.levels.lock().unwrap().pop_front();
            next.unwrap_or_else(|| *self.resting.lock().unwrap())
        }
    }

    struct Harness {
        engine: AlertFusionEngine,
        shared: Shared,
        toggle: ScriptedButton,
        identify: ScriptedButton,
        spoken: AdvisoryReceiver,
    }

    fn test_config() -> FusionConfig {
        FusionConfig {
            identify_confirm_ms: 0,
            release_poll_ms: 0,
            release_timeout_ms: 50,
            blink_half_period_ms: 0,
            ..Default::default()
        }
    }

    fn harness(config: FusionConfig, distance: Option<f64>, detections: DetectionSet) -> Harness {
        let shared = Shared::default();
        *shared.distance.lock().unwrap() = distance;
        *shared.detections.lock().unwrap() = Some(detections);

        let toggle = ScriptedButton::default();
        let identify = ScriptedButton::default();
        let (dispatcher, spoken) = SpeechDispatcher::channel(32);

        let peripherals = Peripherals {
            range: Box::new(FakeRange(shared.clone())),
            vision: Box::new(FakeVision(shared.clone())),
            actuator: Box::new(FakeActuator(shared.clone())),
            toggle_button: Some(Box::new(toggle.clone())),
            identify_button: Some(Box::new(identify.clone())),
        };

        let engine =
            AlertFusionEngine::new(config, VisionConfig::default(), peripherals, dispatcher).unwrap();

        Harness {
            engine,
            shared,
            toggle,
            identify,
            spoken,
        }
    }

    fn drain(rx: &mut AdvisoryReceiver) -> Vec<String> {
        let mut texts = Vec::new();
        while let Ok(message) = rx.try_recv() {
            texts.push(message.raw_text);
        }
        texts
    }

    #[test]
    fn test_very_close_with_no_detections_alerts_front() {
        let mut h = harness(test_config(), Some(5.0), DetectionSet::empty());

        let outcome = h.engine.tick(Instant::now());

        assert_eq!(
            outcome.pattern,
            ActuationPattern {
                led: true,
                left_motor: true,
                right_motor: true
            }
        );
        assert_eq!(outcome.tier, Some(Tier::VeryClose));
        assert_eq!(outcome.position, Some(Position::Front));
        assert_eq!(drain(&mut h.spoken), vec!["Very close obstacle at front"]);
    }

    #[test]
    fn test_distance_style_mentions_five() {
        let config = FusionConfig {
            advisory_style: AdvisoryStyle::Distance,
            thresholds: ThresholdTable::short_range(),
            ..test_config()
        };
        let mut h = harness(config, Some(5.0), DetectionSet::empty());

        let outcome = h.engine.tick(Instant::now());
        let advisory = outcome.advisory.expect("advisory");
        let spoken = TextClarityNormalizer::new().normalize(&advisory.raw_text);

        assert!(spoken.contains("five"));
        assert!(outcome.pattern.led && outcome.pattern.left_motor && outcome.pattern.right_motor);
    }

    #[test]
    fn test_short_range_preset_far_obstacle() {
        let mut h = harness(FusionConfig::short_range(), Some(45.0), DetectionSet::empty());

        let outcome = h.engine.tick(Instant::now());

        assert_eq!(outcome.tier, Some(Tier::Far));
        // LED is lit for far obstacles in this profile
        assert_eq!(
            outcome.pattern,
            ActuationPattern {
                led: true,
                left_motor: true,
                right_motor: true
            }
        );
        assert_eq!(drain(&mut h.spoken), vec!["Obstacle ahead at 45 centimeters"]);
    }

    #[test]
    fn test_safe_distance_is_silent() {
        let mut h = harness(test_config(), Some(350.0), DetectionSet::empty());

        let outcome = h.engine.tick(Instant::now());

        assert!(outcome.pattern.is_off());
        assert!(outcome.advisory.is_none());
        assert!(drain(&mut h.spoken).is_empty());
        // Vision is never consulted for a safe tier
        assert!(h.shared.vision_thresholds.lock().unwrap().is_empty());
    }

    #[test]
    fn test_invalid_reading_is_safe() {
        let mut h = harness(test_config(), None, DetectionSet::empty());

        let outcome = h.engine.tick(Instant::now());

        assert!(outcome.pattern.is_off());
        assert_eq!(outcome.tier, Some(Tier::Safe));
    }

    #[test]
    fn test_speech_is_rate_limited_but_actuation_is_not() {
        let mut h = harness(test_config(), Some(150.0), DetectionSet::empty());
        let t0 = Instant::now();

        let first = h.engine.tick(t0);
        let second = h.engine.tick(t0 + Duration::from_secs(2));
        let third = h.engine.tick(t0 + Duration::from_secs(6));

        assert!(first.advisory.is_some());
        assert!(second.advisory.is_none());
        assert!(third.advisory.is_some());
        assert!(!second.pattern.is_off());
        assert_eq!(drain(&mut h.spoken).len(), 2);
    }

    #[test]
    fn test_safe_tick_does_not_touch_rate_limiter() {
        let mut h = harness(test_config(), Some(350.0), DetectionSet::empty());
        let t0 = Instant::now();

        h.engine.tick(t0);
        *h.shared.distance.lock().unwrap() = Some(50.0);
        let alert = h.engine.tick(t0 + Duration::from_secs(1));

        assert!(alert.advisory.is_some());
    }

    #[test]
    fn test_range_sampling_interval() {
        let mut h = harness(test_config(), Some(350.0), DetectionSet::empty());
        let t0 = Instant::now();

        h.engine.tick(t0);
        h.engine.tick(t0 + Duration::from_millis(50));
        assert_eq!(*h.shared.range_reads.lock().unwrap(), 1);

        h.engine.tick(t0 + Duration::from_millis(250));
        assert_eq!(*h.shared.range_reads.lock().unwrap(), 2);
    }

    #[test]
    fn test_position_from_detection_counts() {
        let detections = DetectionSet::new(vec![
            Detection::new(Position::Left, "chair", 0.8),
            Detection::new(Position::Left, "table", 0.7),
            Detection::new(Position::Front, "person", 0.9),
        ]);
        let mut h = harness(test_config(), Some(250.0), detections);

        let outcome = h.engine.tick(Instant::now());

        assert_eq!(outcome.position, Some(Position::Left));
        assert_eq!(
            outcome.pattern,
            ActuationPattern {
                led: false,
                left_motor: true,
                right_motor: false
            }
        );
        assert_eq!(drain(&mut h.spoken), vec!["Far obstacle at left"]);
        assert_eq!(*h.shared.vision_thresholds.lock().unwrap(), vec![0.25]);
    }

    #[test]
    fn test_low_confidence_detections_are_ignored() {
        let detections = DetectionSet::new(vec![
            Detection::new(Position::Right, "cup", 0.1),
            Detection::new(Position::Right, "cup", 0.2),
        ]);
        let mut h = harness(test_config(), Some(150.0), detections);

        let outcome = h.engine.tick(Instant::now());
        assert_eq!(outcome.position, Some(Position::Front));
    }

    #[test]
    fn test_vision_failure_falls_back_to_front() {
        let mut h = harness(test_config(), Some(150.0), DetectionSet::empty());
        *h.shared.detections.lock().unwrap() = None;

        let outcome = h.engine.tick(Instant::now());

        assert_eq!(outcome.position, Some(Position::Front));
        assert!(outcome.advisory.is_some());
    }

    #[test]
    fn test_disabled_skips_detection() {
        let mut h = harness(test_config(), Some(5.0), DetectionSet::empty());
        h.toggle.press(&[true]);

        let outcome = h.engine.tick(Instant::now());

        assert!(outcome.pattern.is_off());
        assert!(outcome.tier.is_none());
        assert_eq!(*h.shared.range_reads.lock().unwrap(), 0);
        assert_eq!(drain(&mut h.spoken), vec!["Obstacle detection disabled"]);
        assert_eq!(h.engine.mode(), Mode::Monitoring { enabled: false });
    }

    #[test]
    fn test_toggle_debounce_through_engine() {
        let mut h = harness(test_config(), Some(350.0), DetectionSet::empty());
        let t0 = Instant::now();

        h.toggle.press(&[true, true]);
        h.engine.tick(t0);
        h.engine.tick(t0 + Duration::from_millis(100));
        assert_eq!(h.engine.mode(), Mode::Monitoring { enabled: false });

        h.toggle.press(&[true]);
        h.engine.tick(t0 + Duration::from_millis(600));
        assert_eq!(h.engine.mode(), Mode::Monitoring { enabled: true });
    }

    #[test]
    fn test_reenable_speaks_immediately() {
        let mut h = harness(test_config(), Some(150.0), DetectionSet::empty());
        let t0 = Instant::now();

        assert!(h.engine.tick(t0).advisory.is_some());

        h.toggle.press(&[true]);
        h.engine.tick(t0 + Duration::from_secs(1));
        h.toggle.press(&[true]);
        let resumed = h.engine.tick(t0 + Duration::from_secs(2));

        assert!(resumed.advisory.is_some());
        assert_eq!(
            drain(&mut h.spoken),
            vec![
                "Close obstacle at front",
                "Obstacle detection disabled",
                "Obstacle detection enabled",
                "Close obstacle at front",
            ]
        );
    }

    #[test]
    fn test_identification_announces_unique_labels() {
        let detections = DetectionSet::new(vec![
            Detection::new(Position::Left, "person", 0.5),
            Detection::new(Position::Front, "chair", 0.9),
            Detection::new(Position::Right, "person", 0.8),
            Detection::new(Position::Right, "cup", 0.1),
        ]);
        let mut h = harness(test_config(), Some(350.0), detections);
        // rising edge, confirmation, then released on the first release poll
        h.identify.press(&[true, true, false]);

        let outcome = h.engine.tick(Instant::now());

        assert!(outcome.advisory.is_none());
        assert_eq!(h.engine.mode(), Mode::Monitoring { enabled: true });
        assert_eq!(
            drain(&mut h.spoken),
            vec![
                "Object detection mode",
                "Detected person",
                "Detected chair",
                "Total 2 objects detected",
                "Returning to obstacle detection",
            ]
        );
        assert_eq!(h.shared.vision_thresholds.lock().unwrap()[0], 0.3);

        // three blinks between the forced all-off and the tick's own pattern
        let applied = h.shared.applied.lock().unwrap();
        let blinks = applied.iter().filter(|p| **p == ActuationPattern::LED_ONLY).count();
        assert_eq!(blinks, 3);
        assert_eq!(applied[0], ActuationPattern::OFF);
    }

    #[test]
    fn test_identification_with_nothing_in_view() {
        let mut h = harness(test_config(), Some(350.0), DetectionSet::empty());
        h.identify.press(&[true, true, false]);

        h.engine.tick(Instant::now());

        assert_eq!(
            drain(&mut h.spoken),
            vec![
                "Object detection mode",
                "No objects detected",
                "Returning to obstacle detection",
            ]
        );
    }

    #[test]
    fn test_identify_noise_is_discarded() {
        let mut h = harness(test_config(), Some(350.0), DetectionSet::empty());
        h.identify.press(&[true, false]);

        h.engine.tick(Instant::now());

        assert!(drain(&mut h.spoken).is_empty());
        assert!(h.shared.vision_thresholds.lock().unwrap().is_empty());
    }

    #[test]
    fn test_held_identify_button_fires_once() {
        let mut h = harness(test_config(), Some(350.0), DetectionSet::empty());
        let t0 = Instant::now();
        // held past the release timeout and into the next tick
        h.identify.hold(true);

        h.engine.tick(t0);
        assert_eq!(drain(&mut h.spoken).len(), 3);

        h.engine.tick(t0 + Duration::from_millis(100));
        assert!(drain(&mut h.spoken).is_empty());

        h.identify.hold(false);
        h.engine.tick(t0 + Duration::from_millis(200));
        h.identify.hold(true);
        h.engine.tick(t0 + Duration::from_millis(300));
        assert_eq!(drain(&mut h.spoken).len(), 3);
    }

    #[test]
    fn test_identification_preserves_disabled_state() {
        let config = FusionConfig {
            announce_mode_changes: false,
            ..test_config()
        };
        let mut h = harness(config, Some(5.0), DetectionSet::empty());
        let t0 = Instant::now();

        h.toggle.press(&[true]);
        h.engine.tick(t0);
        h.identify.press(&[true, true, false]);
        let outcome = h.engine.tick(t0 + Duration::from_secs(1));

        assert!(outcome.pattern.is_off());
        assert_eq!(h.engine.mode(), Mode::Monitoring { enabled: false });
    }

    #[test]
    fn test_rejects_invalid_thresholds() {
        let config = FusionConfig {
            thresholds: ThresholdTable {
                very_close_cm: 50.0,
                close_cm: 20.0,
                far_cm: 100.0,
            },
            ..test_config()
        };
        let shared = Shared::default();
        let (dispatcher, _rx) = SpeechDispatcher::channel(4);
        let peripherals = Peripherals {
            range: Box::new(FakeRange(shared.clone())),
            vision: Box::new(FakeVision(shared.clone())),
            actuator: Box::new(FakeActuator(shared)),
            toggle_button: None,
            identify_button: None,
        };

        let result = AlertFusionEngine::new(config, VisionConfig::default(), peripherals, dispatcher);
        assert!(matches!(result, Err(FusionError::Config(_))));
    }
}
