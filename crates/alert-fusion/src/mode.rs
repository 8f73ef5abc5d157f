//! Operating mode and button debouncing

use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Physical push button, sampled once per tick
pub trait ButtonInput: Send {
    /// Whether the button is currently pressed
    fn is_asserted(&mut self) -> bool;
}

/// Active operating mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Continuous obstacle monitoring, possibly switched off by the user
    Monitoring { enabled: bool },
    /// One-shot object identification in progress
    Identifying,
}

/// Debounced mode state machine.
///
/// Holds the only state that survives between ticks apart from the speech
/// rate limiter: the mode, the last accepted toggle time and the previous
/// identify-button sample.
#[derive(Debug, Clone)]
pub struct ModeController {
    mode: Mode,
    toggle_debounce: Duration,
    last_toggle_at: Option<Instant>,
    identify_was_asserted: bool,
    resume_enabled: bool,
}

impl ModeController {
    /// Start in enabled monitoring
    pub fn new(toggle_debounce: Duration) -> Self {
        Self {
            mode: Mode::Monitoring { enabled: true },
            toggle_debounce,
            last_toggle_at: None,
            identify_was_asserted: false,
            resume_enabled: true,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self.mode, Mode::Monitoring { enabled: true })
    }

    /// Feed one toggle sample. Returns the new `enabled` state when a
    /// transition is accepted.
    pub fn on_toggle(&mut self, asserted: bool, now: Instant) -> Option<bool> {
        if !asserted {
            return None;
        }

        let enabled = match self.mode {
            Mode::Monitoring { enabled } => enabled,
            Mode::Identifying => return None,
        };

        if let Some(last) = self.last_toggle_at {
            if now.saturating_duration_since(last) < self.toggle_debounce {
                debug!("Toggle ignored: within debounce window");
                return None;
            }
        }

        self.last_toggle_at = Some(now);
        self.mode = Mode::Monitoring { enabled: !enabled };
        info!(
            "Obstacle detection: {}",
            if enabled { "DISABLED" } else { "ENABLED" }
        );
        Some(!enabled)
    }

    /// Feed one identify-button sample. Returns true on a rising edge.
    pub fn on_identify_sample(&mut self, asserted: bool) -> bool {
        let rising = asserted && !self.identify_was_asserted;
        self.identify_was_asserted = asserted;
        rising && matches!(self.mode, Mode::Monitoring { .. })
    }

    /// Enter identification, remembering the monitoring state to return to
    pub fn begin_identification(&mut self) {
        if let Mode::Monitoring { enabled } = self.mode {
            self.resume_enabled = enabled;
            self.mode = Mode::Identifying;
        }
    }

    /// Leave identification and resume the prior monitoring state
    pub fn finish_identification(&mut self) {
        if self.mode == Mode::Identifying {
            self.mode = Mode::Monitoring {
                enabled: self.resume_enabled,
            };
        }
    }

    /// Record the last identify-button level observed outside `on_identify_sample`
    pub fn set_identify_level(&mut self, asserted: bool) {
        self.identify_was_asserted = asserted;
    }
}
