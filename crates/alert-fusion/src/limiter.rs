//! Speech rate limiting

use std::time::{Duration, Instant};
use tracing::debug;

/// Minimum spacing between spoken obstacle advisories.
///
/// Actuation is never throttled; only speech goes through here.
#[derive(Debug, Clone)]
pub struct SpeechRateLimiter {
    interval: Duration,
    last_spoken_at: Option<Instant>,
}

impl SpeechRateLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_spoken_at: None,
        }
    }

    /// Whether an advisory may be spoken at `now`
    pub fn should_speak(&self, now: Instant) -> bool {
        match self.last_spoken_at {
            Some(last) => {
                let elapsed = now.saturating_duration_since(last);
                if elapsed < self.interval {
                    debug!(
                        "Advisory suppressed: {} ms since last, interval {} ms",
                        elapsed.as_millis(),
                        self.interval.as_millis()
                    );
                    false
                } else {
                    true
                }
            }
            None => true,
        }
    }

    /// Record that an advisory was spoken at `now`
    pub fn record(&mut self, now: Instant) {
        self.last_spoken_at = Some(now);
    }

    /// Forget the last advisory so the next one is spoken immediately
    pub fn reset(&mut self) {
        self.last_spoken_at = None;
    }

    pub fn last_spoken_at(&self) -> Option<Instant> {
        self.last_spoken_at
    }
}
