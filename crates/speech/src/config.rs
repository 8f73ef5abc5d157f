//! Speech configuration

use crate::backend::VoiceProfile;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Speech configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Bounded queue capacity; messages beyond it are dropped
    pub queue_capacity: usize,

    /// How often the idle worker re-checks the running flag (ms)
    pub poll_interval_ms: u64,

    /// Grace period for the farewell message on shutdown (ms)
    pub shutdown_grace_ms: u64,

    /// Synthesizer executable
    pub program: String,

    /// Profile tuned for clarity
    pub primary: VoiceProfile,

    /// Simpler profile tried once when the primary fails
    pub fallback: VoiceProfile,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 16,
            poll_interval_ms: 200,
            shutdown_grace_ms: 3000,
            program: "espeak".to_string(),
            primary: VoiceProfile::clarity(),
            fallback: VoiceProfile::fallback(),
        }
    }
}

impl SpeechConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}
