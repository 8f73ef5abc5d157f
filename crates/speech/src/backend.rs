//! Synthesis backends and voice profiles

use crate::SpeechError;
use serde::{Deserialize, Serialize};
use std::process::Command;
use tracing::{debug, warn};

/// Voice parameters handed to the synthesizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceProfile {
    /// Voice identifier (e.g. "en+f4")
    pub voice: String,
    /// Speaking rate (words per minute)
    pub rate_wpm: u32,
    /// Amplitude (0-200)
    pub amplitude: u32,
    /// Extra gap between words (10 ms units)
    pub word_gap: Option<u32>,
    /// Base pitch (0-99)
    pub pitch: Option<u32>,
    /// Emphasis on capital letters
    pub capital_emphasis: Option<u32>,
}

impl VoiceProfile {
    /// Slow, loud, well-separated speech
    pub fn clarity() -> Self {
        Self {
            voice: "en+f4".to_string(),
            rate_wpm: 110,
            amplitude: 200,
            word_gap: Some(15),
            pitch: Some(45),
            capital_emphasis: Some(20),
        }
    }

    /// Minimal profile for when the clarity options are rejected
    pub fn fallback() -> Self {
        Self {
            voice: "en+f3".to_string(),
            rate_wpm: 120,
            amplitude: 180,
            word_gap: None,
            pitch: None,
            capital_emphasis: None,
        }
    }
}

/// Speech synthesizer.
///
/// Failures are reported through the returned status; implementations must
/// not panic on a bad device or missing executable.
pub trait SynthesisBackend: Send + Sync {
    fn speak(&self, text: &str, profile: &VoiceProfile) -> Result<(), SpeechError>;
}

/// Speak with the primary profile, retrying once with the fallback profile
pub fn speak_with_fallback(
    backend: &dyn SynthesisBackend,
    text: &str,
    primary: &VoiceProfile,
    fallback: &VoiceProfile,
) -> Result<(), SpeechError> {
    match backend.speak(text, primary) {
        Ok(()) => Ok(()),
        Err(e) => {
            warn!("Primary voice failed ({}), retrying with fallback profile", e);
            backend.speak(text, fallback)
        }
    }
}

/// eSpeak command-line synthesizer
#[derive(Debug, Clone)]
pub struct EspeakBackend {
    program: String,
}

impl Default for EspeakBackend {
    fn default() -> Self {
        Self::new("espeak")
    }
}

impl EspeakBackend {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Command-line arguments for one utterance
    pub fn args(profile: &VoiceProfile, text: &str) -> Vec<String> {
        let mut args = vec![
            "-v".to_string(),
            profile.voice.clone(),
            "-s".to_string(),
            profile.rate_wpm.to_string(),
            "-a".to_string(),
            profile.amplitude.to_string(),
        ];
        if let Some(gap) = profile.word_gap {
            args.push("-g".to_string());
            args.push(gap.to_string());
        }
        if let Some(pitch) = profile.pitch {
            args.push("-p".to_string());
            args.push(pitch.to_string());
        }
        if let Some(emphasis) = profile.capital_emphasis {
            args.push("-k".to_string());
            args.push(emphasis.to_string());
        }
        args.push(text.to_string());
        args
    }
}

impl SynthesisBackend for EspeakBackend {
    fn speak(&self, text: &str, profile: &VoiceProfile) -> Result<(), SpeechError> {
        debug!("Speaking with {}: {}", profile.voice, text);

        let output = Command::new(&self.program)
            .args(Self::args(profile, text))
            .output()
            .map_err(|e| SpeechError::BackendUnavailable(format!("{}: {}", self.program, e)))?;

        if output.status.success() {
            Ok(())
        } else {
            Err(SpeechError::Synthesis(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )))
        }
    }
}
