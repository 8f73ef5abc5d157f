//! Spoken Advisories
//!
//! Turns advisory text into clear speech without ever blocking the caller:
//! - Deterministic text normalization (numerals, phonetic re-spelling, pauses)
//! - Voice profiles and the synthesis backend contract
//! - Bounded queue with a single background worker

mod backend;
mod config;
mod dispatcher;
mod normalizer;

pub use backend::{speak_with_fallback, EspeakBackend, SynthesisBackend, VoiceProfile};
pub use config::SpeechConfig;
pub use dispatcher::{
    AdvisoryMessage, AdvisoryReceiver, DispatchStats, EnqueueStatus, SpeechDispatcher, SpeechService, SpeechWorker,
};
pub use normalizer::{spell_number, TextClarityNormalizer};

use thiserror::Error;

/// Speech error types
#[derive(Error, Debug)]
pub enum SpeechError {
    #[error("Synthesis backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Synthesis failed: {0}")]
    Synthesis(String),

    #[error("Speech worker failed: {0}")]
    Worker(String),
}
