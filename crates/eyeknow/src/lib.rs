//! EyeKnow Runtime
//!
//! Wires configuration, the speech service, the fusion engine and the
//! control-loop thread together, and tears them down in a bounded order.

pub mod config;
pub mod control;
pub mod sim;

pub use crate::config::{load_config, load_config_from, EyeKnowConfig, RuntimeConfig, SimulationConfig};
pub use crate::control::{ControlHandle, ControlLoop};

use alert_fusion::{AlertFusionEngine, FusionError};
use speech::{EspeakBackend, SpeechService};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Spoken when the system comes up
pub const STARTUP_ANNOUNCEMENT: &str = "EyeKnow system activated. Obstacle detection mode active";

/// Spoken before the speech worker is stopped
pub const SHUTDOWN_ANNOUNCEMENT: &str = "EyeKnow system shutting down";

/// Runtime errors
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error("Engine setup failed: {0}")]
    Fusion(#[from] FusionError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Initialize logging
pub fn init_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(true)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Run until Ctrl-C, then shut down.
///
/// Must be called inside a tokio runtime.
pub async fn run(config: EyeKnowConfig) -> Result<(), RuntimeError> {
    let backend = Arc::new(EspeakBackend::new(config.speech.program.clone()));
    let speech = SpeechService::spawn(&config.speech, backend);
    let dispatcher = speech.dispatcher();

    let engine = AlertFusionEngine::new(
        config.fusion.clone(),
        config.vision.clone(),
        sim::peripherals(&config.simulation),
        dispatcher.clone(),
    )?;

    dispatcher.enqueue(STARTUP_ANNOUNCEMENT);
    let control = ControlLoop::new(engine, config.runtime.loop_interval()).spawn()?;
    info!("EyeKnow running, press Ctrl-C to stop");

    let interrupted = tokio::signal::ctrl_c().await;
    match interrupted {
        Ok(()) => info!("Program stopped by user."),
        Err(ref e) => warn!("Signal handler failed ({}), shutting down", e),
    }

    control.stop(config.runtime.stop_timeout()).await;

    let stats = dispatcher.stats();
    speech.shutdown(Some(SHUTDOWN_ANNOUNCEMENT)).await;
    info!(
        "Speech: queued={} spoken={} dropped={} failed={}",
        stats.queued(),
        stats.spoken(),
        stats.dropped(),
        stats.failed()
    );

    interrupted.map_err(Into::into)
}
