//! Layered runtime configuration

use alert_fusion::FusionConfig;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use speech::SpeechConfig;
use std::time::Duration;
use vision::{Detection, VisionConfig};

/// Default configuration file, looked up relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "eyeknow.toml";

/// Environment variable overriding the configuration file path
pub const CONFIG_PATH_VAR: &str = "EYEKNOW_CONFIG";

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EyeKnowConfig {
    pub fusion: FusionConfig,
    pub vision: VisionConfig,
    pub speech: SpeechConfig,
    pub runtime: RuntimeConfig,
    pub simulation: SimulationConfig,
}

/// Control-loop pacing and shutdown bounds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Sleep between control-loop ticks (ms)
    pub loop_interval_ms: u64,
    /// Upper bound on waiting for the control loop and the runtime to stop (ms)
    pub stop_timeout_ms: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            loop_interval_ms: 50,
            stop_timeout_ms: 1000,
        }
    }
}

impl RuntimeConfig {
    pub fn loop_interval(&self) -> Duration {
        Duration::from_millis(self.loop_interval_ms)
    }

    pub fn stop_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_timeout_ms)
    }
}

/// Simulated sensor behaviour used when no hardware adapters are linked in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Closest distance of the range sweep (cm)
    pub min_cm: f64,
    /// Farthest distance of the range sweep (cm)
    pub max_cm: f64,
    /// Distance change per sample (cm)
    pub step_cm: f64,
    /// Objects the simulated camera reports on every frame
    pub detections: Vec<Detection>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            min_cm: 20.0,
            max_cm: 400.0,
            step_cm: 10.0,
            detections: vec![Detection::new(vision::Position::Front, "person", 0.8)],
        }
    }
}

/// Load configuration from `$EYEKNOW_CONFIG` (or `eyeknow.toml`) plus
/// `EYEKNOW_*` environment overrides
pub fn load_config() -> Result<EyeKnowConfig, ConfigError> {
    let path = std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    load_config_from(&path)
}

/// Load configuration from an explicit file path. A missing file yields defaults.
pub fn load_config_from(path: &str) -> Result<EyeKnowConfig, ConfigError> {
    let builder = Config::builder().add_source(File::with_name(path).required(false));
    finish(builder)
}

fn finish(builder: ConfigBuilder<DefaultState>) -> Result<EyeKnowConfig, ConfigError> {
    builder
        .add_source(
            Environment::with_prefix("EYEKNOW")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize()
}
