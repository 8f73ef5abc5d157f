//! EyeKnow - Main Entry Point

use eyeknow::{init_logging, load_config, run};
use std::time::Duration;
use tracing::info;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    info!("=== EyeKnow v{} ===", env!("CARGO_PKG_VERSION"));
    info!("Starting obstacle alert system...");

    let config = load_config()?;
    let stop_timeout = Duration::from_millis(config.runtime.stop_timeout_ms);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(run(config));

    // A synthesizer still talking must not hold the process open
    runtime.shutdown_timeout(stop_timeout);
    info!("System cleanup completed.");

    result.map_err(Into::into)
}
