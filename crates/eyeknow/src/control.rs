//! Control-loop thread

use alert_fusion::AlertFusionEngine;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Drives the fusion engine on a dedicated thread until stopped
pub struct ControlLoop {
    engine: AlertFusionEngine,
    interval: Duration,
    running: Arc<AtomicBool>,
}

impl ControlLoop {
    pub fn new(engine: AlertFusionEngine, interval: Duration) -> Self {
        Self {
            engine,
            interval,
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Spawn the loop on its own OS thread
    pub fn spawn(self) -> std::io::Result<ControlHandle> {
        let running = self.running.clone();
        let thread = thread::Builder::new()
            .name("control-loop".to_string())
            .spawn(move || self.run())?;

        Ok(ControlHandle { running, thread })
    }

    /// Tick until the running flag is cleared, then switch all outputs off
    pub fn run(mut self) {
        info!("Control loop started ({:?} interval)", self.interval);

        while self.running.load(Ordering::SeqCst) {
            let outcome = self.engine.tick(Instant::now());
            if let Some(tier) = outcome.tier {
                debug!("Tick: {:?} {:?}", tier, outcome.position);
            }
            thread::sleep(self.interval);
        }

        self.engine.all_off();
        info!("Control loop stopped");
    }
}

/// Handle to a running control loop
pub struct ControlHandle {
    running: Arc<AtomicBool>,
    thread: JoinHandle<()>,
}

impl ControlHandle {
    pub fn is_running(&self) -> bool {
        !self.thread.is_finished()
    }

    /// Clear the running flag and wait up to `timeout` for the thread to exit.
    ///
    /// Returns false if the thread was abandoned.
    pub async fn stop(self, timeout: Duration) -> bool {
        self.running.store(false, Ordering::SeqCst);

        let joined = tokio::time::timeout(timeout, async {
            while !self.thread.is_finished() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await;

        match joined {
            Ok(()) => {
                if self.thread.join().is_err() {
                    warn!("Control loop panicked");
                }
                true
            }
            Err(_) => {
                warn!("Control loop did not stop within {:?}, abandoning it", timeout);
                false
            }
        }
    }
}
