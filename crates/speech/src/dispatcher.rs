//! Speech Dispatcher
//!
//! Single-producer, single-consumer bounded queue between the control loop
//! and the synthesizer. The producer never waits: a full queue drops the
//! new message.

use crate::backend::{speak_with_fallback, SynthesisBackend, VoiceProfile};
use crate::config::SpeechConfig;
use crate::normalizer::TextClarityNormalizer;
use crate::SpeechError;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, warn};

/// How often shutdown re-checks whether the queue has drained
const DRAIN_POLL: Duration = Duration::from_millis(25);

/// Advisory text waiting to be spoken
#[derive(Debug, Clone, PartialEq)]
pub struct AdvisoryMessage {
    pub raw_text: String,
    pub generated_at: Instant,
}

impl AdvisoryMessage {
    pub fn new(raw_text: impl Into<String>, generated_at: Instant) -> Self {
        Self {
            raw_text: raw_text.into(),
            generated_at,
        }
    }
}

/// Consumer end of the speech queue
pub type AdvisoryReceiver = mpsc::Receiver<AdvisoryMessage>;

/// Outcome of a non-blocking enqueue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueStatus {
    Queued,
    Dropped,
}

/// Counters shared between the dispatcher and its worker
#[derive(Debug, Default)]
pub struct DispatchStats {
    queued: AtomicU64,
    dropped: AtomicU64,
    spoken: AtomicU64,
    failed: AtomicU64,
    /// Accepted but not yet finished
    pending: AtomicUsize,
}

impl DispatchStats {
    pub fn queued(&self) -> u64 {
        self.queued.load(Ordering::Relaxed)
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn spoken(&self) -> u64 {
        self.spoken.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }
}

/// Producer handle used by the control loop
#[derive(Debug, Clone)]
pub struct SpeechDispatcher {
    sender: mpsc::Sender<AdvisoryMessage>,
    stats: Arc<DispatchStats>,
}

impl SpeechDispatcher {
    /// Create a dispatcher and the receiving end of its queue
    pub fn channel(capacity: usize) -> (Self, AdvisoryReceiver) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let dispatcher = Self {
            sender,
            stats: Arc::new(DispatchStats::default()),
        };
        (dispatcher, receiver)
    }

    /// Queue text for speaking without blocking
    pub fn enqueue(&self, text: impl Into<String>) -> EnqueueStatus {
        self.enqueue_message(AdvisoryMessage::new(text, Instant::now()))
    }

    /// Queue a message for speaking without blocking
    pub fn enqueue_message(&self, message: AdvisoryMessage) -> EnqueueStatus {
        self.stats.pending.fetch_add(1, Ordering::AcqRel);

        match self.sender.try_send(message) {
            Ok(()) => {
                self.stats.queued.fetch_add(1, Ordering::Relaxed);
                EnqueueStatus::Queued
            }
            Err(TrySendError::Full(message)) => {
                self.record_drop();
                warn!("Speech queue full - skipping message: {}", message.raw_text);
                EnqueueStatus::Dropped
            }
            Err(TrySendError::Closed(message)) => {
                self.record_drop();
                debug!("Speech worker stopped - skipping message: {}", message.raw_text);
                EnqueueStatus::Dropped
            }
        }
    }

    fn record_drop(&self) {
        self.stats.pending.fetch_sub(1, Ordering::AcqRel);
        self.stats.dropped.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("speech_messages_dropped_total").increment(1);
    }

    /// Shared counters
    pub fn stats(&self) -> Arc<DispatchStats> {
        self.stats.clone()
    }
}

/// Background consumer feeding the synthesizer
pub struct SpeechWorker {
    receiver: AdvisoryReceiver,
    backend: Arc<dyn SynthesisBackend>,
    normalizer: TextClarityNormalizer,
    primary: VoiceProfile,
    fallback: VoiceProfile,
    poll_interval: Duration,
    running: Arc<AtomicBool>,
    stats: Arc<DispatchStats>,
}

impl SpeechWorker {
    pub fn new(
        receiver: AdvisoryReceiver,
        backend: Arc<dyn SynthesisBackend>,
        config: &SpeechConfig,
        running: Arc<AtomicBool>,
        stats: Arc<DispatchStats>,
    ) -> Self {
        Self {
            receiver,
            backend,
            normalizer: TextClarityNormalizer::new(),
            primary: config.primary.clone(),
            fallback: config.fallback.clone(),
            poll_interval: config.poll_interval(),
            running,
            stats,
        }
    }

    /// Run until the running flag clears or every producer is gone
    pub async fn run(mut self) {
        info!("Starting speech worker");

        while self.running.load(Ordering::SeqCst) {
            match timeout(self.poll_interval, self.receiver.recv()).await {
                Ok(Some(message)) => self.deliver(message).await,
                Ok(None) => {
                    debug!("Speech channel closed");
                    break;
                }
                Err(_) => continue,
            }
        }

        info!("Speech worker stopped");
    }

    async fn deliver(&self, message: AdvisoryMessage) {
        let text = self.normalizer.normalize(&message.raw_text);
        debug!(
            "Speaking \"{}\" (queued {} ms ago)",
            text,
            message.generated_at.elapsed().as_millis()
        );

        if !text.is_empty() {
            let backend = self.backend.clone();
            let primary = self.primary.clone();
            let fallback = self.fallback.clone();
            let spoken = tokio::task::spawn_blocking(move || {
                speak_with_fallback(backend.as_ref(), &text, &primary, &fallback)
            })
            .await
            .unwrap_or_else(|e| Err(SpeechError::Worker(e.to_string())));

            match spoken {
                Ok(()) => {
                    self.stats.spoken.fetch_add(1, Ordering::Relaxed);
                }
                Err(SpeechError::Worker(e)) => {
                    self.stats.failed.fetch_add(1, Ordering::Relaxed);
                    error!("Speech task panicked: {}", e);
                }
                Err(e) => {
                    self.stats.failed.fetch_add(1, Ordering::Relaxed);
                    metrics::counter!("speech_backend_failures_total").increment(1);
                    warn!("Speech dropped after fallback failed: {}", e);
                }
            }
        }

        self.stats.pending.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Running speech pipeline: dispatcher, worker task and its running flag
pub struct SpeechService {
    dispatcher: SpeechDispatcher,
    running: Arc<AtomicBool>,
    handle: JoinHandle<()>,
    grace: Duration,
    poll_interval: Duration,
}

impl SpeechService {
    /// Spawn the worker on the current tokio runtime
    pub fn spawn(config: &SpeechConfig, backend: Arc<dyn SynthesisBackend>) -> Self {
        let (dispatcher, receiver) = SpeechDispatcher::channel(config.queue_capacity);
        let running = Arc::new(AtomicBool::new(true));
        let worker = SpeechWorker::new(
            receiver,
            backend,
            config,
            running.clone(),
            dispatcher.stats(),
        );

        info!(
            "Speech service started: capacity={}, voice={}",
            config.queue_capacity, config.primary.voice
        );

        Self {
            dispatcher,
            running,
            handle: tokio::spawn(worker.run()),
            grace: config.shutdown_grace(),
            poll_interval: config.poll_interval(),
        }
    }

    /// Producer handle for the control loop
    pub fn dispatcher(&self) -> SpeechDispatcher {
        self.dispatcher.clone()
    }

    /// Queue a farewell, wait up to the grace period for the queue to drain,
    /// then stop the worker. Returns whether everything queued was finished.
    pub async fn shutdown(self, farewell: Option<&str>) -> bool {
        if let Some(text) = farewell {
            self.dispatcher.enqueue(text);
        }

        let stats = self.dispatcher.stats();
        let drained = timeout(self.grace, async {
            while stats.pending() > 0 {
                sleep(DRAIN_POLL).await;
            }
        })
        .await
        .is_ok();

        if !drained {
            warn!(
                "Speech queue not drained within {} ms ({} pending)",
                self.grace.as_millis(),
                stats.pending()
            );
        }

        self.running.store(false, Ordering::SeqCst);

        match timeout(self.poll_interval + DRAIN_POLL, self.handle).await {
            Ok(_) => info!("Speech worker joined"),
            Err(_) => warn!("Speech worker still busy, abandoning it"),
        }

        drained
    }
}
