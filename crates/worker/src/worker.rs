//! The refresh worker: one cooperative loop, one upstream call at a time.
//!
//! Each iteration:
//!
//! 1. waits for the next [`RefreshRequest`];
//! 2. re-reads the cache and discards the request if the entry is fresh;
//! 3. asks the [`PlayerSource`] for the player;
//! 4. on success writes the document and paces briefly;
//! 5. on a 429 re-enqueues the request and sleeps until the window resets;
//! 6. on any other failure logs, drops the request and cools down.
//!
//! Errors and panics inside an iteration are caught at the loop boundary;
//! the loop only ends through [`RefreshHandle::shutdown`].

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use playercache_core::codec::PayloadCodec;
use playercache_db::CacheStore;
use playercache_upstream::{FetchOutcome, PlayerSource};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::document::{DocumentCodec, DocumentError, PlayerDocument};
use crate::queue::{QueueReceiver, RefreshQueue, RefreshRequest};

/// Default lifetime of a refreshed entry.
pub const DEFAULT_TTL: Duration = Duration::from_secs(1800);

/// Pause after a successful refresh.
pub const DEFAULT_SUCCESS_DELAY: Duration = Duration::from_secs(1);

/// Pause after a 429 that carried no reset header.
pub const DEFAULT_RATE_LIMIT_FALLBACK: Duration = Duration::from_secs(10);

/// Longest wait honoured from an upstream reset header.
pub const DEFAULT_MAX_RATE_LIMIT_WAIT: Duration = Duration::from_secs(300);

/// Pause after any other upstream failure.
pub const DEFAULT_ERROR_COOLDOWN: Duration = Duration::from_secs(5);

/// Pause after an iteration failed with an error or panic.
pub const DEFAULT_FAULT_COOLDOWN: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("Cache store error: {0}")]
    Store(#[from] sqlx::Error),

    #[error("Document error: {0}")]
    Document(#[from] DocumentError),
}

/// Timing and expiry parameters for the refresh loop.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub ttl: Duration,
    pub success_delay: Duration,
    pub rate_limit_fallback: Duration,
    /// Upper bound on `reset + 1s` after a 429.
    pub max_rate_limit_wait: Duration,
    pub error_cooldown: Duration,
    pub fault_cooldown: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            success_delay: DEFAULT_SUCCESS_DELAY,
            rate_limit_fallback: DEFAULT_RATE_LIMIT_FALLBACK,
            max_rate_limit_wait: DEFAULT_MAX_RATE_LIMIT_WAIT,
            error_cooldown: DEFAULT_ERROR_COOLDOWN,
            fault_cooldown: DEFAULT_FAULT_COOLDOWN,
        }
    }
}

/// What one iteration did with its request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Iteration {
    /// The entry was already fresh; no upstream call.
    Discarded,
    /// A new document was written.
    Refreshed,
    /// The upstream does not know the player; a placeholder was written.
    NotFound,
    /// The request went back on the queue.
    RateLimited { reset_after: Option<Duration> },
    /// The request was dropped.
    Failed,
}

impl Iteration {
    /// How long the loop sleeps before taking the next request.
    pub fn pause(&self, config: &WorkerConfig) -> Duration {
        match self {
            Iteration::Discarded => Duration::ZERO,
            Iteration::Refreshed | Iteration::NotFound => config.success_delay,
            Iteration::RateLimited {
                reset_after: Some(reset),
            } => reset
                .saturating_add(Duration::from_secs(1))
                .min(config.max_rate_limit_wait),
            Iteration::RateLimited { reset_after: None } => config.rate_limit_fallback,
            Iteration::Failed => config.error_cooldown,
        }
    }
}

/// Handle to the running worker. Cloning the queue is how callers enqueue.
pub struct RefreshHandle {
    queue: RefreshQueue,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl RefreshHandle {
    pub fn queue(&self) -> RefreshQueue {
        self.queue.clone()
    }

    /// Stop the worker: the current iteration finishes, pending sleeps are
    /// cut short, and queued requests are dropped without upstream calls.
    pub async fn shutdown(self, timeout: Duration) {
        self.cancel.cancel();
        match tokio::time::timeout(timeout, self.task).await {
            Ok(Ok(())) => tracing::info!("Refresh worker stopped"),
            Ok(Err(e)) => tracing::error!(error = %e, "Refresh worker task failed"),
            Err(_) => tracing::warn!(
                timeout_secs = timeout.as_secs(),
                "Refresh worker did not stop in time"
            ),
        }
    }
}

/// The single consumer of the refresh queue.
pub struct RefreshWorker {
    store: CacheStore,
    source: Arc<dyn PlayerSource>,
    codec: DocumentCodec,
    config: WorkerConfig,
    queue: RefreshQueue,
    receiver: QueueReceiver,
    cancel: CancellationToken,
}

impl RefreshWorker {
    /// Create the queue, spawn the loop, and return its handle.
    pub fn spawn(
        store: CacheStore,
        source: Arc<dyn PlayerSource>,
        codec: PayloadCodec,
        config: WorkerConfig,
    ) -> RefreshHandle {
        let (queue, receiver) = RefreshQueue::channel();
        let cancel = CancellationToken::new();
        let worker = RefreshWorker {
            store,
            source,
            codec: DocumentCodec::new(codec),
            config,
            queue: queue.clone(),
            receiver,
            cancel: cancel.clone(),
        };
        let task = tokio::spawn(worker.run());
        RefreshHandle {
            queue,
            cancel,
            task,
        }
    }

    async fn run(mut self) {
        tracing::info!(
            ttl_secs = self.config.ttl.as_secs(),
            codec = %self.codec.payload_codec(),
            "Refresh worker started"
        );

        loop {
            let request = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                next = self.receiver.recv() => match next {
                    Some(request) => request,
                    None => break,
                },
            };

            let iteration = async {
                let iteration = self.process(&request).await?;
                Ok::<_, WorkerError>(iteration.pause(&self.config))
            };
            let pause = match AssertUnwindSafe(iteration).catch_unwind().await {
                Ok(Ok(pause)) => pause,
                Ok(Err(e)) => {
                    tracing::error!(player_id = %request.id, error = %e, "Refresh iteration failed");
                    self.config.fault_cooldown
                }
                Err(panic) => {
                    tracing::error!(
                        player_id = %request.id,
                        panic = panic_message(panic.as_ref()),
                        "Refresh iteration panicked"
                    );
                    self.config.fault_cooldown
                }
            };

            if !pause.is_zero() {
                tokio::select! {
                    _ = self.cancel.cancelled() => break,
                    _ = tokio::time::sleep(pause) => {}
                }
            }
        }

        let dropped = self.receiver.close_and_drain();
        tracing::info!(dropped, "Refresh worker stopping");
    }

    /// Run steps 2-6 for one request.
    async fn process(&self, request: &RefreshRequest) -> Result<Iteration, WorkerError> {
        let id = &request.id;

        if !self.store.get(id).await?.stale {
            tracing::debug!(player_id = %id, "Entry already fresh, discarding refresh");
            return Ok(Iteration::Discarded);
        }

        tracing::info!(
            player_id = %id,
            requester_name = request.requester_name.as_deref().unwrap_or("-"),
            requester_id = request.requester_id.as_deref().unwrap_or("-"),
            "Refreshing player"
        );

        match self.source.fetch(id).await {
            FetchOutcome::Success { name, fields } => {
                let document = PlayerDocument::new(fields, name, self.store.now());
                let payload = self.codec.encode(&document)?;
                self.store.put(id, &payload, self.config.ttl).await?;
                tracing::info!(player_id = %id, name = ?document.name, "Player refreshed");
                Ok(Iteration::Refreshed)
            }
            FetchOutcome::NotFound => {
                let payload = self.codec.encode(&PlayerDocument::not_found(self.store.now()))?;
                self.store.put(id, &payload, self.config.ttl).await?;
                tracing::warn!(player_id = %id, "Player not found upstream");
                Ok(Iteration::NotFound)
            }
            FetchOutcome::RateLimited { reset_after } => {
                self.queue.enqueue(request.clone());
                tracing::warn!(
                    player_id = %id,
                    reset_secs = ?reset_after.map(|d| d.as_secs()),
                    "Upstream rate limited, request re-queued"
                );
                Ok(Iteration::RateLimited { reset_after })
            }
            FetchOutcome::Failed { status, reason } => {
                tracing::error!(player_id = %id, status = ?status, reason = %reason, "Upstream refresh failed");
                Ok(Iteration::Failed)
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}
