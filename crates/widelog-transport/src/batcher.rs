//! Event queue with size- and time-triggered flushing.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};
use widelog_events::WideEvent;

use crate::client::{HttpIngestClient, IngestClient};
use crate::error::{TransportError, TransportResult};

/// Queue length that triggers an immediate flush.
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Delay before a scheduled flush fires.
pub const DEFAULT_FLUSH_DELAY: Duration = Duration::from_millis(100);

/// Batching knobs.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Queue length that triggers an immediate flush.
    pub batch_size: usize,
    /// Delay before a scheduled flush fires.
    pub flush_delay: Duration,
    /// Mirror events to the log when no ingest client is configured.
    pub mirror_when_disabled: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            flush_delay: DEFAULT_FLUSH_DELAY,
            mirror_when_disabled: false,
        }
    }
}

impl TransportConfig {
    /// Set the batch size.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Set the flush delay.
    #[must_use]
    pub fn with_flush_delay(mut self, flush_delay: Duration) -> Self {
        self.flush_delay = flush_delay;
        self
    }

    /// Mirror events to the log when delivery is disabled.
    #[must_use]
    pub fn with_mirroring(mut self, enabled: bool) -> Self {
        self.mirror_when_disabled = enabled;
        self
    }
}

/// Where batches go: a dataset on an ingest endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestTarget {
    /// Base URL of the ingest API.
    pub endpoint: String,
    /// Dataset name.
    pub dataset: String,
    /// Bearer token; delivery is disabled without one.
    pub token: Option<String>,
}

/// Buffers accepted events and ships them in batches.
///
/// Cloning is cheap; clones share the queue. A flush swaps the whole queue
/// out before the network call, so events enqueued meanwhile land in the
/// next batch. Failed batches are logged and dropped, never re-queued.
#[derive(Clone)]
pub struct Transport {
    inner: Arc<Inner>,
}

struct Inner {
    client: Option<Arc<dyn IngestClient>>,
    config: TransportConfig,
    queue: Mutex<Vec<WideEvent>>,
    timer: Mutex<Option<ScheduledFlush>>,
    timer_ids: AtomicU64,
}

struct ScheduledFlush {
    id: u64,
    handle: JoinHandle<()>,
}

impl Transport {
    /// Create a transport delivering through `client`.
    #[must_use]
    pub fn new(client: Arc<dyn IngestClient>, config: TransportConfig) -> Self {
        Self::build(Some(client), config)
    }

    /// Create a transport with delivery disabled. Events are dropped, or
    /// mirrored to the log if configured.
    #[must_use]
    pub fn disabled(config: TransportConfig) -> Self {
        Self::build(None, config)
    }

    /// Create a transport for an HTTP ingest target.
    ///
    /// A missing or unusable token disables delivery instead of failing.
    #[must_use]
    pub fn for_target(target: &IngestTarget, config: TransportConfig) -> Self {
        let Some(token) = target.token.as_deref().filter(|t| !t.is_empty()) else {
            warn!(
                dataset = %target.dataset,
                "No ingest token configured, remote delivery disabled"
            );
            return Self::disabled(config);
        };

        match HttpIngestClient::new(&target.endpoint, &target.dataset, token) {
            Ok(client) => Self::new(Arc::new(client), config),
            Err(e) => {
                error!(error = %e, "Invalid ingest configuration, remote delivery disabled");
                Self::disabled(config)
            },
        }
    }

    fn build(client: Option<Arc<dyn IngestClient>>, config: TransportConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                client,
                config,
                queue: Mutex::new(Vec::new()),
                timer: Mutex::new(None),
                timer_ids: AtomicU64::new(0),
            }),
        }
    }

    /// Whether events are delivered anywhere.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.inner.client.is_some()
    }

    /// Number of events waiting for the next flush.
    #[must_use]
    pub fn pending(&self) -> usize {
        lock(&self.inner.queue).len()
    }

    /// Get the batching configuration.
    #[must_use]
    pub fn config(&self) -> &TransportConfig {
        &self.inner.config
    }

    /// Queue an event for delivery.
    ///
    /// Reaching the batch size starts a flush right away; otherwise a flush
    /// is scheduled after the flush delay unless one is already pending.
    /// Both need a tokio runtime; without one, events wait for
    /// [`Transport::flush`].
    pub fn enqueue(&self, event: WideEvent) {
        if self.inner.client.is_none() {
            self.inner.mirror(&event);
            return;
        }

        let queued = {
            let mut queue = lock(&self.inner.queue);
            queue.push(event);
            queue.len()
        };
        trace!(queued, "Wide event queued");

        if queued >= self.inner.config.batch_size {
            self.spawn_flush();
        } else {
            self.schedule_flush();
        }
    }

    /// Deliver everything queued as one batch.
    ///
    /// Cancels any scheduled flush. Returns the number of events delivered,
    /// `0` for an empty queue (no network call is made). Errors are logged
    /// before being returned and the batch is dropped either way.
    ///
    /// # Errors
    ///
    /// Returns the delivery error for diagnostics.
    pub async fn flush(&self) -> TransportResult<usize> {
        Inner::flush(&self.inner).await
    }

    /// Flush whatever is left; call before the process exits or freezes.
    ///
    /// # Errors
    ///
    /// Returns the delivery error for diagnostics.
    pub async fn shutdown(&self) -> TransportResult<usize> {
        debug!(pending = self.pending(), "Transport shutting down");
        self.flush().await
    }

    fn spawn_flush(&self) {
        let Ok(handle) = Handle::try_current() else {
            debug!("No tokio runtime, batch waits for a manual flush");
            return;
        };
        let inner = Arc::clone(&self.inner);
        handle.spawn(async move {
            let _ = Inner::flush(&inner).await;
        });
    }

    fn schedule_flush(&self) {
        let mut timer = lock(&self.inner.timer);
        if timer.is_some() {
            return;
        }
        let Ok(handle) = Handle::try_current() else {
            debug!("No tokio runtime, batch waits for a manual flush");
            return;
        };

        let inner = Arc::clone(&self.inner);
        let delay = self.inner.config.flush_delay;
        let id = self.inner.timer_ids.fetch_add(1, Ordering::Relaxed);
        let handle = handle.spawn(async move {
            tokio::time::sleep(delay).await;
            // A flush that ran meanwhile already took (and aborted) this timer,
            // and the slot may now hold a newer one.
            let still_scheduled = {
                let mut slot = lock(&inner.timer);
                let ours = slot.as_ref().is_some_and(|scheduled| scheduled.id == id);
                if ours {
                    slot.take();
                }
                ours
            };
            if still_scheduled {
                let _ = Inner::flush(&inner).await;
            }
        });
        *timer = Some(ScheduledFlush { id, handle });
    }
}

impl Inner {
    async fn flush(self: &Arc<Self>) -> TransportResult<usize> {
        if let Some(scheduled) = lock(&self.timer).take() {
            scheduled.handle.abort();
        }

        let batch = std::mem::take(&mut *lock(&self.queue));
        if batch.is_empty() {
            return Ok(0);
        }
        let Some(client) = &self.client else {
            return Ok(0);
        };

        let count = batch.len();
        match client.ingest(&batch).await {
            Ok(()) => {
                debug!(count, "Flushed wide events");
                Ok(count)
            },
            Err(e) => {
                log_failure(&e, count);
                Err(e)
            },
        }
    }

    fn mirror(&self, event: &WideEvent) {
        if !self.config.mirror_when_disabled {
            trace!(event_id = %event.event_id, "Delivery disabled, wide event dropped");
            return;
        }
        match serde_json::to_string(event) {
            Ok(json) => info!(target: "widelog::mirror", wide_event = %json, "Wide event"),
            Err(e) => warn!(error = %e, "Failed to serialize wide event for mirroring"),
        }
    }
}

fn log_failure(error: &TransportError, count: usize) {
    match error {
        TransportError::Rejected {
            status,
            body,
            rate_limit_remaining,
        } => {
            error!(
                status,
                body = %body,
                rate_limit_remaining = rate_limit_remaining.as_deref(),
                count,
                "Ingest rejected batch, dropping"
            );
        },
        other => {
            error!(error = %other, count, "Ingest request failed, dropping batch");
        },
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport")
            .field("enabled", &self.is_enabled())
            .field("pending", &self.pending())
            .field("config", &self.inner.config)
            .finish()
    }
}
