//! Mock implementations for testing.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use widelog_events::WideEvent;
use widelog_transport::{IngestClient, TransportError, TransportResult};

/// Scripted answer for one ingest call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockResponse {
    /// Accept the batch.
    Accept,
    /// Reject the batch with an HTTP status.
    Reject {
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
    },
}

impl MockResponse {
    /// A rejection with an empty body.
    #[must_use]
    pub fn reject(status: u16) -> Self {
        Self::Reject {
            status,
            body: String::new(),
        }
    }
}

/// Mock implementation of the `IngestClient` trait for testing.
///
/// Records every batch it receives, including rejected ones. Uses
/// `std::sync::Mutex` internally so builder methods work without a runtime.
#[derive(Debug, Clone)]
pub struct MockIngestClient {
    /// Every batch received, in order.
    batches: Arc<Mutex<Vec<Vec<WideEvent>>>>,
    /// Queued answers.
    responses: Arc<Mutex<VecDeque<MockResponse>>>,
    /// Answer when the queue is empty.
    default_response: MockResponse,
    /// Simulated network latency.
    latency: Option<Duration>,
}

impl MockIngestClient {
    /// Create a mock client that accepts everything.
    #[must_use]
    pub fn new() -> Self {
        Self {
            batches: Arc::new(Mutex::new(Vec::new())),
            responses: Arc::new(Mutex::new(VecDeque::new())),
            default_response: MockResponse::Accept,
            latency: None,
        }
    }

    /// Queue an answer for the next ingest call.
    #[must_use]
    pub fn with_response(self, response: MockResponse) -> Self {
        self.queue_response(response);
        self
    }

    /// Set the answer used when the queue is empty.
    #[must_use]
    pub fn with_default_response(mut self, response: MockResponse) -> Self {
        self.default_response = response;
        self
    }

    /// Delay every ingest call by `latency`.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Queue an answer for the next ingest call.
    pub fn queue_response(&self, response: MockResponse) {
        if let Ok(mut guard) = self.responses.lock() {
            guard.push_back(response);
        }
    }

    /// Get every batch received.
    #[must_use]
    pub fn batches(&self) -> Vec<Vec<WideEvent>> {
        self.batches.lock().map(|g| g.clone()).unwrap_or_default()
    }

    /// Get every event received, flattened across batches.
    #[must_use]
    pub fn events(&self) -> Vec<WideEvent> {
        self.batches
            .lock()
            .map(|g| g.iter().flatten().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of ingest calls made.
    #[must_use]
    pub fn batch_count(&self) -> usize {
        self.batches.lock().map(|g| g.len()).unwrap_or(0)
    }

    /// Number of events received across all batches.
    #[must_use]
    pub fn event_count(&self) -> usize {
        self.batches
            .lock()
            .map(|g| g.iter().map(Vec::len).sum())
            .unwrap_or(0)
    }

    /// Whether an event with the given trace ID was received.
    #[must_use]
    pub fn has_trace(&self, trace_id: &str) -> bool {
        self.batches
            .lock()
            .map(|g| g.iter().flatten().any(|e| e.trace_id == trace_id))
            .unwrap_or(false)
    }

    /// Wait until at least `count` events have arrived, polling every few
    /// milliseconds. Returns `false` on timeout.
    pub async fn wait_for_events(&self, count: usize, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, async {
            while self.event_count() < count {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .is_ok()
    }

    /// Clear all recorded batches.
    pub fn clear(&self) {
        if let Ok(mut guard) = self.batches.lock() {
            guard.clear();
        }
    }

    fn next_response(&self) -> MockResponse {
        self.responses
            .lock()
            .ok()
            .and_then(|mut g| g.pop_front())
            .unwrap_or_else(|| self.default_response.clone())
    }
}

impl Default for MockIngestClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IngestClient for MockIngestClient {
    async fn ingest(&self, batch: &[WideEvent]) -> TransportResult<()> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        if let Ok(mut guard) = self.batches.lock() {
            guard.push(batch.to_vec());
        }

        match self.next_response() {
            MockResponse::Accept => Ok(()),
            MockResponse::Reject { status, body } => Err(TransportError::Rejected {
                status,
                body,
                rate_limit_remaining: None,
            }),
        }
    }
}
