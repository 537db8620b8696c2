//! Per-request completion handling.

use serde_json::{Map, Value};
use tracing::warn;
use widelog_events::{ErrorInfo, EventBuilder, Outcome};

use crate::logger::WideLogger;

/// A handler result that carries an HTTP status code.
pub trait ResponseStatus {
    /// The status code sent to the client.
    fn status_code(&self) -> u16;
}

impl ResponseStatus for u16 {
    fn status_code(&self) -> u16 {
        *self
    }
}

/// A response with no explicit status is a plain `200`.
impl ResponseStatus for () {
    fn status_code(&self) -> u16 {
        200
    }
}

impl<B> ResponseStatus for (u16, B) {
    fn status_code(&self) -> u16 {
        self.0
    }
}

/// Emits a request's event exactly once.
///
/// Call [`RequestGuard::complete`] on the normal path. If the guard is
/// dropped without it (the request future was cancelled, or the handler
/// panicked) the event is still finalized, sampled and queued: a panic is
/// recorded as an error, a cancellation as a warning with
/// `business.cancelled = true`.
pub struct RequestGuard {
    logger: WideLogger,
    builder: EventBuilder,
    completed: bool,
}

impl RequestGuard {
    pub(crate) fn new(logger: WideLogger, builder: EventBuilder) -> Self {
        Self {
            logger,
            builder,
            completed: false,
        }
    }

    /// Get the request's builder.
    pub fn builder(&mut self) -> &mut EventBuilder {
        &mut self.builder
    }

    /// Finalize, sample and queue the event. Returns whether it was kept.
    pub fn complete(mut self) -> bool {
        self.completed = true;
        self.logger.finish(&mut self.builder)
    }
}

impl Drop for RequestGuard {
    fn drop(&mut self) {
        if self.completed {
            return;
        }

        if std::thread::panicking() {
            self.builder
                .set_error_info(ErrorInfo::new("Panic", "request handler panicked"));
        } else {
            let mut cancelled = Map::new();
            cancelled.insert("cancelled".to_string(), Value::Bool(true));
            self.builder.merge_business(cancelled);
            self.builder
                .snapshot()
                .update(|event| event.outcome = event.outcome.escalate(Outcome::Warning));
        }

        let trace_id = self.builder.trace_id();
        warn!(%trace_id, "Request ended before completion, emitting its event anyway");
        self.logger.finish(&mut self.builder);
    }
}

impl std::fmt::Debug for RequestGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestGuard")
            .field("builder", &self.builder)
            .field("completed", &self.completed)
            .finish_non_exhaustive()
    }
}
