//! Task-local binding of the current request's event.

use std::future::Future;

use tokio::task::JoinHandle;
use tracing::{Instrument, warn};
use widelog_events::{ErrorInfo, SharedEvent, WideEvent};

use crate::enrichment::Enrichment;

tokio::task_local! {
    static CURRENT_EVENT: SharedEvent;
}

/// Run `body` with `event` bound as the current event.
///
/// The binding follows the future itself, across every `.await` and on
/// whichever worker thread polls it, so interleaved requests never see each
/// other's event. The body also runs inside a `wide_event` tracing span.
pub async fn run_with_event<F>(event: SharedEvent, body: F) -> F::Output
where
    F: Future,
{
    let span = event_span(&event);
    CURRENT_EVENT.scope(event, body).instrument(span).await
}

/// Synchronous counterpart of [`run_with_event`].
pub fn sync_run_with_event<R>(event: SharedEvent, body: impl FnOnce() -> R) -> R {
    CURRENT_EVENT.sync_scope(event, body)
}

/// Get the event bound by the nearest enclosing scope, if any.
#[must_use]
pub fn current_event() -> Option<SharedEvent> {
    CURRENT_EVENT.try_with(Clone::clone).ok()
}

/// Read the current event without cloning it.
pub fn with_current_event<R>(f: impl FnOnce(&WideEvent) -> R) -> Option<R> {
    CURRENT_EVENT.try_with(|event| event.read(f)).ok()
}

/// Trace id of the current event, for propagating to outbound calls.
#[must_use]
pub fn current_trace_id() -> Option<String> {
    with_current_event(|event| event.trace_id.clone())
}

/// Merge `partial` into the current event. Outside a scope this is a no-op.
pub fn enrich(partial: Enrichment) {
    match current_event() {
        Some(event) => event.update(|e| partial.apply_to(e)),
        None => dropped("enrich"),
    }
}

/// Capture an error on the current event. Outside a scope this is a no-op.
pub fn set_error<E>(error: &E, retriable: bool)
where
    E: std::error::Error + ?Sized,
{
    set_error_info(ErrorInfo::from_error(error).with_retriable(retriable));
}

/// Record pre-built error info on the current event. Outside a scope this is
/// a no-op.
pub fn set_error_info(error: ErrorInfo) {
    match current_event() {
        Some(event) => event.update(|e| e.set_error(error)),
        None => dropped("set_error"),
    }
}

/// Carry the current binding into `future`.
///
/// Tasks handed to `tokio::spawn` do not inherit task-locals; wrap them with
/// this to keep enriching the same event. Without a current event the
/// future is returned as is.
pub fn in_scope<F>(future: F) -> impl Future<Output = F::Output>
where
    F: Future,
{
    let current = current_event();
    async move {
        match current {
            Some(event) => CURRENT_EVENT.scope(event, future).await,
            None => future.await,
        }
    }
}

/// Spawn `future` on the tokio runtime with the current binding attached.
pub fn spawn_in_scope<F>(future: F) -> JoinHandle<F::Output>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    tokio::spawn(in_scope(future))
}

/// Create a tracing span correlated with `event`.
#[must_use]
pub fn event_span(event: &SharedEvent) -> tracing::Span {
    event.read(|e| {
        tracing::info_span!(
            "wide_event",
            event_id = %e.event_id,
            trace_id = %e.trace_id,
        )
    })
}

fn dropped(operation: &'static str) {
    if cfg!(debug_assertions) {
        warn!(operation, "No wide event in scope, data dropped");
    }
}
