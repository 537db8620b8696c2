//! The per-process logger tying builder, context, sampling and transport
//! together.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tracing::debug;
use widelog_config::{ResolvedConfig, WideLogConfig};
use widelog_context::run_with_event;
use widelog_events::{ErrorInfo, EventBuilder, RequestFields, ServiceInfo};
use widelog_sampling::{Sampler, SharedSampler, TailSampler};
use widelog_transport::{IngestClient, Transport, TransportConfig, TransportResult};

use crate::config_bridge;
use crate::error::WideLogResult;
use crate::request::{RequestGuard, ResponseStatus};

/// Emits one wide event per request.
///
/// Cloning is cheap; clones share the sampler and the transport queue.
#[derive(Clone)]
pub struct WideLogger {
    inner: Arc<LoggerInner>,
}

struct LoggerInner {
    service: ServiceInfo,
    sampler: SharedSampler,
    transport: Transport,
    serverless: bool,
}

impl WideLogger {
    /// Create a logger with the default sampling rule and HTTP delivery.
    #[must_use]
    pub fn new(config: &ResolvedConfig) -> Self {
        Self::builder(config).build()
    }

    /// Resolve `config` against the process environment and create a
    /// logger.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be resolved.
    pub fn from_config(config: WideLogConfig) -> WideLogResult<Self> {
        let resolved = config.resolve_from_env()?;
        Ok(Self::new(&resolved))
    }

    /// Start building a logger with custom parts.
    #[must_use]
    pub fn builder(config: &ResolvedConfig) -> WideLoggerBuilder {
        WideLoggerBuilder {
            service: config_bridge::to_service_info(&config.service),
            sampler: SharedSampler::new(TailSampler::new(config_bridge::to_sampling_options(
                &config.sampling,
            ))),
            target: config_bridge::to_ingest_target(&config.ingest),
            transport_config: config_bridge::to_transport_config(config),
            client: None,
            serverless: config.serverless,
        }
    }

    /// Get the service identity stamped on every event.
    #[must_use]
    pub fn service(&self) -> &ServiceInfo {
        &self.inner.service
    }

    /// Get the transport.
    #[must_use]
    pub fn transport(&self) -> &Transport {
        &self.inner.transport
    }

    /// Whether completed requests flush inline.
    #[must_use]
    pub fn is_serverless(&self) -> bool {
        self.inner.serverless
    }

    /// Create a builder for a new request and populate its request fields.
    #[must_use]
    pub fn start_request(&self, fields: RequestFields) -> EventBuilder {
        let mut builder = EventBuilder::create(self.inner.service.clone());
        builder.set_request(fields);
        builder
    }

    /// Start a request whose event is emitted when the returned guard is
    /// completed or dropped.
    #[must_use]
    pub fn track(&self, fields: RequestFields) -> RequestGuard {
        RequestGuard::new(self.clone(), self.start_request(fields))
    }

    /// Finalize the event, sample it and queue it if kept.
    ///
    /// Returns whether the event was kept.
    pub fn finish(&self, builder: &mut EventBuilder) -> bool {
        let event = builder.finalize();
        let kept = self.inner.sampler.should_keep(&event);

        debug!(
            event_id = %event.event_id,
            trace_id = %event.trace_id,
            outcome = event.outcome.as_str(),
            status_code = event.request.status_code,
            duration_ms = event.request.duration_ms,
            kept,
            "Wide event finalized"
        );

        if kept {
            self.inner.transport.enqueue(event);
        }
        kept
    }

    /// Run `handler` as one request.
    ///
    /// The handler runs with the request's event bound as the current
    /// event, so anything it calls can enrich it. On `Ok` the response
    /// status is recorded; on `Err` the error is captured and returned
    /// unchanged. The event is then finalized, sampled and queued. In
    /// serverless mode the queue is flushed before returning.
    ///
    /// If the returned future is dropped before completion, or the handler
    /// panics, the event is still emitted.
    pub async fn instrument<F, Fut, T, E>(&self, fields: RequestFields, handler: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        T: ResponseStatus,
        E: std::error::Error,
    {
        let mut guard = self.track(fields);
        let event = guard.builder().snapshot();

        let result = match AssertUnwindSafe(run_with_event(event, async move { handler().await }))
            .catch_unwind()
            .await
        {
            Ok(result) => result,
            Err(panic) => {
                guard
                    .builder()
                    .set_error_info(ErrorInfo::new("Panic", panic_message(panic.as_ref())));
                guard.complete();
                if self.inner.serverless {
                    let _ = self.flush().await;
                }
                std::panic::resume_unwind(panic);
            },
        };

        match &result {
            Ok(response) => {
                guard.builder().set_status_code(response.status_code());
            },
            Err(error) => {
                guard.builder().set_error(error, false);
            },
        }
        guard.complete();

        if self.inner.serverless {
            // Failures are logged by the transport and never reach the caller.
            let _ = self.flush().await;
        }

        result
    }

    /// Deliver everything queued.
    ///
    /// # Errors
    ///
    /// Returns the delivery error for diagnostics; it has already been
    /// logged.
    pub async fn flush(&self) -> TransportResult<usize> {
        self.inner.transport.flush().await
    }

    /// Flush whatever is left before the process exits.
    ///
    /// # Errors
    ///
    /// Returns the delivery error for diagnostics; it has already been
    /// logged.
    pub async fn shutdown(&self) -> TransportResult<usize> {
        self.inner.transport.shutdown().await
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "request handler panicked".to_string())
}

impl std::fmt::Debug for WideLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WideLogger")
            .field("service", &self.inner.service.name)
            .field("transport", &self.inner.transport)
            .field("serverless", &self.inner.serverless)
            .finish_non_exhaustive()
    }
}

/// Builder for [`WideLogger`].
#[must_use]
pub struct WideLoggerBuilder {
    service: ServiceInfo,
    sampler: SharedSampler,
    target: widelog_transport::IngestTarget,
    transport_config: TransportConfig,
    client: Option<Arc<dyn IngestClient>>,
    serverless: bool,
}

impl WideLoggerBuilder {
    /// Replace the default sampling rule entirely.
    pub fn with_sampler<S>(mut self, sampler: S) -> Self
    where
        S: Sampler + 'static,
    {
        self.sampler = SharedSampler::new(sampler);
        self
    }

    /// Deliver through `client` instead of the configured HTTP endpoint.
    pub fn with_client(mut self, client: Arc<dyn IngestClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Override the batching configuration.
    pub fn with_transport_config(mut self, config: TransportConfig) -> Self {
        self.transport_config = config;
        self
    }

    /// Override serverless mode.
    pub fn with_serverless(mut self, serverless: bool) -> Self {
        self.serverless = serverless;
        self
    }

    /// Build the logger.
    #[must_use]
    pub fn build(self) -> WideLogger {
        let transport = match self.client {
            Some(client) => Transport::new(client, self.transport_config),
            None => Transport::for_target(&self.target, self.transport_config),
        };

        debug!(
            service = %self.service.name,
            enabled = transport.is_enabled(),
            serverless = self.serverless,
            "Wide logger ready"
        );

        WideLogger {
            inner: Arc::new(LoggerInner {
                service: self.service,
                sampler: self.sampler,
                transport,
                serverless: self.serverless,
            }),
        }
    }
}

impl std::fmt::Debug for WideLoggerBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WideLoggerBuilder")
            .field("service", &self.service.name)
            .field("dataset", &self.target.dataset)
            .field("custom_client", &self.client.is_some())
            .field("serverless", &self.serverless)
            .finish_non_exhaustive()
    }
}
