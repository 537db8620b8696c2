//! Widelog - One structured, tail-sampled record per request.
//!
//! Instead of scattering many log lines across a request, code anywhere in
//! the request enriches a single wide event. When the request completes the
//! event is finalized, a tail-sampling rule decides whether to keep it, and
//! kept events are shipped in batches to a telemetry backend.
//!
//! This crate is the entry point for framework glue. It re-exports the
//! pieces from the other widelog crates and ties them together in
//! [`WideLogger`].
//!
//! # Example
//!
//! ```rust,no_run
//! use widelog::{Enrichment, RequestFields, WideLogConfig, WideLogger, enrich};
//!
//! # #[derive(Debug)]
//! # struct AppError;
//! # impl std::fmt::Display for AppError {
//! #     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str("app") }
//! # }
//! # impl std::error::Error for AppError {}
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let logger = WideLogger::from_config(WideLogConfig::new("checkout"))?;
//!
//! let fields = RequestFields::new("POST", "/api/orders")
//!     .with_correlation_from_headers([("x-request-id", "req-42")]);
//!
//! let status = logger
//!     .instrument(fields, || async {
//!         enrich(Enrichment::new().with_business("order_total_cents", 4_999));
//!         Ok::<u16, AppError>(201)
//!     })
//!     .await?;
//! assert_eq!(status, 201);
//!
//! logger.shutdown().await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Crates
//!
//! - `widelog-events`: the event record and its builder
//! - `widelog-context`: request-scoped access to the current event
//! - `widelog-sampling`: keep/drop rules
//! - `widelog-transport`: batching and delivery
//! - `widelog-config`: settings with environment fallbacks
//! - `widelog-telemetry`: diagnostic logging setup

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod config_bridge;
pub mod prelude;

mod error;
mod logger;
mod request;

pub use error::{WideLogError, WideLogResult};
pub use logger::{WideLogger, WideLoggerBuilder};
pub use request::{RequestGuard, ResponseStatus};

pub use widelog_config::{ConfigError, ResolvedConfig, WideLogConfig};
pub use widelog_context::{
    Enrichment, current_event, current_trace_id, enrich, in_scope, run_with_event, set_error,
    set_error_info, spawn_in_scope, with_current_event,
};
pub use widelog_events::{
    ErrorInfo, EventBuilder, Outcome, PerformanceMetrics, RequestFields, RequestInfo, ServiceInfo,
    UserContext, WideEvent,
};
pub use widelog_sampling::{
    KeepAll, KeepOnlyErrors, Sampler, SamplingOptions, TailSampler, keep_all, keep_only_errors,
    should_keep,
};
pub use widelog_telemetry::{LogConfig, LogFormat, LogTarget, TelemetryError};
pub use widelog_transport::{
    HttpIngestClient, IngestClient, IngestTarget, Transport, TransportConfig, TransportError,
    TransportResult,
};

/// Install diagnostic logging from the `[logging]` section of `config`.
///
/// With `debug` set, events mirrored under `widelog::mirror` are shown at
/// `info` regardless of the configured level.
///
/// # Errors
///
/// Returns an error for an invalid format or directive, or if a global
/// subscriber is already installed.
pub fn init_logging(config: &ResolvedConfig) -> WideLogResult<()> {
    let log_config = config_bridge::to_diagnostics_config(config)?;
    widelog_telemetry::setup_logging(&log_config)?;
    Ok(())
}
