//! Per-request event builder.

use std::collections::HashMap;
use std::time::Instant;

use serde_json::{Map, Value};

use crate::event::{ErrorInfo, PerformanceMetrics, ServiceInfo, UserContext, WideEvent};
use crate::shared::SharedEvent;

/// Inbound headers checked, in order, for an upstream correlation id.
pub const CORRELATION_HEADERS: &[&str] = &["x-request-id", "x-correlation-id", "x-trace-id"];

/// W3C trace context header.
pub const TRACEPARENT_HEADER: &str = "traceparent";

/// Normalized request facts supplied by a framework adapter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestFields {
    /// HTTP method.
    pub method: String,
    /// Request path without query string.
    pub path: String,
    /// Parsed query parameters.
    pub query: Option<HashMap<String, String>>,
    /// Client IP.
    pub ip: Option<String>,
    /// Client user agent.
    pub user_agent: Option<String>,
    /// Upstream correlation id, replaces the generated trace id when set.
    pub correlation_id: Option<String>,
}

impl RequestFields {
    /// Create request fields for a method and path.
    #[must_use]
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            ..Default::default()
        }
    }

    /// Set the query parameters.
    #[must_use]
    pub fn with_query(mut self, query: HashMap<String, String>) -> Self {
        self.query = Some(query);
        self
    }

    /// Set the client IP.
    #[must_use]
    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip = Some(ip.into());
        self
    }

    /// Set the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Set the correlation id explicitly.
    #[must_use]
    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }

    /// Fill the correlation id from inbound headers unless one was set
    /// explicitly.
    #[must_use]
    pub fn with_correlation_from_headers<'a, I>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        if self.correlation_id.is_none() {
            self.correlation_id = Self::correlation_from_headers(headers);
        }
        self
    }

    /// Find an upstream correlation id in a header list.
    ///
    /// Header names are matched case-insensitively. The dedicated correlation
    /// headers win over `traceparent`, whose trace-id segment is used as a
    /// fallback.
    #[must_use]
    pub fn correlation_from_headers<'a, I>(headers: I) -> Option<String>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut by_name: HashMap<String, &str> = HashMap::new();
        for (name, value) in headers {
            let value = value.trim();
            if !value.is_empty() {
                by_name.entry(name.to_ascii_lowercase()).or_insert(value);
            }
        }

        CORRELATION_HEADERS
            .iter()
            .find_map(|name| by_name.get(*name))
            .map(|v| (*v).to_string())
            .or_else(|| {
                by_name
                    .get(TRACEPARENT_HEADER)
                    .and_then(|tp| parse_traceparent(tp))
            })
    }
}

/// Extract the trace-id segment of a `traceparent` value
/// (`version-traceid-parentid-flags`).
fn parse_traceparent(value: &str) -> Option<String> {
    let mut parts = value.split('-');
    let _version = parts.next()?;
    let trace_id = parts.next()?;
    let valid = trace_id.len() == 32
        && trace_id.bytes().all(|b| b.is_ascii_hexdigit())
        && trace_id.bytes().any(|b| b != b'0');
    valid.then(|| trace_id.to_ascii_lowercase())
}

/// Owns one request's event from creation to finalization.
///
/// The builder is the route through which request and response facts enter
/// the event; application code enriches the same event through the context
/// handle returned by [`EventBuilder::snapshot`]. None of the operations fail.
#[derive(Debug)]
pub struct EventBuilder {
    event: SharedEvent,
    started_at: Instant,
    duration_ms: Option<u64>,
}

impl EventBuilder {
    /// Create a builder around a fresh event for `service`.
    #[must_use]
    pub fn create(service: ServiceInfo) -> Self {
        Self {
            event: SharedEvent::new(WideEvent::new(service)),
            started_at: Instant::now(),
            duration_ms: None,
        }
    }

    /// Overwrite the request sub-object. Only the last call's values survive.
    pub fn set_request(&mut self, fields: RequestFields) -> &mut Self {
        self.event.update(|event| {
            event.request.method = fields.method;
            event.request.path = fields.path;
            event.request.query = fields.query;
            event.request.ip = fields.ip;
            event.request.user_agent = fields.user_agent;
            if let Some(correlation_id) = fields.correlation_id {
                event.trace_id = correlation_id;
            }
        });
        self
    }

    /// Replace the user context wholesale.
    pub fn set_user(&mut self, user: UserContext) -> &mut Self {
        self.event.update(|event| event.user = Some(user));
        self
    }

    /// Merge business context key by key.
    pub fn merge_business(&mut self, partial: Map<String, Value>) -> &mut Self {
        self.event.update(|event| event.merge_business(partial));
        self
    }

    /// Merge performance counters key by key.
    pub fn merge_performance(&mut self, partial: PerformanceMetrics) -> &mut Self {
        self.event.update(|event| event.merge_performance(partial));
        self
    }

    /// Merge feature flags key by key.
    pub fn merge_feature_flags(&mut self, partial: HashMap<String, bool>) -> &mut Self {
        self.event.update(|event| event.merge_feature_flags(partial));
        self
    }

    /// Capture an error and force the outcome to error.
    pub fn set_error<E>(&mut self, error: &E, retriable: bool) -> &mut Self
    where
        E: std::error::Error + ?Sized,
    {
        self.set_error_info(ErrorInfo::from_error(error).with_retriable(retriable))
    }

    /// Record pre-built error info and force the outcome to error.
    pub fn set_error_info(&mut self, error: ErrorInfo) -> &mut Self {
        self.event.update(|event| event.set_error(error));
        self
    }

    /// Record the response status and escalate the outcome.
    pub fn set_status_code(&mut self, status_code: u16) -> &mut Self {
        self.event.update(|event| event.set_status_code(status_code));
        self
    }

    /// Stamp the duration and return the finished event.
    ///
    /// The duration is measured on the first call only; later calls return
    /// the event with the original duration.
    pub fn finalize(&mut self) -> WideEvent {
        let duration_ms = *self.duration_ms.get_or_insert_with(|| {
            u64::try_from(self.started_at.elapsed().as_millis()).unwrap_or(u64::MAX)
        });
        self.event.update(|event| {
            event.request.duration_ms = duration_ms;
            event.clone()
        })
    }

    /// Whether [`EventBuilder::finalize`] has run.
    #[must_use]
    pub fn is_finalized(&self) -> bool {
        self.duration_ms.is_some()
    }

    /// Get the live event handle, for installing into a request scope.
    #[must_use]
    pub fn snapshot(&self) -> SharedEvent {
        self.event.clone()
    }

    /// Get the event id.
    #[must_use]
    pub fn event_id(&self) -> String {
        self.event.read(|event| event.event_id.clone())
    }

    /// Get the current trace id.
    #[must_use]
    pub fn trace_id(&self) -> String {
        self.event.read(|event| event.trace_id.clone())
    }
}
