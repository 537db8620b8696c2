//! The wide event record and its sub-objects.

use std::collections::HashMap;
use std::fmt::Write as _;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Request outcome, ordered by severity.
///
/// Outcomes only ever move up the order `Success < Warning < Error` during
/// a request; see [`Outcome::escalate`].
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// Request completed normally.
    #[default]
    Success,
    /// Request completed with a client-side problem (4xx).
    Warning,
    /// Request failed.
    Error,
}

impl Outcome {
    /// Return the more severe of `self` and `other`.
    #[must_use]
    pub fn escalate(self, other: Self) -> Self {
        self.max(other)
    }

    /// Get the wire name of this outcome.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Facts about the inbound request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestInfo {
    /// HTTP method, `"UNKNOWN"` until populated.
    pub method: String,
    /// Request path, `"/"` until populated.
    pub path: String,
    /// Parsed query string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<HashMap<String, String>>,
    /// Wall-clock duration, stamped once at finalization.
    pub duration_ms: u64,
    /// Response status code.
    pub status_code: u16,
    /// Client IP address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    /// Client user agent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl Default for RequestInfo {
    fn default() -> Self {
        Self {
            method: "UNKNOWN".to_string(),
            path: "/".to_string(),
            query: None,
            duration_ms: 0,
            status_code: 200,
            ip: None,
            user_agent: None,
        }
    }
}

/// Identity of the service emitting the event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInfo {
    /// Service name.
    pub name: String,
    /// Deployed version.
    pub version: String,
    /// Environment name (e.g. `production`).
    pub environment: String,
    /// Hosting region.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Deployment identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment_id: Option<String>,
}

impl ServiceInfo {
    /// Create service info with the given name and placeholder version/environment.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: "unknown".to_string(),
            environment: "development".to_string(),
            region: None,
            deployment_id: None,
        }
    }

    /// Set the version.
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Set the environment.
    #[must_use]
    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into();
        self
    }

    /// Set the region.
    #[must_use]
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Set the deployment identifier.
    #[must_use]
    pub fn with_deployment_id(mut self, deployment_id: impl Into<String>) -> Self {
        self.deployment_id = Some(deployment_id.into());
        self
    }
}

/// Identity and subscription context of the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserContext {
    /// User identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Email address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Subscription tier (e.g. `enterprise`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription: Option<String>,
    /// Account age in days.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_age_days: Option<u64>,
    /// Lifetime value in cents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lifetime_value_cents: Option<u64>,
    /// Any other user attributes.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserContext {
    /// Create a user context with the given identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Default::default()
        }
    }

    /// Set the email.
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Set the subscription tier.
    #[must_use]
    pub fn with_subscription(mut self, subscription: impl Into<String>) -> Self {
        self.subscription = Some(subscription.into());
        self
    }

    /// Set the account age.
    #[must_use]
    pub fn with_account_age_days(mut self, days: u64) -> Self {
        self.account_age_days = Some(days);
        self
    }

    /// Set the lifetime value.
    #[must_use]
    pub fn with_lifetime_value_cents(mut self, cents: u64) -> Self {
        self.lifetime_value_cents = Some(cents);
        self
    }

    /// Add an extra attribute.
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Merge `other` into `self` field by field. Fields absent from `other`
    /// are left untouched.
    pub fn merge(&mut self, other: Self) {
        merge_option(&mut self.id, other.id);
        merge_option(&mut self.email, other.email);
        merge_option(&mut self.subscription, other.subscription);
        merge_option(&mut self.account_age_days, other.account_age_days);
        merge_option(&mut self.lifetime_value_cents, other.lifetime_value_cents);
        self.extra.extend(other.extra);
    }
}

/// Per-request performance counters.
///
/// Values are carried as given; merging overwrites per key and never sums.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// Number of database queries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_queries: Option<u64>,
    /// Time spent in the database.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_duration_ms: Option<f64>,
    /// Number of outbound calls.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_calls: Option<u64>,
    /// Cache hits.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_hits: Option<u64>,
    /// Cache misses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_misses: Option<u64>,
}

impl PerformanceMetrics {
    /// Set the database query count.
    #[must_use]
    pub fn with_db_queries(mut self, count: u64) -> Self {
        self.db_queries = Some(count);
        self
    }

    /// Set the database time.
    #[must_use]
    pub fn with_db_duration_ms(mut self, ms: f64) -> Self {
        self.db_duration_ms = Some(ms);
        self
    }

    /// Set the outbound call count.
    #[must_use]
    pub fn with_external_calls(mut self, count: u64) -> Self {
        self.external_calls = Some(count);
        self
    }

    /// Set the cache hit count.
    #[must_use]
    pub fn with_cache_hits(mut self, count: u64) -> Self {
        self.cache_hits = Some(count);
        self
    }

    /// Set the cache miss count.
    #[must_use]
    pub fn with_cache_misses(mut self, count: u64) -> Self {
        self.cache_misses = Some(count);
        self
    }

    /// Merge `other` into `self`, overwriting only the counters `other` carries.
    pub fn merge(&mut self, other: Self) {
        merge_option(&mut self.db_queries, other.db_queries);
        merge_option(&mut self.db_duration_ms, other.db_duration_ms);
        merge_option(&mut self.external_calls, other.external_calls);
        merge_option(&mut self.cache_hits, other.cache_hits);
        merge_option(&mut self.cache_misses, other.cache_misses);
    }
}

fn merge_option<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}

/// Error captured during request handling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Error type name.
    #[serde(rename = "type")]
    pub error_type: String,
    /// Human-readable message.
    pub message: String,
    /// Application error code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Rendered cause chain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    /// Whether the caller may retry.
    pub retriable: bool,
}

impl ErrorInfo {
    /// Create error info from a type name and message.
    #[must_use]
    pub fn new(error_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_type: error_type.into(),
            message: message.into(),
            code: None,
            stack: None,
            retriable: false,
        }
    }

    /// Capture an error value.
    ///
    /// The type is the concrete type's short name (`"Error"` for trait
    /// objects) and the stack is the `source()` chain, one cause per line.
    #[must_use]
    pub fn from_error<E>(error: &E) -> Self
    where
        E: std::error::Error + ?Sized,
    {
        let mut stack = String::new();
        let mut source = error.source();
        while let Some(cause) = source {
            if !stack.is_empty() {
                stack.push('\n');
            }
            let _ = write!(stack, "caused by: {cause}");
            source = cause.source();
        }

        Self {
            error_type: short_type_name::<E>().to_string(),
            message: error.to_string(),
            code: None,
            stack: (!stack.is_empty()).then_some(stack),
            retriable: false,
        }
    }

    /// Set the error code.
    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Set the retriable flag.
    #[must_use]
    pub fn with_retriable(mut self, retriable: bool) -> Self {
        self.retriable = retriable;
        self
    }
}

fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    if full.starts_with("dyn ") {
        return "Error";
    }
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// One structured record describing an entire request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WideEvent {
    /// Unique event identifier.
    pub event_id: String,
    /// Correlation identifier shared across services.
    pub trace_id: String,
    /// Creation instant, RFC 3339 with millisecond precision.
    pub timestamp: String,
    /// Inbound request facts.
    pub request: RequestInfo,
    /// Emitting service.
    pub service: ServiceInfo,
    /// Caller identity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserContext>,
    /// Open-ended business context.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business: Option<Map<String, Value>>,
    /// Performance counters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performance: Option<PerformanceMetrics>,
    /// Captured error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
    /// Feature flag evaluations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_flags: Option<HashMap<String, bool>>,
    /// Request outcome.
    pub outcome: Outcome,
}

impl WideEvent {
    /// Create a fresh event for the given service, stamped with `now`.
    #[must_use]
    pub fn new(service: ServiceInfo) -> Self {
        Self::new_at(service, Utc::now())
    }

    /// Create a fresh event stamped with an explicit creation instant.
    #[must_use]
    pub fn new_at(service: ServiceInfo, created_at: DateTime<Utc>) -> Self {
        Self {
            event_id: Uuid::new_v4().to_string(),
            trace_id: generate_trace_id(),
            timestamp: created_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            request: RequestInfo::default(),
            service,
            user: None,
            business: None,
            performance: None,
            error: None,
            feature_flags: None,
            outcome: Outcome::Success,
        }
    }

    /// Shallow-merge business context, key by key.
    pub fn merge_business(&mut self, partial: Map<String, Value>) {
        self.business.get_or_insert_with(Map::new).extend(partial);
    }

    /// Merge performance counters, key by key.
    pub fn merge_performance(&mut self, partial: PerformanceMetrics) {
        self.performance
            .get_or_insert_with(PerformanceMetrics::default)
            .merge(partial);
    }

    /// Merge feature flag evaluations, key by key.
    pub fn merge_feature_flags(&mut self, partial: HashMap<String, bool>) {
        self.feature_flags
            .get_or_insert_with(HashMap::new)
            .extend(partial);
    }

    /// Merge user context field by field, creating it if absent.
    pub fn merge_user(&mut self, partial: UserContext) {
        match &mut self.user {
            Some(user) => user.merge(partial),
            None => self.user = Some(partial),
        }
    }

    /// Record an error. Forces the outcome to [`Outcome::Error`].
    pub fn set_error(&mut self, error: ErrorInfo) {
        self.outcome = Outcome::Error;
        self.error = Some(error);
    }

    /// Record the response status and escalate the outcome.
    ///
    /// `>= 500` escalates to error, `400..=499` to warning; lower codes
    /// leave the outcome as is.
    pub fn set_status_code(&mut self, status_code: u16) {
        self.request.status_code = status_code;
        let implied = match status_code {
            500..=u16::MAX => Outcome::Error,
            400..=499 => Outcome::Warning,
            _ => Outcome::Success,
        };
        self.outcome = self.outcome.escalate(implied);
    }

    /// Whether an error was recorded or the outcome is error.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.outcome == Outcome::Error || self.error.is_some()
    }

    /// Subscription tier of the user, if known.
    #[must_use]
    pub fn subscription(&self) -> Option<&str> {
        self.user.as_ref().and_then(|u| u.subscription.as_deref())
    }
}

/// Generate a 32-hex-digit trace identifier.
#[must_use]
pub fn generate_trace_id() -> String {
    Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event() -> WideEvent {
        WideEvent::new(ServiceInfo::new("checkout"))
    }

    #[test]
    fn test_new_event_defaults() {
        let event = event();
        assert_eq!(event.request.method, "UNKNOWN");
        assert_eq!(event.request.path, "/");
        assert_eq!(event.request.status_code, 200);
        assert_eq!(event.request.duration_ms, 0);
        assert_eq!(event.outcome, Outcome::Success);
        assert_eq!(event.trace_id.len(), 32);
        assert_ne!(event.event_id, event.trace_id);
        assert!(event.timestamp.ends_with('Z'));
    }

    #[test]
    fn test_outcome_ordering() {
        assert!(Outcome::Success < Outcome::Warning);
        assert!(Outcome::Warning < Outcome::Error);
        assert_eq!(Outcome::Error.escalate(Outcome::Success), Outcome::Error);
        assert_eq!(Outcome::Success.escalate(Outcome::Warning), Outcome::Warning);
    }

    #[test]
    fn test_status_code_escalation() {
        let mut event = event();
        event.set_status_code(404);
        assert_eq!(event.outcome, Outcome::Warning);

        event.set_status_code(503);
        assert_eq!(event.outcome, Outcome::Error);

        event.set_status_code(200);
        assert_eq!(event.outcome, Outcome::Error);
        assert_eq!(event.request.status_code, 200);

        event.set_status_code(418);
        assert_eq!(event.outcome, Outcome::Error);
    }

    #[test]
    fn test_status_below_400_keeps_success() {
        let mut event = event();
        event.set_status_code(302);
        assert_eq!(event.outcome, Outcome::Success);
    }

    #[test]
    fn test_merge_business_is_last_write_wins() {
        let mut event = event();
        let first = json!({"cart_id": "c1", "items": 3});
        let second = json!({"items": 4, "coupon": "SAVE10"});
        event.merge_business(first.as_object().cloned().unwrap());
        event.merge_business(second.as_object().cloned().unwrap());

        let business = event.business.unwrap();
        assert_eq!(business.get("cart_id"), Some(&json!("c1")));
        assert_eq!(business.get("items"), Some(&json!(4)));
        assert_eq!(business.get("coupon"), Some(&json!("SAVE10")));
    }

    #[test]
    fn test_merge_performance_overwrites_without_summing() {
        let mut event = event();
        event.merge_performance(
            PerformanceMetrics::default()
                .with_db_queries(2)
                .with_cache_hits(1),
        );
        event.merge_performance(PerformanceMetrics::default().with_db_queries(5));

        let perf = event.performance.unwrap();
        assert_eq!(perf.db_queries, Some(5));
        assert_eq!(perf.cache_hits, Some(1));
        assert_eq!(perf.cache_misses, None);
    }

    #[test]
    fn test_merge_feature_flags() {
        let mut event = event();
        event.merge_feature_flags(HashMap::from([
            ("new_checkout".to_string(), true),
            ("dark_mode".to_string(), false),
        ]));
        event.merge_feature_flags(HashMap::from([("dark_mode".to_string(), true)]));

        let flags = event.feature_flags.unwrap();
        assert_eq!(flags.len(), 2);
        assert_eq!(flags.get("new_checkout"), Some(&true));
        assert_eq!(flags.get("dark_mode"), Some(&true));
    }

    #[test]
    fn test_merge_user_preserves_fields() {
        let mut event = event();
        event.merge_user(UserContext::new("u1").with_subscription("free"));
        event.merge_user(
            UserContext::default()
                .with_subscription("premium")
                .with_attribute("team", "core"),
        );

        let user = event.user.unwrap();
        assert_eq!(user.id.as_deref(), Some("u1"));
        assert_eq!(user.subscription.as_deref(), Some("premium"));
        assert_eq!(user.extra.get("team"), Some(&json!("core")));
    }

    #[derive(Debug, thiserror::Error)]
    #[error("db timeout")]
    struct DbTimeout {
        #[source]
        source: std::io::Error,
    }

    #[test]
    fn test_error_info_from_error() {
        let err = DbTimeout {
            source: std::io::Error::new(std::io::ErrorKind::TimedOut, "socket stalled"),
        };
        let info = ErrorInfo::from_error(&err);
        assert_eq!(info.error_type, "DbTimeout");
        assert_eq!(info.message, "db timeout");
        assert_eq!(info.stack.as_deref(), Some("caused by: socket stalled"));
        assert!(!info.retriable);

        let boxed: Box<dyn std::error::Error> = Box::new(err);
        let info = ErrorInfo::from_error(boxed.as_ref());
        assert_eq!(info.error_type, "Error");
    }

    #[test]
    fn test_set_error_forces_error_outcome() {
        let mut event = event();
        event.set_status_code(404);
        event.set_error(ErrorInfo::new("Error", "boom").with_code("E42"));
        assert_eq!(event.outcome, Outcome::Error);
        assert_eq!(event.error.as_ref().and_then(|e| e.code.as_deref()), Some("E42"));
        assert!(event.is_error());
    }

    #[test]
    fn test_serialization_shape() {
        let mut event = event();
        event.set_error(ErrorInfo::new("Error", "boom"));
        let value = serde_json::to_value(&event).unwrap();

        assert_eq!(value["outcome"], json!("error"));
        assert_eq!(value["error"]["type"], json!("Error"));
        assert_eq!(value["request"]["status_code"], json!(200));
        assert!(value.get("user").is_none());
        assert!(value["request"].get("query").is_none());

        let parsed: WideEvent = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, event);
    }
}
