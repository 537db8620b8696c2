//! Test fixtures for common types.

use widelog_events::{RequestFields, ServiceInfo, UserContext, WideEvent};

/// Create the service identity used by fixtures.
#[must_use]
pub fn test_service() -> ServiceInfo {
    ServiceInfo::new("test-service")
        .with_version("1.0.0")
        .with_environment("test")
}

/// Create request fields for `GET /api/users`.
#[must_use]
pub fn test_request() -> RequestFields {
    RequestFields::new("GET", "/api/users")
        .with_ip("127.0.0.1")
        .with_user_agent("widelog-test")
}

/// Create an unremarkable event: status 200, no user, no error.
#[must_use]
pub fn test_event() -> WideEvent {
    let mut event = WideEvent::new(test_service());
    event.request.method = "GET".to_string();
    event.request.path = "/api/users".to_string();
    event
}

/// Create an unremarkable event with the given duration.
#[must_use]
pub fn event_with_duration(duration_ms: u64) -> WideEvent {
    let mut event = test_event();
    event.request.duration_ms = duration_ms;
    event
}

/// Create an event that completed with `status_code`, outcome included.
#[must_use]
pub fn event_with_status(status_code: u16) -> WideEvent {
    let mut event = test_event();
    event.set_status_code(status_code);
    event
}

/// Create an event for a user on the given subscription tier.
#[must_use]
pub fn event_with_subscription(subscription: impl Into<String>) -> WideEvent {
    let mut event = test_event();
    event.user = Some(UserContext::new("user-1").with_subscription(subscription));
    event
}

#[cfg(test)]
mod tests {
    use super::*;
    use widelog_events::Outcome;

    #[test]
    fn test_event_is_unremarkable() {
        let event = test_event();
        assert_eq!(event.request.status_code, 200);
        assert_eq!(event.outcome, Outcome::Success);
        assert!(event.user.is_none());
        assert!(event.error.is_none());
    }

    #[test]
    fn test_event_with_status_sets_outcome() {
        assert_eq!(event_with_status(404).outcome, Outcome::Warning);
        assert_eq!(event_with_status(503).outcome, Outcome::Error);
    }

    #[test]
    fn test_event_with_subscription() {
        let event = event_with_subscription("premium");
        assert_eq!(event.subscription(), Some("premium"));
    }
}
