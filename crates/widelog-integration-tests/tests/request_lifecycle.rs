//! End-to-end request handling through the `WideLogger` facade.

mod common;

use common::{HandlerError, LoggerHarness};
use widelog::{
    Enrichment, Outcome, PerformanceMetrics, RequestFields, UserContext, current_trace_id, enrich,
};

async fn load_user(id: &str) -> Result<String, HandlerError> {
    enrich(
        Enrichment::new()
            .with_user(UserContext::new(id).with_subscription("free"))
            .with_performance(PerformanceMetrics::default().with_db_queries(1)),
    );
    tokio::task::yield_now().await;
    Ok(format!("user {id}"))
}

async fn apply_discount() {
    enrich(
        Enrichment::new()
            .with_business("discount_code", "SPRING")
            .with_feature_flag("new_checkout", true)
            .with_performance(PerformanceMetrics::default().with_cache_hits(3)),
    );
}

#[tokio::test]
async fn test_failed_request_is_captured_and_kept() {
    let harness = LoggerHarness::new();

    let result: Result<u16, HandlerError> = harness
        .logger
        .instrument(RequestFields::new("GET", "/api/users"), || async {
            Err(HandlerError("db timeout"))
        })
        .await;

    // The handler's error comes back unchanged.
    assert_eq!(result.unwrap_err().0, "db timeout");

    // Exactly one event reached the queue, despite a zero sample rate.
    assert_eq!(harness.logger.transport().pending(), 1);
    assert_eq!(harness.logger.flush().await.unwrap(), 1);

    let batches = harness.client.batches();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].len(), 1);

    let event = &batches[0][0];
    assert_eq!(event.request.method, "GET");
    assert_eq!(event.request.path, "/api/users");
    assert_eq!(event.outcome, Outcome::Error);
    let error = event.error.as_ref().unwrap();
    assert_eq!(error.message, "db timeout");
    assert!(!error.retriable);
}

#[tokio::test]
async fn test_enrichment_from_nested_calls_is_merged() {
    let harness = LoggerHarness::keep_all();

    let body = harness
        .logger
        .instrument(RequestFields::new("POST", "/api/checkout"), || async {
            let user = load_user("u-7").await?;
            apply_discount().await;
            enrich(
                Enrichment::new()
                    .with_user(UserContext::default().with_email("u7@example.com"))
                    .with_performance(PerformanceMetrics::default().with_db_queries(2)),
            );
            Ok::<_, HandlerError>((201_u16, user))
        })
        .await
        .unwrap();
    assert_eq!(body.1, "user u-7");

    harness.logger.flush().await.unwrap();
    let event = &harness.client.events()[0];

    assert_eq!(event.request.status_code, 201);
    assert_eq!(event.outcome, Outcome::Success);

    let user = event.user.as_ref().unwrap();
    assert_eq!(user.id.as_deref(), Some("u-7"));
    assert_eq!(user.subscription.as_deref(), Some("free"));
    assert_eq!(user.email.as_deref(), Some("u7@example.com"));

    let performance = event.performance.as_ref().unwrap();
    assert_eq!(performance.db_queries, Some(2));
    assert_eq!(performance.cache_hits, Some(3));

    assert_eq!(event.business.as_ref().unwrap()["discount_code"], "SPRING");
    assert_eq!(event.feature_flags.as_ref().unwrap()["new_checkout"], true);
}

#[tokio::test]
async fn test_client_error_status_is_a_warning() {
    let harness = LoggerHarness::keep_all();

    let _: Result<u16, HandlerError> = harness
        .logger
        .instrument(RequestFields::new("GET", "/api/missing"), || async { Ok(404) })
        .await;

    harness.logger.flush().await.unwrap();
    let event = &harness.client.events()[0];
    assert_eq!(event.request.status_code, 404);
    assert_eq!(event.outcome, Outcome::Warning);
    assert!(event.error.is_none());
}

#[tokio::test]
async fn test_inbound_correlation_id_is_propagated() {
    let harness = LoggerHarness::keep_all();
    let fields = RequestFields::new("GET", "/api/orders").with_correlation_from_headers([
        ("Accept", "application/json"),
        ("X-Request-Id", "req-123"),
    ]);

    let seen = harness
        .logger
        .instrument(fields, || async { Ok::<_, HandlerError>((200_u16, current_trace_id())) })
        .await
        .unwrap();
    assert_eq!(seen.1.as_deref(), Some("req-123"));

    harness.logger.flush().await.unwrap();
    assert!(harness.client.has_trace("req-123"));
}

#[tokio::test]
async fn test_traceparent_fallback() {
    let harness = LoggerHarness::keep_all();
    let fields = RequestFields::new("GET", "/").with_correlation_from_headers([(
        "traceparent",
        "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01",
    )]);

    let _: Result<(), HandlerError> = harness.logger.instrument(fields, || async { Ok(()) }).await;

    harness.logger.flush().await.unwrap();
    assert!(harness.client.has_trace("4bf92f3577b34da6a3ce929d0e0e4736"));
}

#[tokio::test(start_paused = true)]
async fn test_serverless_flushes_before_returning() {
    let harness = LoggerHarness::serverless();

    let _: Result<u16, HandlerError> = harness
        .logger
        .instrument(RequestFields::new("GET", "/api/users"), || async { Ok(200) })
        .await;

    // Delivered before instrument returned; no timer involved.
    assert_eq!(harness.client.event_count(), 1);
    assert_eq!(harness.logger.transport().pending(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_long_running_mode_defers_to_timer() {
    let harness = LoggerHarness::keep_all();

    let _: Result<u16, HandlerError> = harness
        .logger
        .instrument(RequestFields::new("GET", "/api/users"), || async { Ok(200) })
        .await;
    assert_eq!(harness.client.event_count(), 0);
    assert_eq!(harness.logger.transport().pending(), 1);

    tokio::time::sleep(std::time::Duration::from_millis(150)).await;
    assert_eq!(harness.client.event_count(), 1);
}

#[tokio::test]
async fn test_enrichment_outside_a_request_is_ignored() {
    let harness = LoggerHarness::keep_all();

    enrich(Enrichment::new().with_business("stray", true));

    let _: Result<u16, HandlerError> = harness
        .logger
        .instrument(RequestFields::new("GET", "/"), || async { Ok(200) })
        .await;
    harness.logger.flush().await.unwrap();

    assert!(harness.client.events()[0].business.is_none());
}

#[tokio::test]
async fn test_shutdown_drains_queue() {
    let harness = LoggerHarness::keep_all();

    for path in ["/a", "/b", "/c"] {
        let _: Result<u16, HandlerError> = harness
            .logger
            .instrument(RequestFields::new("GET", path), || async { Ok(200) })
            .await;
    }

    assert_eq!(harness.logger.shutdown().await.unwrap(), 3);
    assert_eq!(harness.client.batch_count(), 1);
    assert_eq!(harness.logger.transport().pending(), 0);
}
