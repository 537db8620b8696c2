//! Prelude module - commonly used test helpers for convenient import.
//!
//! Use `use widelog_test::prelude::*;` in test modules.

pub use crate::fixtures::{
    event_with_duration, event_with_status, event_with_subscription, test_event, test_request,
    test_service,
};
pub use crate::harness::init_test_logging;
pub use crate::mocks::{MockIngestClient, MockResponse};
