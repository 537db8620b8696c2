//! Widelog Context - Request-scoped access to the in-flight wide event.
//!
//! Code running anywhere inside a request can enrich that request's event
//! without the event being passed down as an argument. The binding is a
//! tokio task-local, so it follows the request's future across `.await`
//! points and worker threads, and concurrent requests stay isolated.
//!
//! # Example
//!
//! ```rust
//! use widelog_context::{Enrichment, enrich, run_with_event};
//! use widelog_events::{ServiceInfo, SharedEvent, WideEvent};
//!
//! # async fn example() {
//! let event = SharedEvent::new(WideEvent::new(ServiceInfo::new("checkout")));
//!
//! run_with_event(event.clone(), async {
//!     // Deep inside business logic:
//!     enrich(Enrichment::new().with_business("cart_items", 3));
//! })
//! .await;
//!
//! assert!(event.snapshot().business.is_some());
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod enrichment;
mod scope;

pub use enrichment::Enrichment;
pub use scope::{
    current_event, current_trace_id, enrich, event_span, in_scope, run_with_event, set_error,
    set_error_info, spawn_in_scope, sync_run_with_event, with_current_event,
};
