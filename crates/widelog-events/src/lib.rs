//! Widelog Events - The wide event record and its per-request builder.
//!
//! This crate provides:
//! - [`WideEvent`], one structured record per inbound request
//! - [`EventBuilder`], which owns the event from creation to finalization
//! - [`SharedEvent`], the live handle installed into a request scope
//!
//! # Example
//!
//! ```rust
//! use widelog_events::{EventBuilder, Outcome, RequestFields, ServiceInfo};
//!
//! let mut builder = EventBuilder::create(ServiceInfo::new("checkout"));
//! builder.set_request(RequestFields::new("GET", "/api/users"));
//! builder.set_status_code(404);
//!
//! let event = builder.finalize();
//! assert_eq!(event.outcome, Outcome::Warning);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod builder;
mod event;
mod shared;

pub use builder::{CORRELATION_HEADERS, EventBuilder, RequestFields, TRACEPARENT_HEADER};
pub use event::{
    ErrorInfo, Outcome, PerformanceMetrics, RequestInfo, ServiceInfo, UserContext, WideEvent,
    generate_trace_id,
};
pub use shared::SharedEvent;
