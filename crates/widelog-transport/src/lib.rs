//! Widelog Transport - Batched delivery of wide events.
//!
//! This crate provides:
//! - [`Transport`], a shared queue flushed when it reaches the batch size or
//!   after a short delay, whichever comes first
//! - [`IngestClient`], the seam to the telemetry backend, with
//!   [`HttpIngestClient`] speaking `POST /v1/datasets/{dataset}/ingest`
//!
//! Delivery is best effort: failed batches are logged and dropped, never
//! retried. In short-lived environments await [`Transport::flush`] before
//! returning the response, since a frozen process never fires the timer.
//!
//! # Example
//!
//! ```rust,no_run
//! use widelog_transport::{IngestTarget, Transport, TransportConfig};
//! # use widelog_events::{ServiceInfo, WideEvent};
//!
//! # async fn example() {
//! let target = IngestTarget {
//!     endpoint: "https://api.axiom.co".to_string(),
//!     dataset: "wide-events".to_string(),
//!     token: std::env::var("AXIOM_TOKEN").ok(),
//! };
//! let transport = Transport::for_target(&target, TransportConfig::default());
//!
//! transport.enqueue(WideEvent::new(ServiceInfo::new("checkout")));
//! let _ = transport.flush().await;
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod batcher;
mod client;
mod error;

pub use batcher::{
    DEFAULT_BATCH_SIZE, DEFAULT_FLUSH_DELAY, IngestTarget, Transport, TransportConfig,
};
pub use client::{
    DEFAULT_INGEST_ENDPOINT, HttpIngestClient, IngestClient, RATE_LIMIT_REMAINING_HEADER,
    ingest_url,
};
pub use error::{TransportError, TransportResult};
