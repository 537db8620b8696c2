//! Widelog Test - Shared test utilities for widelog.
//!
//! This crate provides a recording ingest client and event fixtures that
//! can be used across the widelog crates as a dev-dependency.
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! widelog-test.workspace = true
//! ```
//!
//! Then use in your tests:
//!
//! ```rust,ignore
//! #[cfg(test)]
//! mod tests {
//!     use std::sync::Arc;
//!     use widelog_test::{MockIngestClient, test_event};
//!     use widelog_transport::{Transport, TransportConfig};
//!
//!     #[tokio::test]
//!     async fn test_delivery() {
//!         let client = MockIngestClient::new();
//!         let transport = Transport::new(Arc::new(client.clone()), TransportConfig::default());
//!
//!         transport.enqueue(test_event());
//!         transport.flush().await.unwrap();
//!
//!         assert_eq!(client.event_count(), 1);
//!     }
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

pub mod fixtures;
pub mod harness;
pub mod mocks;

pub use fixtures::*;
pub use harness::*;
pub use mocks::*;
