//! Prelude module - commonly used types for convenient import.
//!
//! Use `use widelog_transport::prelude::*;` to import all essential types.

// Errors
pub use crate::{TransportError, TransportResult};

// Delivery
pub use crate::{HttpIngestClient, IngestClient, IngestTarget, Transport, TransportConfig};
