//! Prelude module - commonly used types for convenient import.
//!
//! Use `use widelog_events::prelude::*;` to import all essential types.

// Event model
pub use crate::{ErrorInfo, Outcome, PerformanceMetrics, ServiceInfo, UserContext, WideEvent};

// Builder
pub use crate::{EventBuilder, RequestFields, SharedEvent};
