//! Prelude module - commonly used types for convenient import.
//!
//! Use `use widelog::prelude::*;` in request handlers and framework glue.

// Setup
pub use crate::{WideLogConfig, WideLogError, WideLogResult, WideLogger};

// Per request
pub use crate::{Enrichment, RequestFields, ResponseStatus, enrich, set_error};

// Event types
pub use crate::{ErrorInfo, Outcome, PerformanceMetrics, UserContext, WideEvent};
