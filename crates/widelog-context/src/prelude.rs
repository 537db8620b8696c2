//! Prelude module - commonly used types for convenient import.
//!
//! Use `use widelog_context::prelude::*;` to import all essential types.

pub use crate::Enrichment;

// Scope operations
pub use crate::{current_event, current_trace_id, enrich, in_scope, run_with_event, set_error};
