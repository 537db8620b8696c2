//! Prelude module - commonly used types for convenient import.
//!
//! Use `use widelog_sampling::prelude::*;` to import all essential types.

pub use crate::{KeepAll, KeepOnlyErrors, Sampler, SamplingOptions, SharedSampler, TailSampler};
pub use crate::{keep_all, keep_only_errors, should_keep};
