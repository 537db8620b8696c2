//! Prelude module - commonly used types for convenient import.
//!
//! Use `use widelog_config::prelude::*;` to import all essential types.

pub use crate::{ConfigError, ConfigResult, ResolvedConfig, WideLogConfig};
