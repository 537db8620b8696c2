//! Widelog Config - Service identity, ingest and sampling settings.
//!
//! A [`WideLogConfig`] can be built in code, parsed from TOML, or left
//! mostly empty; unset fields fall back to environment variables and then
//! to built-in defaults. Resolution produces a [`ResolvedConfig`] with
//! every field populated.
//!
//! # Usage
//!
//! ```rust,no_run
//! use widelog_config::WideLogConfig;
//!
//! let resolved = WideLogConfig::new("checkout")
//!     .with_version("1.4.2")
//!     .resolve_from_env()
//!     .unwrap();
//! println!("sending to dataset {}", resolved.ingest.dataset);
//! ```
//!
//! # Precedence
//!
//! From highest to lowest priority:
//!
//! 1. Values set on [`WideLogConfig`] (in code or from TOML)
//! 2. Environment variables (see [`env`])
//! 3. Built-in defaults
//!
//! # Design
//!
//! This crate has no dependencies on the other widelog crates. Conversion
//! to domain types happens in the `widelog` facade.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

/// Environment variable fallback resolution.
pub mod env;
/// Configuration error types.
pub mod error;
pub mod prelude;
/// Default application and validation.
pub mod resolve;
/// Configuration struct definitions.
pub mod types;

use std::collections::HashMap;

pub use error::{ConfigError, ConfigResult};
pub use types::*;

impl WideLogConfig {
    /// Parse a config from a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ParseError`] if the document is malformed.
    pub fn from_toml_str(document: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(document)?)
    }

    /// Resolve against the current process environment.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if an environment value is malformed or
    /// the result fails validation.
    pub fn resolve_from_env(self) -> ConfigResult<ResolvedConfig> {
        self.resolve_with_env(&env::collect_env_vars())
    }

    /// Resolve against an explicit set of environment variables.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if an environment value is malformed or
    /// the result fails validation.
    pub fn resolve_with_env(
        mut self,
        vars: &HashMap<String, String>,
    ) -> ConfigResult<ResolvedConfig> {
        let filled = env::apply_env_fallbacks(&mut self, vars)?;
        if filled > 0 {
            tracing::debug!(count = filled, "Applied environment fallbacks");
        }
        let resolved = resolve::resolve(self)?;
        tracing::debug!(
            service = %resolved.service.name,
            environment = %resolved.service.environment,
            delivery = resolved.ingest.token.is_some(),
            "Configuration resolved"
        );
        Ok(resolved)
    }
}
