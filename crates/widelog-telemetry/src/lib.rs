//! Widelog Telemetry - Diagnostic logging for services emitting wide events.
//!
//! Widelog reports its own activity (flush failures, mirrored events,
//! dropped enrichment) through `tracing`. This crate installs a
//! `tracing-subscriber` pipeline with a level filter, per-crate
//! directives and a choice of output formats.
//!
//! # Example
//!
//! ```rust,no_run
//! use widelog_telemetry::{LogConfig, LogFormat, setup_logging};
//!
//! # fn main() -> Result<(), widelog_telemetry::TelemetryError> {
//! let config = LogConfig::new("info")
//!     .with_format(LogFormat::Json)
//!     .with_directive("widelog_transport=debug");
//!
//! setup_logging(&config)?;
//! tracing::info!("service started");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod logging;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{
    LogConfig, LogFormat, LogTarget, MIRROR_TARGET, setup_default_logging, setup_logging,
};
