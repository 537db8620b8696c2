//! Facade error types.

use thiserror::Error;
use widelog_config::ConfigError;
use widelog_telemetry::TelemetryError;

/// Errors that can occur while setting up a [`WideLogger`](crate::WideLogger).
///
/// Once built, the logger never fails a request; only setup can fail.
#[derive(Debug, Error)]
pub enum WideLogError {
    /// Configuration could not be resolved.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Diagnostic logging could not be installed.
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
}

/// Result type for facade setup.
pub type WideLogResult<T> = Result<T, WideLogError>;
