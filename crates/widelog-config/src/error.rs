//! Configuration error types.

use thiserror::Error;

/// Errors that can occur while resolving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No service name in the config or the environment.
    #[error("service name is required (set service.name or SERVICE_NAME)")]
    MissingServiceName,

    /// A value could not be parsed or is out of range.
    #[error("invalid value for {key}: '{value}' ({message})")]
    InvalidValue {
        /// Config field or environment variable.
        key: String,
        /// Offending value.
        value: String,
        /// What was expected.
        message: String,
    },

    /// A TOML document could not be parsed.
    #[error("failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
