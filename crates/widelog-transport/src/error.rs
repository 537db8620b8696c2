//! Transport error types.

use thiserror::Error;

/// Errors that can occur while delivering a batch.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The ingest endpoint answered with a non-success status.
    #[error("Ingest rejected batch with status {status}: {body}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
        /// Value of the rate-limit-remaining header, if present.
        rate_limit_remaining: Option<String>,
    },

    /// The ingest request could not be completed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The batch could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The ingest token cannot be sent as a header.
    #[error("Invalid ingest credential: {0}")]
    InvalidCredential(String),
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;
