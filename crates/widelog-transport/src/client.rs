//! Ingest clients.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderValue};
use tracing::debug;
use widelog_events::WideEvent;

use crate::error::{TransportError, TransportResult};

/// Default ingest endpoint.
pub const DEFAULT_INGEST_ENDPOINT: &str = "https://api.axiom.co";

/// Response header carrying the remaining ingest quota.
pub const RATE_LIMIT_REMAINING_HEADER: &str = "x-ratelimit-remaining";

/// Delivers one batch of events to a telemetry backend.
#[async_trait]
pub trait IngestClient: Send + Sync {
    /// Send `batch` as a single ingest call.
    async fn ingest(&self, batch: &[WideEvent]) -> TransportResult<()>;
}

/// Ingest client for the `POST /v1/datasets/{dataset}/ingest` API.
pub struct HttpIngestClient {
    client: Client,
    url: String,
    authorization: HeaderValue,
}

impl HttpIngestClient {
    /// Create a client for `dataset` at `endpoint`, authenticating with
    /// `token`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::InvalidCredential`] if the token contains
    /// characters that cannot appear in a header.
    pub fn new(endpoint: &str, dataset: &str, token: &str) -> TransportResult<Self> {
        Self::with_client(Client::new(), endpoint, dataset, token)
    }

    /// Create a client reusing an existing `reqwest` client (for custom
    /// timeouts or proxies).
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::InvalidCredential`] if the token contains
    /// characters that cannot appear in a header.
    pub fn with_client(
        client: Client,
        endpoint: &str,
        dataset: &str,
        token: &str,
    ) -> TransportResult<Self> {
        let mut authorization = HeaderValue::try_from(format!("Bearer {token}"))
            .map_err(|e| TransportError::InvalidCredential(e.to_string()))?;
        authorization.set_sensitive(true);

        Ok(Self {
            client,
            url: ingest_url(endpoint, dataset),
            authorization,
        })
    }

    /// Get the ingest URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl std::fmt::Debug for HttpIngestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpIngestClient")
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl IngestClient for HttpIngestClient {
    async fn ingest(&self, batch: &[WideEvent]) -> TransportResult<()> {
        let body = serde_json::to_vec(batch)?;

        debug!(url = %self.url, count = batch.len(), "Sending ingest request");

        let response = self
            .client
            .post(&self.url)
            .header(AUTHORIZATION, self.authorization.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let rate_limit_remaining = response
            .headers()
            .get(RATE_LIMIT_REMAINING_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().await.unwrap_or_default();

        Err(TransportError::Rejected {
            status: status.as_u16(),
            body,
            rate_limit_remaining,
        })
    }
}

/// Build the ingest URL for a dataset.
#[must_use]
pub fn ingest_url(endpoint: &str, dataset: &str) -> String {
    format!(
        "{}/v1/datasets/{}/ingest",
        endpoint.trim_end_matches('/'),
        dataset
    )
}
