//! Configuration struct definitions.
//!
//! The raw [`WideLogConfig`] mirrors what a caller or a TOML file supplies;
//! every field is optional so environment fallbacks can fill the gaps.
//! [`ResolvedConfig`] is the fully-populated result. These types have no
//! dependencies on the other widelog crates; conversion to domain types
//! happens in the facade.

use serde::{Deserialize, Serialize};

/// Default environment name.
pub const DEFAULT_ENVIRONMENT: &str = "development";

/// Default service version.
pub const DEFAULT_VERSION: &str = "unknown";

/// Default dataset name.
pub const DEFAULT_DATASET: &str = "wide-events";

/// Default ingest endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.axiom.co";

/// Default sample rate.
pub const DEFAULT_SAMPLE_RATE: f64 = 0.1;

/// Default slow-request threshold.
pub const DEFAULT_SLOW_THRESHOLD_MS: u64 = 2000;

// ---------------------------------------------------------------------------
// Raw configuration
// ---------------------------------------------------------------------------

/// Caller-supplied configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WideLogConfig {
    /// Identity of the emitting service.
    pub service: ServiceSection,
    /// Telemetry backend settings.
    pub ingest: IngestSection,
    /// Default sampling rule tunables.
    pub sampling: SamplingSection,
    /// Diagnostic logging for the library itself.
    pub logging: LoggingSection,
    /// Mirror events locally and warn on dropped enrichment.
    pub debug: Option<bool>,
    /// Flush inline before a request completes.
    pub serverless: Option<bool>,
}

impl WideLogConfig {
    /// Create a config for the named service.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let mut config = Self::default();
        config.service.name = Some(name.into());
        config
    }

    /// Set the service version.
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.service.version = Some(version.into());
        self
    }

    /// Set the environment name.
    #[must_use]
    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.service.environment = Some(environment.into());
        self
    }

    /// Set the ingest dataset.
    #[must_use]
    pub fn with_dataset(mut self, dataset: impl Into<String>) -> Self {
        self.ingest.dataset = Some(dataset.into());
        self
    }

    /// Set the ingest token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.ingest.token = Some(token.into());
        self
    }

    /// Set the ingest endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.ingest.endpoint = Some(endpoint.into());
        self
    }

    /// Set the debug flag.
    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = Some(debug);
        self
    }

    /// Set the serverless flag.
    #[must_use]
    pub fn with_serverless(mut self, serverless: bool) -> Self {
        self.serverless = Some(serverless);
        self
    }

    /// Set the sample rate.
    #[must_use]
    pub fn with_sample_rate(mut self, sample_rate: f64) -> Self {
        self.sampling.sample_rate = Some(sample_rate);
        self
    }
}

/// Service identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSection {
    /// Service name (required after resolution).
    pub name: Option<String>,
    /// Deployed version.
    pub version: Option<String>,
    /// Environment name.
    pub environment: Option<String>,
    /// Hosting region.
    pub region: Option<String>,
    /// Deployment identifier.
    pub deployment_id: Option<String>,
}

/// Telemetry backend settings.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestSection {
    /// Base URL of the ingest API.
    pub endpoint: Option<String>,
    /// Dataset name.
    pub dataset: Option<String>,
    /// Bearer token.
    pub token: Option<String>,
}

impl std::fmt::Debug for IngestSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestSection")
            .field("endpoint", &self.endpoint)
            .field("dataset", &self.dataset)
            .field("has_token", &self.token.is_some())
            .finish()
    }
}

/// Default sampling rule tunables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingSection {
    /// Probability of keeping an unremarkable event.
    pub sample_rate: Option<f64>,
    /// Events slower than this are always kept.
    pub slow_threshold_ms: Option<u64>,
    /// Subscription tiers that are always kept.
    pub always_keep_subscriptions: Option<Vec<String>>,
}

/// Diagnostic logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Global log level filter.
    pub level: String,
    /// Output format: `"pretty"`, `"compact"`, `"json"` or `"full"`.
    pub format: String,
    /// Per-crate directives (e.g. `["widelog_transport=debug"]`).
    pub directives: Vec<String>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "compact".to_owned(),
            directives: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Resolved configuration
// ---------------------------------------------------------------------------

/// Configuration with every fallback applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    /// Service identity.
    pub service: ServiceSettings,
    /// Ingest target.
    pub ingest: IngestSettings,
    /// Sampling tunables.
    pub sampling: SamplingSettings,
    /// Diagnostic logging.
    pub logging: LoggingSection,
    /// Debug mode.
    pub debug: bool,
    /// Serverless mode.
    pub serverless: bool,
}

impl ResolvedConfig {
    /// Whether the service runs in production.
    #[must_use]
    pub fn is_production(&self) -> bool {
        self.service.environment == "production"
    }
}

/// Resolved service identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSettings {
    /// Service name.
    pub name: String,
    /// Deployed version.
    pub version: String,
    /// Environment name.
    pub environment: String,
    /// Hosting region.
    pub region: Option<String>,
    /// Deployment identifier.
    pub deployment_id: Option<String>,
}

/// Resolved ingest target.
#[derive(Clone, PartialEq, Eq)]
pub struct IngestSettings {
    /// Base URL of the ingest API.
    pub endpoint: String,
    /// Dataset name.
    pub dataset: String,
    /// Bearer token; remote delivery is disabled without one.
    pub token: Option<String>,
}

impl std::fmt::Debug for IngestSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestSettings")
            .field("endpoint", &self.endpoint)
            .field("dataset", &self.dataset)
            .field("has_token", &self.token.is_some())
            .finish()
    }
}

/// Resolved sampling tunables.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplingSettings {
    /// Probability of keeping an unremarkable event.
    pub sample_rate: f64,
    /// Events slower than this are always kept.
    pub slow_threshold_ms: u64,
    /// Subscription tiers that are always kept.
    pub always_keep_subscriptions: Vec<String>,
}

impl Default for SamplingSettings {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            slow_threshold_ms: DEFAULT_SLOW_THRESHOLD_MS,
            always_keep_subscriptions: vec!["enterprise".to_owned(), "premium".to_owned()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let config = WideLogConfig::new("checkout")
            .with_version("2.0.0")
            .with_token("tok")
            .with_sample_rate(0.5)
            .with_serverless(true);

        assert_eq!(config.service.name.as_deref(), Some("checkout"));
        assert_eq!(config.service.version.as_deref(), Some("2.0.0"));
        assert_eq!(config.ingest.token.as_deref(), Some("tok"));
        assert_eq!(config.sampling.sample_rate, Some(0.5));
        assert_eq!(config.serverless, Some(true));
        assert!(config.debug.is_none());
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = WideLogConfig::new("svc").with_token("super-secret");
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("has_token: true"));
    }

    #[test]
    fn test_deserialize_partial() {
        let config: WideLogConfig = serde_json::from_str(
            r#"{"service": {"name": "api"}, "sampling": {"slow_threshold_ms": 500}}"#,
        )
        .unwrap();
        assert_eq!(config.service.name.as_deref(), Some("api"));
        assert_eq!(config.sampling.slow_threshold_ms, Some(500));
        assert_eq!(config.logging, LoggingSection::default());
    }
}
