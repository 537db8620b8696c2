//! Default application and validation.
//!
//! Turns a partially-filled [`WideLogConfig`] into a [`ResolvedConfig`].
//! Environment fallbacks must already be applied.

use crate::error::{ConfigError, ConfigResult};
use crate::types::{
    DEFAULT_DATASET, DEFAULT_ENDPOINT, DEFAULT_ENVIRONMENT, DEFAULT_VERSION, IngestSettings,
    LoggingSection, ResolvedConfig, SamplingSettings, ServiceSettings, WideLogConfig,
};

const PRODUCTION: &str = "production";
const LOG_FORMATS: &[&str] = &["pretty", "compact", "json", "full"];

/// Apply defaults to `config` and validate the result.
///
/// # Errors
///
/// Returns [`ConfigError::MissingServiceName`] if no service name is set,
/// or [`ConfigError::InvalidValue`] if a value is out of range.
pub fn resolve(config: WideLogConfig) -> ConfigResult<ResolvedConfig> {
    let WideLogConfig {
        service,
        ingest,
        sampling,
        logging,
        debug,
        serverless,
    } = config;

    let name = service
        .name
        .map(|n| n.trim().to_owned())
        .filter(|n| !n.is_empty())
        .ok_or(ConfigError::MissingServiceName)?;

    let environment = service
        .environment
        .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_owned());
    let is_production = environment == PRODUCTION;

    let defaults = SamplingSettings::default();
    let resolved = ResolvedConfig {
        service: ServiceSettings {
            name,
            version: service.version.unwrap_or_else(|| DEFAULT_VERSION.to_owned()),
            environment,
            region: service.region,
            deployment_id: service.deployment_id,
        },
        ingest: IngestSettings {
            endpoint: ingest.endpoint.unwrap_or_else(|| DEFAULT_ENDPOINT.to_owned()),
            dataset: ingest.dataset.unwrap_or_else(|| DEFAULT_DATASET.to_owned()),
            token: ingest.token.filter(|t| !t.is_empty()),
        },
        sampling: SamplingSettings {
            sample_rate: sampling.sample_rate.unwrap_or(defaults.sample_rate),
            slow_threshold_ms: sampling
                .slow_threshold_ms
                .unwrap_or(defaults.slow_threshold_ms),
            always_keep_subscriptions: sampling
                .always_keep_subscriptions
                .unwrap_or(defaults.always_keep_subscriptions),
        },
        logging,
        debug: debug.unwrap_or(!is_production),
        serverless: serverless.unwrap_or(false),
    };

    validate(&resolved)?;
    Ok(resolved)
}

/// Validate a resolved configuration.
///
/// # Errors
///
/// Returns the first invalid value found.
pub fn validate(config: &ResolvedConfig) -> ConfigResult<()> {
    validate_sampling(config)?;
    validate_ingest(config)?;
    validate_logging(&config.logging)?;
    Ok(())
}

fn validate_sampling(config: &ResolvedConfig) -> ConfigResult<()> {
    let rate = config.sampling.sample_rate;
    if !(0.0..=1.0).contains(&rate) {
        return Err(invalid(
            "sampling.sample_rate",
            rate,
            "must be between 0.0 and 1.0",
        ));
    }
    Ok(())
}

fn validate_ingest(config: &ResolvedConfig) -> ConfigResult<()> {
    let endpoint = &config.ingest.endpoint;
    if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
        return Err(invalid(
            "ingest.endpoint",
            endpoint,
            "must start with http:// or https://",
        ));
    }
    if config.ingest.dataset.trim().is_empty() {
        return Err(invalid("ingest.dataset", "", "must not be empty"));
    }
    Ok(())
}

fn validate_logging(logging: &LoggingSection) -> ConfigResult<()> {
    if !LOG_FORMATS
        .iter()
        .any(|format| format.eq_ignore_ascii_case(&logging.format))
    {
        return Err(invalid(
            "logging.format",
            &logging.format,
            "expected one of: pretty, compact, json, full",
        ));
    }
    if logging.level.trim().is_empty() {
        return Err(invalid("logging.level", "", "must not be empty"));
    }
    Ok(())
}

fn invalid(key: &str, value: impl std::fmt::Display, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_owned(),
        value: value.to_string(),
        message: message.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_applied() {
        let resolved = resolve(WideLogConfig::new("checkout")).unwrap();

        assert_eq!(resolved.service.name, "checkout");
        assert_eq!(resolved.service.version, DEFAULT_VERSION);
        assert_eq!(resolved.service.environment, DEFAULT_ENVIRONMENT);
        assert_eq!(resolved.ingest.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(resolved.ingest.dataset, DEFAULT_DATASET);
        assert!(resolved.ingest.token.is_none());
        assert_eq!(resolved.sampling, SamplingSettings::default());
        assert!(resolved.debug);
        assert!(!resolved.serverless);
    }

    #[test]
    fn test_missing_service_name() {
        let err = resolve(WideLogConfig::default()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingServiceName));

        let err = resolve(WideLogConfig::new("   ")).unwrap_err();
        assert!(matches!(err, ConfigError::MissingServiceName));
    }

    #[test]
    fn test_debug_off_in_production() {
        let resolved =
            resolve(WideLogConfig::new("api").with_environment("production")).unwrap();
        assert!(resolved.is_production());
        assert!(!resolved.debug);

        let resolved = resolve(
            WideLogConfig::new("api")
                .with_environment("production")
                .with_debug(true),
        )
        .unwrap();
        assert!(resolved.debug);
    }

    #[test]
    fn test_sample_rate_out_of_range() {
        for rate in [-0.1, 1.5, f64::NAN] {
            let err = resolve(WideLogConfig::new("api").with_sample_rate(rate)).unwrap_err();
            assert!(matches!(
                err,
                ConfigError::InvalidValue { ref key, .. } if key == "sampling.sample_rate"
            ));
        }
        assert!(resolve(WideLogConfig::new("api").with_sample_rate(1.0)).is_ok());
        assert!(resolve(WideLogConfig::new("api").with_sample_rate(0.0)).is_ok());
    }

    #[test]
    fn test_invalid_endpoint() {
        let err = resolve(WideLogConfig::new("api").with_endpoint("api.axiom.co")).unwrap_err();
        assert!(err.to_string().contains("ingest.endpoint"));
    }

    #[test]
    fn test_invalid_log_format() {
        let mut config = WideLogConfig::new("api");
        config.logging.format = "xml".to_owned();
        let err = resolve(config).unwrap_err();
        assert!(err.to_string().contains("logging.format"));
    }

    #[test]
    fn test_log_format_is_case_insensitive() {
        let mut config = WideLogConfig::new("api");
        config.logging.format = "JSON".to_owned();
        let resolved = resolve(config).unwrap();
        assert_eq!(resolved.logging.format, "JSON");
    }

    #[test]
    fn test_empty_token_disables_delivery() {
        let resolved = resolve(WideLogConfig::new("api").with_token("")).unwrap();
        assert!(resolved.ingest.token.is_none());
    }
}
