//! Bridge from `widelog_config::ResolvedConfig` to domain types.
//!
//! The config crate has no dependencies on other widelog crates. This
//! module translates its settings into the types the event, sampling,
//! transport and telemetry crates consume.

use widelog_config::{
    IngestSettings, LoggingSection, ResolvedConfig, SamplingSettings, ServiceSettings,
};
use widelog_events::ServiceInfo;
use widelog_sampling::SamplingOptions;
use widelog_telemetry::{LogConfig, LogFormat, TelemetryResult};
use widelog_transport::{IngestTarget, TransportConfig};

/// Convert service settings to the [`ServiceInfo`] stamped on every event.
#[must_use]
pub fn to_service_info(service: &ServiceSettings) -> ServiceInfo {
    let mut info = ServiceInfo::new(&service.name)
        .with_version(&service.version)
        .with_environment(&service.environment);

    if let Some(region) = &service.region {
        info = info.with_region(region);
    }
    if let Some(deployment_id) = &service.deployment_id {
        info = info.with_deployment_id(deployment_id);
    }

    info
}

/// Convert sampling settings to [`SamplingOptions`] for the default rule.
#[must_use]
pub fn to_sampling_options(sampling: &SamplingSettings) -> SamplingOptions {
    SamplingOptions::default()
        .with_sample_rate(sampling.sample_rate)
        .with_slow_threshold_ms(sampling.slow_threshold_ms)
        .with_always_keep_subscriptions(sampling.always_keep_subscriptions.iter().cloned())
}

/// Convert ingest settings to an [`IngestTarget`].
#[must_use]
pub fn to_ingest_target(ingest: &IngestSettings) -> IngestTarget {
    IngestTarget {
        endpoint: ingest.endpoint.clone(),
        dataset: ingest.dataset.clone(),
        token: ingest.token.clone(),
    }
}

/// Batching defaults, with local mirroring when `debug` is set.
#[must_use]
pub fn to_transport_config(cfg: &ResolvedConfig) -> TransportConfig {
    TransportConfig::default().with_mirroring(cfg.debug)
}

/// Convert the logging section to a [`LogConfig`].
///
/// # Errors
///
/// Returns an error for an unknown log format.
pub fn to_log_config(logging: &LoggingSection) -> TelemetryResult<LogConfig> {
    let format: LogFormat = logging.format.parse()?;
    Ok(LogConfig::new(&logging.level)
        .with_format(format)
        .with_directives(logging.directives.iter().cloned()))
}

/// The diagnostic log config for `cfg`.
///
/// In debug mode mirrored events stay visible even under a quiet level.
///
/// # Errors
///
/// Returns an error for an unknown log format.
pub fn to_diagnostics_config(cfg: &ResolvedConfig) -> TelemetryResult<LogConfig> {
    let log = to_log_config(&cfg.logging)?;
    Ok(if cfg.debug {
        log.with_mirrored_events()
    } else {
        log
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use widelog_config::WideLogConfig;

    fn resolved() -> ResolvedConfig {
        WideLogConfig::new("checkout")
            .with_version("1.4.2")
            .with_environment("production")
            .with_token("xaat-1")
            .with_sample_rate(0.5)
            .resolve_with_env(&std::collections::HashMap::new())
            .unwrap()
    }

    #[test]
    fn test_service_info() {
        let mut cfg = resolved();
        cfg.service.region = Some("eu-west-1".to_string());

        let info = to_service_info(&cfg.service);
        assert_eq!(info.name, "checkout");
        assert_eq!(info.version, "1.4.2");
        assert_eq!(info.environment, "production");
        assert_eq!(info.region.as_deref(), Some("eu-west-1"));
        assert!(info.deployment_id.is_none());
    }

    #[test]
    fn test_sampling_options() {
        let options = to_sampling_options(&resolved().sampling);
        assert!((options.sample_rate - 0.5).abs() < f64::EPSILON);
        assert_eq!(options.slow_threshold_ms, 2000);
        assert!(options.always_keep_subscriptions.contains("enterprise"));
    }

    #[test]
    fn test_ingest_target() {
        let target = to_ingest_target(&resolved().ingest);
        assert_eq!(target.endpoint, "https://api.axiom.co");
        assert_eq!(target.dataset, "wide-events");
        assert_eq!(target.token.as_deref(), Some("xaat-1"));
    }

    #[test]
    fn test_transport_mirrors_only_in_debug() {
        let cfg = resolved();
        assert!(!to_transport_config(&cfg).mirror_when_disabled);

        let mut cfg = cfg;
        cfg.debug = true;
        assert!(to_transport_config(&cfg).mirror_when_disabled);
    }

    #[test]
    fn test_log_config() {
        let logging = LoggingSection {
            level: "debug".to_string(),
            format: "json".to_string(),
            directives: vec!["widelog_transport=trace".to_string()],
        };
        let log = to_log_config(&logging).unwrap();
        assert_eq!(log.level, "debug");
        assert_eq!(log.format, LogFormat::Json);
        assert_eq!(log.directives, vec!["widelog_transport=trace"]);

        assert_eq!(
            to_log_config(&LoggingSection {
                format: "Compact".to_string(),
                ..LoggingSection::default()
            })
            .unwrap()
            .format,
            LogFormat::Compact
        );

        let bad = LoggingSection {
            format: "xml".to_string(),
            ..LoggingSection::default()
        };
        assert!(to_log_config(&bad).is_err());
    }

    #[test]
    fn test_diagnostics_keep_mirror_visible_in_debug() {
        let mut cfg = resolved();
        cfg.logging.level = "warn".to_string();
        assert!(to_diagnostics_config(&cfg).unwrap().directives.is_empty());

        cfg.debug = true;
        let log = to_diagnostics_config(&cfg).unwrap();
        assert_eq!(log.level, "warn");
        assert_eq!(log.directives, vec!["widelog::mirror=info"]);
    }
}
