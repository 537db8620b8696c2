//! Environment variable fallbacks.
//!
//! Values set explicitly in [`WideLogConfig`] always win; environment
//! variables only fill fields that are still unset.

use std::collections::HashMap;

use crate::error::{ConfigError, ConfigResult};
use crate::types::WideLogConfig;

/// Service name.
pub const SERVICE_NAME: &str = "SERVICE_NAME";
/// Service version.
pub const SERVICE_VERSION: &str = "SERVICE_VERSION";
/// Environment name, checked before [`APP_ENV`].
pub const ENVIRONMENT: &str = "ENVIRONMENT";
/// Environment name fallback.
pub const APP_ENV: &str = "APP_ENV";
/// Region, checked before [`AWS_REGION`].
pub const REGION: &str = "REGION";
/// Region fallback.
pub const AWS_REGION: &str = "AWS_REGION";
/// Deployment identifier.
pub const DEPLOYMENT_ID: &str = "DEPLOYMENT_ID";
/// Ingest dataset.
pub const AXIOM_DATASET: &str = "AXIOM_DATASET";
/// Ingest token.
pub const AXIOM_TOKEN: &str = "AXIOM_TOKEN";
/// Ingest endpoint.
pub const AXIOM_URL: &str = "AXIOM_URL";
/// Debug flag.
pub const WIDELOG_DEBUG: &str = "WIDELOG_DEBUG";
/// Serverless flag.
pub const WIDELOG_SERVERLESS: &str = "WIDELOG_SERVERLESS";
/// Sample rate.
pub const WIDELOG_SAMPLE_RATE: &str = "WIDELOG_SAMPLE_RATE";
/// Slow-request threshold.
pub const WIDELOG_SLOW_THRESHOLD_MS: &str = "WIDELOG_SLOW_THRESHOLD_MS";

/// Variables whose presence means the process runs in a short-lived
/// function environment.
pub const SERVERLESS_MARKERS: &[&str] = &["AWS_LAMBDA_FUNCTION_NAME", "VERCEL"];

/// Capture the process environment.
#[must_use]
pub fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars().collect()
}

/// Fill unset fields of `config` from `env`.
///
/// Returns the number of fields filled.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidValue`] for unparseable booleans or
/// numbers.
pub fn apply_env_fallbacks(
    config: &mut WideLogConfig,
    env: &HashMap<String, String>,
) -> ConfigResult<usize> {
    let mut filled = Fallbacks { env, count: 0 };

    filled.string(&mut config.service.name, &[SERVICE_NAME]);
    filled.string(&mut config.service.version, &[SERVICE_VERSION]);
    filled.string(&mut config.service.environment, &[ENVIRONMENT, APP_ENV]);
    filled.string(&mut config.service.region, &[REGION, AWS_REGION]);
    filled.string(&mut config.service.deployment_id, &[DEPLOYMENT_ID]);

    filled.string(&mut config.ingest.dataset, &[AXIOM_DATASET]);
    filled.string(&mut config.ingest.token, &[AXIOM_TOKEN]);
    filled.string(&mut config.ingest.endpoint, &[AXIOM_URL]);

    filled.parsed(&mut config.debug, WIDELOG_DEBUG, parse_bool)?;
    filled.parsed(&mut config.serverless, WIDELOG_SERVERLESS, parse_bool)?;
    if config.serverless.is_none() && SERVERLESS_MARKERS.iter().any(|m| env.contains_key(*m)) {
        config.serverless = Some(true);
        filled.bump();
    }

    filled.parsed(&mut config.sampling.sample_rate, WIDELOG_SAMPLE_RATE, |v| {
        v.parse::<f64>().map_err(|e| e.to_string())
    })?;
    filled.parsed(
        &mut config.sampling.slow_threshold_ms,
        WIDELOG_SLOW_THRESHOLD_MS,
        |v| v.parse::<u64>().map_err(|e| e.to_string()),
    )?;

    Ok(filled.count)
}

struct Fallbacks<'a> {
    env: &'a HashMap<String, String>,
    count: usize,
}

impl<'a> Fallbacks<'a> {
    fn lookup(&self, key: &str) -> Option<&'a str> {
        self.env
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    fn bump(&mut self) {
        self.count = self.count.saturating_add(1);
    }

    fn string(&mut self, slot: &mut Option<String>, keys: &[&str]) {
        if slot.is_some() {
            return;
        }
        if let Some(value) = keys.iter().find_map(|k| self.lookup(k)) {
            *slot = Some(value.to_owned());
            self.bump();
        }
    }

    fn parsed<T>(
        &mut self,
        slot: &mut Option<T>,
        key: &str,
        parse: impl FnOnce(&str) -> Result<T, String>,
    ) -> ConfigResult<()> {
        if slot.is_some() {
            return Ok(());
        }
        let Some(raw) = self.lookup(key) else {
            return Ok(());
        };
        let value = parse(raw).map_err(|message| ConfigError::InvalidValue {
            key: key.to_owned(),
            value: raw.to_owned(),
            message,
        })?;
        *slot = Some(value);
        self.bump();
        Ok(())
    }
}

/// Parse a boolean flag (`1/true/yes/on`, `0/false/no/off`).
///
/// # Errors
///
/// Returns a message for any other value.
pub fn parse_bool(value: &str) -> Result<bool, String> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err("expected a boolean".to_owned()),
    }
}
