//! Shared test harness for integration tests.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use widelog::{
    KeepAll, ResolvedConfig, TransportConfig, WideLogConfig, WideLogger, WideLoggerBuilder,
};
use widelog_test::{MockIngestClient, init_test_logging};

/// A logger wired to a recording ingest client.
#[allow(dead_code)]
pub struct LoggerHarness {
    /// The logger under test.
    pub logger: WideLogger,
    /// Every batch the logger delivered.
    pub client: MockIngestClient,
}

#[allow(dead_code)]
impl LoggerHarness {
    /// Default sampling with a zero sample rate, so only the always-keep
    /// rules let events through.
    pub fn new() -> Self {
        Self::build(config(), |b| b)
    }

    /// Keep every event.
    pub fn keep_all() -> Self {
        Self::build(config(), |b| b.with_sampler(KeepAll))
    }

    /// Serverless mode, keeping every event.
    pub fn serverless() -> Self {
        let mut cfg = config();
        cfg.serverless = true;
        Self::build(cfg, |b| b.with_sampler(KeepAll))
    }

    /// Keep every event, with custom batching.
    pub fn with_transport(transport: TransportConfig) -> Self {
        Self::build(config(), |b| {
            b.with_sampler(KeepAll).with_transport_config(transport)
        })
    }

    fn build(
        cfg: ResolvedConfig,
        customize: impl FnOnce(WideLoggerBuilder) -> WideLoggerBuilder,
    ) -> Self {
        init_test_logging();
        let client = MockIngestClient::new();
        let builder = WideLogger::builder(&cfg).with_client(Arc::new(client.clone()));
        Self {
            logger: customize(builder).build(),
            client,
        }
    }
}

fn config() -> ResolvedConfig {
    WideLogConfig::new("integration")
        .with_version("9.9.9")
        .with_sample_rate(0.0)
        .resolve_with_env(&HashMap::new())
        .unwrap()
}

/// Error returned by test handlers.
#[derive(Debug)]
#[allow(dead_code)]
pub struct HandlerError(pub &'static str);

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl std::error::Error for HandlerError {}
