//! Subscriber setup for widelog's own diagnostics.
//!
//! Wide events themselves go to the ingest endpoint. What is installed here
//! carries everything else: flush failures and rate-limit warnings from the
//! transport, dropped enrichment notices, the `wide_event` request spans, and
//! events mirrored locally under the `widelog::mirror` target when no ingest
//! token is configured.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing_subscriber::{
    EnvFilter, Layer, Registry,
    fmt::{self, MakeWriter, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::error::{TelemetryError, TelemetryResult};

/// Target used by the transport when it mirrors events locally.
pub const MIRROR_TARGET: &str = "widelog::mirror";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// How diagnostic lines are rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line, colored. Mirrored events are easiest to read this way.
    #[default]
    Pretty,
    /// One line per record.
    Compact,
    /// Newline-delimited JSON, for shipping diagnostics to a collector.
    Json,
    /// The `tracing-subscriber` default layout.
    Full,
}

impl FromStr for LogFormat {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            "full" => Ok(Self::Full),
            other => Err(TelemetryError::ConfigError(format!(
                "unknown log format '{other}'"
            ))),
        }
    }
}

/// Stream diagnostics are written to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogTarget {
    /// Standard output, shared with the host service's own output.
    Stdout,
    /// Standard error.
    #[default]
    Stderr,
}

/// Diagnostic subscriber settings.
///
/// Missing fields deserialize to the [`Default`] values: `info`, pretty,
/// stderr, timestamps and colors on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Base filter, in `EnvFilter` syntax.
    pub level: String,
    /// Rendering.
    pub format: LogFormat,
    /// Output stream.
    pub target: LogTarget,
    /// Prefix each line with a timestamp.
    pub timestamps: bool,
    /// Include the emitting file and line.
    pub source_location: bool,
    /// Log when each `wide_event` span opens and closes.
    pub span_events: bool,
    /// Colorize output. Ignored for JSON.
    pub ansi: bool,
    /// Extra directives layered over `level`, such as
    /// `widelog_transport=debug`.
    pub directives: Vec<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            target: LogTarget::Stderr,
            timestamps: true,
            source_location: false,
            span_events: false,
            ansi: true,
            directives: Vec::new(),
        }
    }
}

impl LogConfig {
    /// Defaults with `level` as the base filter.
    #[must_use]
    pub fn new(level: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            ..Default::default()
        }
    }

    /// Builder: rendering.
    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Builder: output stream.
    #[must_use]
    pub fn with_target(mut self, target: LogTarget) -> Self {
        self.target = target;
        self
    }

    /// Builder: one extra directive.
    #[must_use]
    pub fn with_directive(mut self, directive: impl Into<String>) -> Self {
        self.directives.push(directive.into());
        self
    }

    /// Builder: several extra directives, in order.
    #[must_use]
    pub fn with_directives<I, D>(mut self, directives: I) -> Self
    where
        I: IntoIterator<Item = D>,
        D: Into<String>,
    {
        self.directives.extend(directives.into_iter().map(Into::into));
        self
    }

    /// Builder: timestamp prefix on or off.
    #[must_use]
    pub fn with_timestamps(mut self, enabled: bool) -> Self {
        self.timestamps = enabled;
        self
    }

    /// Builder: file and line on or off.
    #[must_use]
    pub fn with_source_location(mut self, enabled: bool) -> Self {
        self.source_location = enabled;
        self
    }

    /// Builder: `wide_event` span open/close lines on or off.
    #[must_use]
    pub fn with_span_events(mut self, enabled: bool) -> Self {
        self.span_events = enabled;
        self
    }

    /// Builder: colors on or off.
    #[must_use]
    pub fn with_ansi(mut self, enabled: bool) -> Self {
        self.ansi = enabled;
        self
    }

    /// Let mirrored events through even when `level` is quieter than
    /// `info`.
    #[must_use]
    pub fn with_mirrored_events(self) -> Self {
        if self.mirrors_events() {
            return self;
        }
        self.with_directive(format!("{MIRROR_TARGET}=info"))
    }

    fn mirrors_events(&self) -> bool {
        self.directives.iter().any(|d| {
            d.strip_prefix(MIRROR_TARGET)
                .is_some_and(|rest| rest.starts_with('='))
        })
    }

    fn build_filter(&self) -> TelemetryResult<EnvFilter> {
        let invalid = |e: tracing_subscriber::filter::ParseError| {
            TelemetryError::ConfigError(e.to_string())
        };

        let base = EnvFilter::try_new(&self.level).map_err(invalid)?;
        self.directives.iter().try_fold(base, |filter, d| {
            Ok(filter.add_directive(d.parse().map_err(invalid)?))
        })
    }

    fn format_layer<W>(&self, writer: W) -> BoxedLayer
    where
        W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
    {
        let spans = if self.span_events {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        };
        let base = fmt::layer()
            .with_writer(writer)
            .with_ansi(self.ansi && self.format != LogFormat::Json)
            .with_file(self.source_location)
            .with_line_number(self.source_location)
            .with_span_events(spans);

        match (self.format, self.timestamps) {
            (LogFormat::Json, true) => base.json().boxed(),
            (LogFormat::Json, false) => base.json().without_time().boxed(),
            (LogFormat::Pretty, true) => base.pretty().boxed(),
            (LogFormat::Pretty, false) => base.pretty().without_time().boxed(),
            (LogFormat::Compact, true) => base.compact().boxed(),
            (LogFormat::Compact, false) => base.compact().without_time().boxed(),
            (LogFormat::Full, true) => base.boxed(),
            (LogFormat::Full, false) => base.without_time().boxed(),
        }
    }
}

/// Install the process-wide subscriber described by `config`.
///
/// # Errors
///
/// [`TelemetryError::ConfigError`] for a bad level or directive,
/// [`TelemetryError::InitError`] if a global subscriber already exists.
pub fn setup_logging(config: &LogConfig) -> TelemetryResult<()> {
    let filter = config.build_filter()?;

    let layer = match config.target {
        LogTarget::Stdout => config.format_layer(std::io::stdout),
        LogTarget::Stderr => config.format_layer(std::io::stderr),
    };

    tracing_subscriber::registry()
        .with(layer.with_filter(filter))
        .try_init()
        .map_err(|e| TelemetryError::InitError(e.to_string()))
}

/// [`setup_logging`] with [`LogConfig::default`].
///
/// # Errors
///
/// [`TelemetryError::InitError`] if a global subscriber already exists.
pub fn setup_default_logging() -> TelemetryResult<()> {
    setup_logging(&LogConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_suit_local_development() {
        let config = LogConfig::default();
        assert_eq!(config.level, "info");
        assert_eq!(config.format, LogFormat::Pretty);
        assert_eq!(config.target, LogTarget::Stderr);
        assert!(config.timestamps && config.ansi);
        assert!(!config.span_events);
        assert!(config.directives.is_empty());
    }

    #[test]
    fn test_collector_friendly_config() {
        let config = LogConfig::new("warn")
            .with_format(LogFormat::Json)
            .with_target(LogTarget::Stdout)
            .with_timestamps(false)
            .with_span_events(true)
            .with_directive("widelog_transport=debug")
            .with_directives(["widelog_context=trace"]);

        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.target, LogTarget::Stdout);
        assert!(!config.timestamps);
        assert!(config.span_events);
        assert_eq!(
            config.directives,
            vec!["widelog_transport=debug", "widelog_context=trace"]
        );
        assert!(config.build_filter().is_ok());
    }

    #[test]
    fn test_partial_document_fills_defaults() {
        let parsed: LogConfig =
            serde_json::from_str(r#"{"format": "compact", "span_events": true}"#).unwrap();
        assert_eq!(parsed.level, "info");
        assert_eq!(parsed.format, LogFormat::Compact);
        assert!(parsed.span_events);
        assert!(parsed.ansi);

        let json = serde_json::to_value(LogConfig::new("debug").with_target(LogTarget::Stdout))
            .unwrap();
        assert_eq!(json["target"], "stdout");
        assert_eq!(json["format"], "pretty");
    }

    #[test]
    fn test_format_names_ignore_case() {
        assert_eq!("Pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert!(matches!(
            "logfmt".parse::<LogFormat>(),
            Err(TelemetryError::ConfigError(_))
        ));
    }

    #[test]
    fn test_mirrored_events_directive_added_once() {
        let config = LogConfig::new("warn")
            .with_mirrored_events()
            .with_mirrored_events();
        assert_eq!(config.directives, vec!["widelog::mirror=info"]);
        assert!(config.build_filter().is_ok());

        let explicit = LogConfig::new("warn")
            .with_directive("widelog::mirror=debug")
            .with_mirrored_events();
        assert_eq!(explicit.directives, vec!["widelog::mirror=debug"]);
    }

    #[test]
    fn test_malformed_directive_is_config_error() {
        // Unknown targets are accepted by EnvFilter, broken syntax is not.
        let config = LogConfig::new("info").with_directive("[widelog=debug");
        assert!(matches!(
            config.build_filter(),
            Err(TelemetryError::ConfigError(_))
        ));
    }

    #[test]
    fn test_second_install_fails() {
        // Whichever call installs first, the later one finds it in place.
        let _ = setup_logging(&LogConfig::new("warn").with_ansi(false));
        let err = setup_default_logging().unwrap_err();
        assert!(matches!(err, TelemetryError::InitError(_)));
    }
}
