//! Structured logging configuration.
//!
//! Loader components log through `tracing` with fixed targets:
//!
//! | Target          | Events                                      |
//! |-----------------|---------------------------------------------|
//! | `rsdl::batch`   | batch dispatch (debug), fetch failures      |
//! | `rsdl::registry`| loader creation and failed resolution       |
//! | `rsdl::http`    | loader context installation (trace)         |
//!
//! # Usage
//!
//! ```ignore
//! use rsdl_api::observability::{init_logging, LoggingConfig};
//!
//! // From loaded settings
//! init_logging(LoggingConfig::from_settings(&settings.logging));
//!
//! // Development: show every batch
//! init_logging(LoggingConfig::text().with_level(tracing::Level::DEBUG));
//! ```

use rsdl_server::config::LoggingSettings;
use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    prelude::*,
    EnvFilter,
};

/// Configuration for structured logging.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Whether to use JSON format (true) or text format (false)
    pub json_format: bool,
    /// The default log level if RUST_LOG is not set
    pub default_level: Level,
    /// Whether to include span events (enter/exit)
    pub include_spans: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            json_format: false,
            default_level: Level::INFO,
            include_spans: false,
        }
    }
}

impl LoggingConfig {
    pub fn json() -> Self {
        Self {
            json_format: true,
            ..Default::default()
        }
    }

    pub fn text() -> Self {
        Self {
            json_format: false,
            ..Default::default()
        }
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.default_level = level;
        self
    }

    pub fn with_spans(mut self) -> Self {
        self.include_spans = true;
        self
    }

    /// Builds a config from loaded settings. Unknown levels fall back to INFO.
    pub fn from_settings(settings: &LoggingSettings) -> Self {
        let level = settings.level.parse().unwrap_or(Level::INFO);
        let base = if settings.json {
            Self::json()
        } else {
            Self::text()
        };
        base.with_level(level)
    }
}

/// Installs the global subscriber.
///
/// `RUST_LOG` wins over `config.default_level`. Returns `false` when a global
/// subscriber is already installed, in which case nothing changes.
pub fn init_logging(config: LoggingConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.default_level.to_string()));

    let span_events = if config.include_spans {
        FmtSpan::ENTER | FmtSpan::EXIT
    } else {
        FmtSpan::NONE
    };

    let format = if config.json_format {
        fmt::layer()
            .json()
            .with_span_events(span_events)
            .with_current_span(true)
            .with_target(true)
            .with_file(false)
            .with_line_number(false)
            .boxed()
    } else {
        fmt::layer()
            .pretty()
            .with_span_events(span_events)
            .with_target(true)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(format)
        .try_init()
        .is_ok()
}

/// JSON subscriber writing every event (down to trace) to `writer`.
///
/// Intended for tests that assert on log output.
pub fn create_json_layer<W>(writer: W) -> impl tracing::Subscriber + Send + Sync
where
    W: for<'writer> tracing_subscriber::fmt::MakeWriter<'writer> + Send + Sync + 'static,
{
    tracing_subscriber::registry()
        .with(EnvFilter::new("trace"))
        .with(
            fmt::layer()
                .json()
                .with_writer(writer)
                .with_target(true)
                .with_current_span(true),
        )
}
