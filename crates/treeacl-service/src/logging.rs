//! Structured logging setup.
//!
//! Permission decisions are logged at `debug`, mutator rejections and
//! lookup failures at `warn`, storage failures at `error`. `RUST_LOG` takes
//! precedence over the configured level.

use std::str::FromStr;

use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    prelude::*,
    EnvFilter,
};

use crate::config::{ConfigLoadError, LoggingSettings};

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
    /// JSON output for production.
    pub fn json() -> Self {
        Self {
            json_format: true,
            ..Default::default()
        }
    }

    /// Text output for development.
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

    /// Include span enter/exit events, e.g. around each permission check.
    pub fn with_spans(mut self) -> Self {
        self.include_spans = true;
        self
    }

    /// Builds a logging configuration from the `logging` section.
    pub fn from_settings(settings: &LoggingSettings) -> Result<Self, ConfigLoadError> {
        let level =
            Level::from_str(settings.level.trim()).map_err(|_| ConfigLoadError::Invalid {
                message: format!("logging.level is not a log level: {}", settings.level),
            })?;
        Ok(Self {
            json_format: settings.json,
            default_level: level,
            include_spans: false,
        })
    }

    /// `RUST_LOG` when set and valid, the configured level otherwise.
    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.default_directive()))
    }

    fn default_directive(&self) -> String {
        self.default_level.to_string().to_lowercase()
    }

    fn span_events(&self) -> FmtSpan {
        if self.include_spans {
            FmtSpan::ENTER | FmtSpan::EXIT
        } else {
            FmtSpan::NONE
        }
    }
}

/// Installs the global subscriber: one filter, then either the JSON or the
/// pretty text layer.
///
/// Only the first call takes effect; the subscriber is process-wide.
pub fn init_logging(config: LoggingConfig) {
    let json = config.json_format.then(|| {
        fmt::layer()
            .json()
            .with_span_events(config.span_events())
            .with_current_span(true)
            .with_target(true)
            .with_file(false)
            .with_line_number(false)
    });
    let text = (!config.json_format).then(|| {
        fmt::layer()
            .pretty()
            .with_span_events(config.span_events())
            .with_target(true)
    });

    let installed = tracing_subscriber::registry()
        .with(config.env_filter())
        .with(json)
        .with(text)
        .try_init()
        .is_ok();
    if installed {
        tracing::debug!(
            level = %config.default_level,
            json = config.json_format,
            "logging initialized"
        );
    }
}

/// Installs the global subscriber described by the `logging` section.
pub fn init_logging_from_settings(settings: &LoggingSettings) -> Result<(), ConfigLoadError> {
    init_logging(LoggingConfig::from_settings(settings)?);
    Ok(())
}
