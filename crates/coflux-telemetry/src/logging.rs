//! Structured logging for coflux.
//!
//! coflux libraries only emit `tracing` events; applications decide where
//! they go. [`init_logging`] installs a global subscriber with an
//! [`EnvFilter`] and either a JSON or a pretty formatter.
//!
//! Lifecycle events are emitted under these targets:
//!
//! | Target | Level | Events |
//! |--------|-------|--------|
//! | `coflux_core` | trace | subscription cancelled, body decoding |
//! | `coflux_client` | debug | request dispatched, response received |
//! | `coflux_filter` | debug | filter launched, chain invoked |
//!
//! # Example
//!
//! ```rust,ignore
//! use coflux_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::development())?;
//! tracing::info!("ready");
//! ```

use crate::error::TelemetryError;
use crate::TelemetryResult;
use coflux_config::{LogFormat, LoggingConfig};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Whether logging is enabled.
    pub enabled: bool,

    /// Filter directive (e.g., "info", "coflux_client=debug,warn").
    pub level: String,

    /// Whether to output JSON format.
    pub json_format: bool,

    /// Whether to include span events (new, close).
    pub span_events: bool,

    /// Whether to include file/line info.
    pub file_line_info: bool,

    /// Whether to include the target (module path).
    pub include_target: bool,

    /// Colored output. Ignored for JSON.
    pub ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            json_format: true,
            span_events: false,
            file_line_info: false,
            include_target: true,
            ansi: false,
        }
    }
}

impl LogConfig {
    /// Human-readable debug output with span events and source locations.
    #[must_use]
    pub fn development() -> Self {
        Self {
            level: "debug".to_string(),
            json_format: false,
            span_events: true,
            file_line_info: true,
            ansi: true,
            ..Self::default()
        }
    }

    /// JSON output at info level.
    #[must_use]
    pub fn production() -> Self {
        Self::default()
    }

    /// Disables logging entirely.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

impl From<&LoggingConfig> for LogConfig {
    fn from(config: &LoggingConfig) -> Self {
        Self {
            level: config.level.clone(),
            json_format: config.format == LogFormat::Json,
            span_events: config.span_events,
            ansi: config.ansi,
            ..Self::default()
        }
    }
}

/// Installs the global logging subscriber.
///
/// # Errors
///
/// Returns [`TelemetryError::InvalidFilter`] for an unparsable level and
/// [`TelemetryError::LoggingInit`] if a global subscriber is already set.
pub fn init_logging(config: &LogConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let filter = create_env_filter(&config.level)?;

    let span_events = if config.span_events {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let base = tracing_subscriber::fmt::layer()
        .with_span_events(span_events)
        .with_file(config.file_line_info)
        .with_line_number(config.file_line_info)
        .with_target(config.include_target);

    let fmt_layer = if config.json_format {
        base.json().with_filter(filter).boxed()
    } else {
        base.pretty().with_ansi(config.ansi).with_filter(filter).boxed()
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .try_init()
        .map_err(|e| TelemetryError::LoggingInit(e.to_string()))
}

/// Parses a filter directive.
///
/// # Errors
///
/// Returns [`TelemetryError::InvalidFilter`] if the directive is invalid.
pub fn create_env_filter(filter: &str) -> TelemetryResult<EnvFilter> {
    EnvFilter::try_new(filter).map_err(|e| TelemetryError::InvalidFilter(e.to_string()))
}

/// Field names used by coflux events.
///
/// Filter on these in JSON logs, e.g. `fields.exchange`.
pub mod fields {
    /// Id of the server exchange.
    pub const EXCHANGE_ID: &str = "exchange";

    /// Name of the filter that emitted the event.
    pub const FILTER: &str = "filter";

    /// Position of a filter in its chain.
    pub const CHAIN_INDEX: &str = "index";

    /// HTTP method of a client request or server exchange.
    pub const HTTP_METHOD: &str = "method";

    /// Request URI.
    pub const HTTP_URI: &str = "uri";

    /// Response status code.
    pub const HTTP_STATUS: &str = "status";

    /// Display form of a failure.
    pub const ERROR: &str = "error";
}
