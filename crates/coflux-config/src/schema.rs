//! Configuration schema types.
//!
//! This module defines the structure of all configuration sections.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// HTTP client configuration section.
///
/// # Example
///
/// ```
/// use coflux_config::ClientConfig;
///
/// let config = ClientConfig {
///     base_url: Some("https://api.example.com".to_string()),
///     ..ClientConfig::default()
/// };
/// assert_eq!(config.timeout_ms, Some(30_000));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Base URL that relative request URIs resolve against.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Headers added to every request unless the request sets them itself.
    #[serde(default)]
    pub default_headers: IndexMap<String, String>,

    /// Value of the `User-Agent` header.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Whole-request timeout in milliseconds. None disables the timeout.
    #[serde(default = "default_timeout")]
    pub timeout_ms: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            default_headers: IndexMap::new(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout(),
        }
    }
}

fn default_user_agent() -> String {
    concat!("coflux/", env!("CARGO_PKG_VERSION")).to_string()
}

#[allow(clippy::unnecessary_wraps)]
fn default_timeout() -> Option<u64> {
    Some(30_000)
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Structured JSON lines.
    #[default]
    Json,
    /// Human-readable multi-line output.
    Pretty,
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Default filter directive (e.g. "info" or "coflux_client=debug").
    #[serde(default = "default_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Emit events when spans open and close.
    #[serde(default)]
    pub span_events: bool,

    /// Colored output.
    #[serde(default)]
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
            span_events: false,
            ansi: false,
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}
