//! Root configuration type.

use crate::{ClientConfig, ConfigError, LogFormat, LoggingConfig};
use http::header::{HeaderName, HeaderValue};
use http::Uri;
use serde::{Deserialize, Serialize};

/// Complete coflux configuration.
///
/// # Example
///
/// ```
/// use coflux_config::{CofluxConfig, LogFormat};
///
/// let config = CofluxConfig::development();
/// assert_eq!(config.logging.level, "debug");
/// assert_eq!(config.logging.format, LogFormat::Pretty);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CofluxConfig {
    /// HTTP client settings.
    #[serde(default)]
    pub client: ClientConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl CofluxConfig {
    /// Development preset: debug level, pretty colored logs, span events.
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();
        config.logging.level = "debug".to_string();
        config.logging.format = LogFormat::Pretty;
        config.logging.ansi = true;
        config.logging.span_events = true;
        config
    }

    /// Production preset: info level JSON logs.
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();
        config.logging.level = "info".to_string();
        config.logging.format = LogFormat::Json;
        config.logging.ansi = false;
        config
    }

    /// Checks values serde cannot check.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for a base URL without scheme
    /// and authority, an invalid default header, an invalid user agent, a
    /// zero timeout or an empty log level.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(base_url) = &self.client.base_url {
            let uri: Uri = base_url
                .parse()
                .map_err(|e: http::uri::InvalidUri| ConfigError::invalid_value("client.base_url", e.to_string()))?;
            if uri.scheme().is_none() || uri.authority().is_none() {
                return Err(ConfigError::invalid_value(
                    "client.base_url",
                    "must be absolute (scheme and host)",
                ));
            }
        }

        for (name, value) in &self.client.default_headers {
            let field = format!("client.default_headers.{name}");
            HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ConfigError::invalid_value(field.as_str(), e.to_string()))?;
            HeaderValue::from_str(value)
                .map_err(|e| ConfigError::invalid_value(field.as_str(), e.to_string()))?;
        }

        HeaderValue::from_str(&self.client.user_agent)
            .map_err(|e| ConfigError::invalid_value("client.user_agent", e.to_string()))?;

        if self.client.timeout_ms == Some(0) {
            return Err(ConfigError::invalid_value(
                "client.timeout_ms",
                "must be greater than zero; omit it to disable the timeout",
            ));
        }

        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::invalid_value("logging.level", "must not be empty"));
        }

        Ok(())
    }
}
