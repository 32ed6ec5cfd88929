//! Logging setup for coflux applications.
//!
//! - [`LogConfig`] describes the subscriber; it can be built from the
//!   `[logging]` section of a [`CofluxConfig`](coflux_config::CofluxConfig).
//! - [`init_logging`] installs it as the global `tracing` subscriber.
//!
//! # Example
//!
//! ```rust,ignore
//! use coflux_config::ConfigLoader;
//! use coflux_telemetry::{init_logging, LogConfig};
//!
//! let config = ConfigLoader::new().with_env_prefix("COFLUX").load()?;
//! init_logging(&LogConfig::from(&config.logging))?;
//! ```

#![doc(html_root_url = "https://docs.rs/coflux-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, fields, init_logging, LogConfig};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
