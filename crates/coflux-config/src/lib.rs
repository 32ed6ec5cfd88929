//! # Coflux Config
//!
//! Typed configuration for coflux.
//!
//! ## Sources
//!
//! [`ConfigLoader`] layers, from lowest to highest precedence:
//!
//! 1. Built-in defaults or a preset ([`CofluxConfig::development`],
//!    [`CofluxConfig::production`])
//! 2. A TOML or JSON file
//! 3. Environment variables (`COFLUX__CLIENT__BASE_URL`, ...), optionally
//!    seeded from a `.env` file
//!
//! Unknown fields are rejected.
//!
//! ## Example
//!
//! ```
//! use coflux_config::ConfigLoader;
//!
//! let toml = r#"
//!     [client]
//!     base_url = "https://api.example.com"
//!     timeout_ms = 5000
//!
//!     [client.default_headers]
//!     x-tenant = "acme"
//!
//!     [logging]
//!     level = "coflux_client=debug,info"
//! "#;
//!
//! let config = ConfigLoader::new().with_string(toml, "toml").unwrap().load().unwrap();
//! assert_eq!(config.client.timeout_ms, Some(5000));
//! assert_eq!(config.client.default_headers["x-tenant"], "acme");
//! ```

#![doc(html_root_url = "https://docs.rs/coflux-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::CofluxConfig;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::{ClientConfig, LogFormat, LoggingConfig};
