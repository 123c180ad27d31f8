//! Parsing and validation of `router.toml` configuration files.
//!
//! This crate reads the optional router configuration file and produces a
//! strongly-typed [`RouterConfig`] with spec-matching defaults for every
//! field.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str};
pub use types::RouterConfig;
