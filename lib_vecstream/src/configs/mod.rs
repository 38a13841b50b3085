//! # Configuration Modules
//!
//! Layered settings for the vector client: built-in defaults, an optional
//! JSON file, then environment variables and command-line flags.

/// Client configuration: CLI/env parsing, file merge and validation.
pub mod config_client;

pub use config_client::{load_config, ClientConfig, ClientSettings, ConfigError};
