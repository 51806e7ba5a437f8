//! Configuration module for suite-runner
//!
//! This module provides a unified configuration system that combines CLI arguments
//! with environment variables using strict error handling and clear priority logic.
//!
//! # Architecture
//!
//! The configuration system is built with a layered architecture:
//!
//! - [`env_reader`] - Low-level environment access with error handling
//! - [`env_config`] - Typed `SUITE_RUNNER_*` variables with validation
//! - [`run_config`] - High-level run configuration with CLI integration
//!
//! # Error Handling
//!
//! Invalid values result in [`ConfigError`], never in a fallback to defaults.
//! Defaults are only used when a value is not set at all.
//!
//! # Priority Logic
//!
//! 1. CLI parameters (highest priority)
//! 2. Environment variables
//! 3. Hardcoded defaults
//!
//! # Usage
//!
//! ```rust
//! use suite_runner::config::{CliArgs, ConfigError, RunConfig};
//!
//! let cli_args = CliArgs {
//!     filter: Some("Math.*".to_owned()),
//!     ..CliArgs::default()
//! };
//!
//! match RunConfig::from_cli(cli_args) {
//!     Ok(config) => println!("filter = {}", config.filter().as_str()),
//!     Err(ConfigError::InvalidFilter { filter, reason }) => {
//!         eprintln!("bad filter {filter}: {reason}");
//!     }
//!     Err(other) => eprintln!("{other}"),
//! }
//! ```

pub mod env_config;
pub mod env_reader;
pub mod run_config;

pub use env_config::{ConfigError, EnvConfig};
pub use env_reader::{EnvReader, SystemEnvReader};
pub use run_config::{CliArgs, ConfigBuilder, RunConfig};

#[cfg(test)]
pub use env_reader::MockEnvReader;
