//! Environment configuration module
//!
//! This module provides typed, validated access to the `SUITE_RUNNER_*`
//! environment variables and the sharding protocol variables.

use super::env_reader::{EnvReader, SystemEnvReader};
use thiserror::Error;

pub const FILTER_ENV: &str = "SUITE_RUNNER_FILTER";
pub const ALSO_RUN_DISABLED_TESTS_ENV: &str = "SUITE_RUNNER_ALSO_RUN_DISABLED_TESTS";
pub const SHUFFLE_ENV: &str = "SUITE_RUNNER_SHUFFLE";
pub const RANDOM_SEED_ENV: &str = "SUITE_RUNNER_RANDOM_SEED";
pub const REPEAT_ENV: &str = "SUITE_RUNNER_REPEAT";
pub const CATCH_PANICS_ENV: &str = "SUITE_RUNNER_CATCH_PANICS";
pub const PRINT_TIME_ENV: &str = "SUITE_RUNNER_PRINT_TIME";
pub const LIST_TESTS_ENV: &str = "SUITE_RUNNER_LIST_TESTS";

/// Configuration errors, all reported before any test runs
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// An environment variable holds a value of the wrong shape
    #[error("Invalid environment value: {key}='{value}' (expected: {expected})")]
    InvalidEnvValue {
        key: String,
        value: String,
        expected: String,
    },
    /// The sharding variables do not describe a valid shard
    #[error("Invalid sharding configuration: {reason}")]
    InconsistentSharding { reason: String },
    /// The test filter cannot be used
    #[error("Invalid filter '{filter}': {reason}")]
    InvalidFilter { filter: String, reason: String },
    /// Invalid CLI argument value
    #[error("Invalid CLI argument: {argument}='{value}' (expected: {expected})")]
    InvalidCliArgument {
        argument: String,
        value: String,
        expected: String,
    },
    /// An environment variable could not be read
    #[error("Cannot read environment variable {key}: {reason}")]
    EnvUnavailable { key: String, reason: String },
}

/// Typed environment configuration operations
pub struct EnvConfig;

impl EnvConfig {
    /// Get the filter string from the process environment
    pub fn get_filter() -> Result<Option<String>, ConfigError> {
        Self::get_filter_with_reader(&SystemEnvReader)
    }

    /// Get the filter string with a custom reader
    pub fn get_filter_with_reader<R: EnvReader>(reader: &R) -> Result<Option<String>, ConfigError> {
        reader.get_var(FILTER_ENV)
    }

    pub fn get_also_run_disabled_tests_with_reader<R: EnvReader>(
        reader: &R,
    ) -> Result<Option<bool>, ConfigError> {
        Self::get_bool(reader, ALSO_RUN_DISABLED_TESTS_ENV)
    }

    pub fn get_shuffle_with_reader<R: EnvReader>(reader: &R) -> Result<Option<bool>, ConfigError> {
        Self::get_bool(reader, SHUFFLE_ENV)
    }

    /// Seed in `[0, 99999]`; 0 derives the seed from the clock
    pub fn get_random_seed_with_reader<R: EnvReader>(
        reader: &R,
    ) -> Result<Option<u32>, ConfigError> {
        reader
            .get_var(RANDOM_SEED_ENV)?
            .map(|value| {
                value
                    .trim()
                    .parse::<u32>()
                    .ok()
                    .filter(|seed| *seed <= crate::random::MAX_RANDOM_SEED)
                    .ok_or_else(|| ConfigError::InvalidEnvValue {
                        key: RANDOM_SEED_ENV.to_owned(),
                        value: value.clone(),
                        expected: "an integer in [0, 99999]".to_owned(),
                    })
            })
            .transpose()
    }

    /// Repeat count; negative repeats forever
    pub fn get_repeat_with_reader<R: EnvReader>(reader: &R) -> Result<Option<i32>, ConfigError> {
        reader
            .get_var(REPEAT_ENV)?
            .map(|value| Self::parse_integer(&value, REPEAT_ENV))
            .transpose()
    }

    pub fn get_catch_panics_with_reader<R: EnvReader>(
        reader: &R,
    ) -> Result<Option<bool>, ConfigError> {
        Self::get_bool(reader, CATCH_PANICS_ENV)
    }

    pub fn get_print_time_with_reader<R: EnvReader>(
        reader: &R,
    ) -> Result<Option<bool>, ConfigError> {
        Self::get_bool(reader, PRINT_TIME_ENV)
    }

    pub fn get_list_tests_with_reader<R: EnvReader>(
        reader: &R,
    ) -> Result<Option<bool>, ConfigError> {
        Self::get_bool(reader, LIST_TESTS_ENV)
    }

    /// Parse a signed integer variable, rejecting anything but optional sign and digits
    pub fn parse_integer(value: &str, key: &str) -> Result<i32, ConfigError> {
        value
            .trim()
            .parse::<i32>()
            .map_err(|_| ConfigError::InvalidEnvValue {
                key: key.to_owned(),
                value: value.to_owned(),
                expected: "a 32-bit integer".to_owned(),
            })
    }

    fn get_bool<R: EnvReader>(reader: &R, key: &str) -> Result<Option<bool>, ConfigError> {
        reader
            .get_var(key)?
            .map(|value| Self::parse_boolean_value(&value, key))
            .transpose()
    }

    /// Parse boolean value using the accepted spellings
    fn parse_boolean_value(value: &str, key: &str) -> Result<bool, ConfigError> {
        let normalized = value.trim().to_lowercase();

        ["true", "1", "yes", "on"]
            .iter()
            .any(|&v| v == normalized)
            .then_some(true)
            .or_else(|| {
                ["false", "0", "no", "off"]
                    .iter()
                    .any(|&v| v == normalized)
                    .then_some(false)
            })
            .ok_or_else(|| ConfigError::InvalidEnvValue {
                key: key.to_owned(),
                value: value.to_owned(),
                expected: "true, false, 1, 0, yes, no, on, or off".to_owned(),
            })
    }
}
