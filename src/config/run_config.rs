//! Run configuration module
//!
//! This module provides the run configuration that combines CLI arguments with
//! environment variables using a clear priority system.

use super::env_config::EnvConfig;
use super::env_reader::{EnvReader, SystemEnvReader};
use super::ConfigError;
use crate::filter::{TestFilter, UNIVERSAL_FILTER};
use crate::random::MAX_RANDOM_SEED;
use crate::shard::{self, ShardSpec};
use std::path::{Path, PathBuf};

/// CLI arguments structure
///
/// `None` means the option was not given on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliArgs {
    pub filter: Option<String>,
    pub also_run_disabled_tests: bool,
    pub shuffle: Option<bool>,
    pub random_seed: Option<u32>,
    pub repeat: Option<i32>,
    pub catch_panics: Option<bool>,
    pub print_time: Option<bool>,
    pub list_tests: bool,
}

/// Resolved options of one program run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    filter: TestFilter,
    also_run_disabled_tests: bool,
    shuffle: bool,
    random_seed: u32,
    repeat: i32,
    catch_panics: bool,
    print_time: bool,
    list_tests: bool,
    sharding: Option<ShardSpec>,
    shard_status_file: Option<PathBuf>,
}

/// Configuration builder for functional composition
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    filter: Option<TestFilter>,
    also_run_disabled_tests: Option<bool>,
    shuffle: Option<bool>,
    random_seed: Option<u32>,
    repeat: Option<i32>,
    catch_panics: Option<bool>,
    print_time: Option<bool>,
    list_tests: Option<bool>,
    sharding: Option<ShardSpec>,
    shard_status_file: Option<PathBuf>,
}

impl ConfigBuilder {
    /// Create a new configuration builder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_filter(mut self, filter: TestFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    #[must_use]
    pub const fn with_also_run_disabled_tests(mut self, enabled: bool) -> Self {
        self.also_run_disabled_tests = Some(enabled);
        self
    }

    #[must_use]
    pub const fn with_shuffle(mut self, enabled: bool) -> Self {
        self.shuffle = Some(enabled);
        self
    }

    /// Seed option in `[0, 99999]`; larger values are clamped
    #[must_use]
    pub const fn with_random_seed(mut self, seed: u32) -> Self {
        self.random_seed = Some(seed);
        self
    }

    #[must_use]
    pub const fn with_repeat(mut self, repeat: i32) -> Self {
        self.repeat = Some(repeat);
        self
    }

    #[must_use]
    pub const fn with_catch_panics(mut self, enabled: bool) -> Self {
        self.catch_panics = Some(enabled);
        self
    }

    #[must_use]
    pub const fn with_print_time(mut self, enabled: bool) -> Self {
        self.print_time = Some(enabled);
        self
    }

    #[must_use]
    pub const fn with_list_tests(mut self, enabled: bool) -> Self {
        self.list_tests = Some(enabled);
        self
    }

    #[must_use]
    pub const fn with_sharding(mut self, sharding: Option<ShardSpec>) -> Self {
        self.sharding = sharding;
        self
    }

    #[must_use]
    pub fn with_shard_status_file(mut self, path: Option<PathBuf>) -> Self {
        self.shard_status_file = path;
        self
    }

    /// Build the final RunConfig, filling unset options with defaults
    pub fn build(self) -> RunConfig {
        RunConfig {
            filter: self.filter.unwrap_or_default(),
            also_run_disabled_tests: self.also_run_disabled_tests.unwrap_or(false),
            shuffle: self.shuffle.unwrap_or(false),
            random_seed: self.random_seed.unwrap_or(0).min(MAX_RANDOM_SEED),
            repeat: self.repeat.unwrap_or(1),
            catch_panics: self.catch_panics.unwrap_or(true),
            print_time: self.print_time.unwrap_or(true),
            list_tests: self.list_tests.unwrap_or(false),
            sharding: self.sharding,
            shard_status_file: self.shard_status_file,
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        ConfigBuilder::new().build()
    }
}

impl RunConfig {
    /// Create RunConfig from CLI arguments and the process environment
    ///
    /// Priority order:
    /// 1. CLI parameters (highest priority)
    /// 2. `SUITE_RUNNER_*` environment variables
    /// 3. Hardcoded defaults
    pub fn from_cli(cli_args: CliArgs) -> Result<Self, ConfigError> {
        Self::from_cli_with_reader(cli_args, &SystemEnvReader)
    }

    /// Create RunConfig from CLI arguments with a custom environment reader
    pub fn from_cli_with_reader<R: EnvReader>(
        cli_args: CliArgs,
        reader: &R,
    ) -> Result<Self, ConfigError> {
        let builder = ConfigBuilder::new()
            .with_filter(Self::resolve_filter(&cli_args, reader)?)
            .with_also_run_disabled_tests(
                cli_args.also_run_disabled_tests
                    || EnvConfig::get_also_run_disabled_tests_with_reader(reader)?.unwrap_or(false),
            )
            .with_shuffle(Self::resolve_flag(
                cli_args.shuffle,
                EnvConfig::get_shuffle_with_reader(reader)?,
                false,
            ))
            .with_random_seed(Self::resolve_random_seed(&cli_args, reader)?)
            .with_repeat(match cli_args.repeat {
                Some(repeat) => repeat,
                None => EnvConfig::get_repeat_with_reader(reader)?.unwrap_or(1),
            })
            .with_catch_panics(Self::resolve_flag(
                cli_args.catch_panics,
                EnvConfig::get_catch_panics_with_reader(reader)?,
                true,
            ))
            .with_print_time(Self::resolve_flag(
                cli_args.print_time,
                EnvConfig::get_print_time_with_reader(reader)?,
                true,
            ))
            .with_list_tests(
                cli_args.list_tests || EnvConfig::get_list_tests_with_reader(reader)?.unwrap_or(false),
            )
            .with_sharding(shard::resolve_sharding(reader)?)
            .with_shard_status_file(shard::resolve_status_file(reader)?);

        Ok(builder.build())
    }

    fn resolve_flag(cli: Option<bool>, env: Option<bool>, default: bool) -> bool {
        [cli, env].into_iter().flatten().next().unwrap_or(default)
    }

    /// Resolve and parse the filter; a malformed filter is an error
    fn resolve_filter<R: EnvReader>(
        cli_args: &CliArgs,
        reader: &R,
    ) -> Result<TestFilter, ConfigError> {
        let text = match &cli_args.filter {
            Some(filter) => filter.clone(),
            None => EnvConfig::get_filter_with_reader(reader)?
                .unwrap_or_else(|| UNIVERSAL_FILTER.to_owned()),
        };
        TestFilter::parse(&text)
    }

    fn resolve_random_seed<R: EnvReader>(
        cli_args: &CliArgs,
        reader: &R,
    ) -> Result<u32, ConfigError> {
        match cli_args.random_seed {
            Some(seed) if seed > MAX_RANDOM_SEED => Err(ConfigError::InvalidCliArgument {
                argument: "--random-seed".to_owned(),
                value: seed.to_string(),
                expected: "an integer in [0, 99999]".to_owned(),
            }),
            Some(seed) => Ok(seed),
            None => Ok(EnvConfig::get_random_seed_with_reader(reader)?.unwrap_or(0)),
        }
    }

    pub fn filter(&self) -> &TestFilter {
        &self.filter
    }

    pub fn also_run_disabled_tests(&self) -> bool {
        self.also_run_disabled_tests
    }

    pub fn shuffle(&self) -> bool {
        self.shuffle
    }

    /// Seed option; 0 means derive from the clock
    pub fn random_seed(&self) -> u32 {
        self.random_seed
    }

    /// Iteration count, negative to repeat forever
    pub fn repeat(&self) -> i32 {
        self.repeat
    }

    pub fn catch_panics(&self) -> bool {
        self.catch_panics
    }

    pub fn print_time(&self) -> bool {
        self.print_time
    }

    pub fn list_tests(&self) -> bool {
        self.list_tests
    }

    pub fn sharding(&self) -> Option<ShardSpec> {
        self.sharding
    }

    pub fn shard_status_file(&self) -> Option<&Path> {
        self.shard_status_file.as_deref()
    }
}
