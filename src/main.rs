//! CLI entry point for suite-runner
//!
//! Runs the bundled sample test program with options taken from the command
//! line and the `SUITE_RUNNER_*` environment variables.

mod samples;

use anyhow::Context;
use clap::{ArgAction, Parser};
use std::process;

use suite_runner::config::CliArgs;
use suite_runner::{exit_code, ConfigError, RunConfig, TestProgram};

/// xUnit-style test runner with filtering, sharding and shuffling
#[derive(Parser)]
#[command(name = "suite-runner")]
#[command(version, about, long_about = None)]
struct Args {
    /// Run only tests whose `Suite.Test` name matches the filter
    #[arg(
        long,
        value_name = "PATTERNS",
        long_help = "Colon-separated positive patterns, optionally followed by '-' and \
                     colon-separated negative patterns. '*' matches any substring and \
                     '?' any single character. Overrides SUITE_RUNNER_FILTER."
    )]
    filter: Option<String>,

    /// Run tests whose suite or test name starts with DISABLED_
    #[arg(long, action = ArgAction::SetTrue)]
    also_run_disabled_tests: bool,

    /// Randomize the order of suites and tests
    #[arg(long, overrides_with = "no_shuffle", action = ArgAction::SetTrue)]
    shuffle: bool,

    /// Keep registration order (overrides SUITE_RUNNER_SHUFFLE)
    #[arg(long, overrides_with = "shuffle", action = ArgAction::SetTrue)]
    no_shuffle: bool,

    /// Shuffle seed; 0 derives the seed from the clock
    #[arg(long, value_name = "SEED", value_parser = clap::value_parser!(u32).range(0..=99_999))]
    random_seed: Option<u32>,

    /// Number of iterations; a negative count repeats forever
    #[arg(long, value_name = "N", allow_negative_numbers = true)]
    repeat: Option<i32>,

    /// Turn panics in tests into failures
    #[arg(long, overrides_with = "no_catch_panics", action = ArgAction::SetTrue)]
    catch_panics: bool,

    /// Let panics in tests abort the run
    #[arg(long, overrides_with = "catch_panics", action = ArgAction::SetTrue)]
    no_catch_panics: bool,

    /// Print elapsed times
    #[arg(long, overrides_with = "no_print_time", action = ArgAction::SetTrue)]
    print_time: bool,

    /// Do not print elapsed times
    #[arg(long, overrides_with = "print_time", action = ArgAction::SetTrue)]
    no_print_time: bool,

    /// List matching tests instead of running them
    #[arg(long, action = ArgAction::SetTrue)]
    list_tests: bool,
}

/// Collapse a `--flag` / `--no-flag` pair; neither given means unset
fn flag_pair(enabled: bool, disabled: bool) -> Option<bool> {
    match (enabled, disabled) {
        (true, _) => Some(true),
        (false, true) => Some(false),
        (false, false) => None,
    }
}

/// Convert CLI args to CliArgs struct for RunConfig
impl From<Args> for CliArgs {
    fn from(args: Args) -> Self {
        Self {
            filter: args.filter,
            also_run_disabled_tests: args.also_run_disabled_tests,
            shuffle: flag_pair(args.shuffle, args.no_shuffle),
            random_seed: args.random_seed,
            repeat: args.repeat,
            catch_panics: flag_pair(args.catch_panics, args.no_catch_panics),
            print_time: flag_pair(args.print_time, args.no_print_time),
            list_tests: args.list_tests,
        }
    }
}

/// Report a configuration error and exit before any test runs
fn handle_config_error(error: ConfigError) -> ! {
    let error_message = match error {
        ConfigError::InvalidEnvValue { .. } => "Invalid environment variable",
        ConfigError::InconsistentSharding { .. } => "Invalid sharding configuration",
        ConfigError::InvalidFilter { .. } => "Invalid filter",
        ConfigError::InvalidCliArgument { .. } => "Invalid CLI argument",
        ConfigError::EnvUnavailable { .. } => "Configuration error",
    };

    eprintln!("{error_message}: {error}");
    process::exit(1);
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let config = Args::parse()
        .pipe(CliArgs::from)
        .pipe(RunConfig::from_cli)
        .unwrap_or_else(|error| handle_config_error(error));

    let mut program = TestProgram::new(config);
    samples::register(&mut program).context("failed to register the sample tests")?;
    program.install_default_printer();

    let passed = program.run_all_tests().context("test run failed")?;
    process::exit(exit_code(passed));
}

/// Helper trait for functional pipeline composition
trait Pipe<T> {
    fn pipe<U, F>(self, f: F) -> U
    where
        F: FnOnce(Self) -> U,
        Self: Sized;
}

impl<T> Pipe<T> for T {
    fn pipe<U, F>(self, f: F) -> U
    where
        F: FnOnce(Self) -> U,
    {
        f(self)
    }
}
