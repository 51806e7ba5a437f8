//! Unified Test Framework
//!
//! Runs the `suite-runner` binary with chosen arguments and environment and
//! validates its output against a list of expectations.

use assert_cmd::Command as AssertCommand;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::Output;

/// Main result type for the framework
pub type Result<T = ()> = std::result::Result<T, Box<dyn Error>>;

/// Environment variables the binary reads; cleared for every command
const RUNNER_ENV: &[&str] = &[
    "SUITE_RUNNER_FILTER",
    "SUITE_RUNNER_ALSO_RUN_DISABLED_TESTS",
    "SUITE_RUNNER_SHUFFLE",
    "SUITE_RUNNER_RANDOM_SEED",
    "SUITE_RUNNER_REPEAT",
    "SUITE_RUNNER_CATCH_PANICS",
    "SUITE_RUNNER_PRINT_TIME",
    "SUITE_RUNNER_LIST_TESTS",
    "TEST_TOTAL_SHARDS",
    "TEST_SHARD_INDEX",
    "TEST_SHARD_STATUS_FILE",
];

/// Main test case orchestrator
#[derive(Debug)]
pub struct TestCase {
    name: String,
    command: TestCommand,
    expectations: Vec<Expectation>,
}

#[allow(dead_code)]
impl TestCase {
    /// Create a new test case
    pub fn new<S: AsRef<str>>(name: S) -> Self {
        Self {
            name: name.as_ref().to_string(),
            command: TestCommand::new(),
            expectations: Vec::new(),
        }
    }

    /// Set the command for this test
    pub fn with_command(mut self, command: TestCommand) -> Self {
        self.command = command;
        self
    }

    /// Add an expectation
    pub fn expect(mut self, expectation: Expectation) -> Self {
        self.expectations.push(expectation);
        self
    }

    pub fn expect_success(self) -> Self {
        self.expect(Expectation::Success)
    }

    pub fn expect_failure(self) -> Self {
        self.expect(Expectation::Failure)
    }

    /// Expect stdout contains text
    pub fn expect_contains<S: AsRef<str>>(self, text: S) -> Self {
        self.expect(Expectation::Contains(text.as_ref().to_string()))
    }

    /// Expect stdout excludes text
    pub fn expect_excludes<S: AsRef<str>>(self, text: S) -> Self {
        self.expect(Expectation::Excludes(text.as_ref().to_string()))
    }

    /// Expect stderr contains text
    pub fn expect_stderr_contains<S: AsRef<str>>(self, text: S) -> Self {
        self.expect(Expectation::StderrContains(text.as_ref().to_string()))
    }

    pub fn expect_exit_code(self, code: i32) -> Self {
        self.expect(Expectation::ExitCode(code))
    }

    /// Run the test case, validating every expectation
    pub fn run(self) -> Result<CommandOutput> {
        let output = self.command.execute()?;
        for expectation in &self.expectations {
            expectation
                .validate(&output)
                .map_err(|e| format!("{}: {e}\nstdout:\n{}", self.name, output.stdout()))?;
        }
        Ok(output)
    }
}

/// Test command
#[derive(Debug, Clone)]
pub struct TestCommand {
    binary: String,
    args: Vec<String>,
    envs: Vec<(String, String)>,
    working_dir: Option<PathBuf>,
}

#[allow(dead_code)]
impl TestCommand {
    /// Create a new command
    pub fn new() -> Self {
        Self {
            binary: "suite-runner".to_string(),
            args: Vec::new(),
            envs: Vec::new(),
            working_dir: None,
        }
    }

    /// Set working directory
    pub fn in_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.working_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Add argument
    pub fn arg<S: AsRef<str>>(mut self, arg: S) -> Self {
        self.args.push(arg.as_ref().to_string());
        self
    }

    /// Set an environment variable for the child only
    pub fn env<K: AsRef<str>, V: AsRef<str>>(mut self, key: K, value: V) -> Self {
        self.envs
            .push((key.as_ref().to_string(), value.as_ref().to_string()));
        self
    }

    pub fn filter<S: AsRef<str>>(self, filter: S) -> Self {
        self.arg("--filter").arg(filter)
    }

    /// Run on one shard of `total`
    pub fn shard(self, total: u32, index: u32) -> Self {
        self.env("TEST_TOTAL_SHARDS", total.to_string())
            .env("TEST_SHARD_INDEX", index.to_string())
    }

    pub fn args_len(&self) -> usize {
        self.args.len()
    }

    /// Execute the command
    pub fn execute(self) -> Result<CommandOutput> {
        let mut cmd = AssertCommand::cargo_bin(&self.binary)?;

        for key in RUNNER_ENV {
            cmd.env_remove(key);
        }
        cmd.env_remove("RUST_LOG");

        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }
        for (key, value) in &self.envs {
            cmd.env(key, value);
        }
        cmd.args(&self.args);

        Ok(CommandOutput::from_output(cmd.output()?))
    }
}

impl Default for TestCommand {
    fn default() -> Self {
        Self::new()
    }
}

/// Command output
#[derive(Debug)]
pub struct CommandOutput {
    output: Output,
    stdout: String,
    stderr: String,
}

#[allow(dead_code)]
impl CommandOutput {
    pub(crate) fn from_output(output: Output) -> Self {
        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        Self {
            output,
            stdout,
            stderr,
        }
    }

    pub fn is_success(&self) -> bool {
        self.output.status.success()
    }

    pub fn stdout(&self) -> &str {
        &self.stdout
    }

    pub fn stderr(&self) -> &str {
        &self.stderr
    }

    pub fn exit_code(&self) -> Option<i32> {
        self.output.status.code()
    }

    /// Names from `[ RUN      ]` lines, in run order
    pub fn run_tests(&self) -> Vec<&str> {
        self.stdout
            .lines()
            .filter_map(|line| line.strip_prefix("[ RUN      ] "))
            .collect()
    }
}

/// Test expectation
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub enum Expectation {
    Success,
    Failure,
    Contains(String),
    Excludes(String),
    StderrContains(String),
    ExitCode(i32),
}

impl Expectation {
    /// Validate expectation against output
    pub fn validate(&self, output: &CommandOutput) -> Result<()> {
        match self {
            Expectation::Success => {
                if output.is_success() {
                    Ok(())
                } else {
                    Err("Expected success but command failed".to_string().into())
                }
            }
            Expectation::Failure => {
                if !output.is_success() {
                    Ok(())
                } else {
                    Err("Expected failure but command succeeded".to_string().into())
                }
            }
            Expectation::Contains(text) => {
                if output.stdout().contains(text) {
                    Ok(())
                } else {
                    Err(format!("Expected output to contain '{text}'").into())
                }
            }
            Expectation::Excludes(text) => {
                if !output.stdout().contains(text) {
                    Ok(())
                } else {
                    Err(format!("Expected output to exclude '{text}'").into())
                }
            }
            Expectation::StderrContains(text) => {
                if output.stderr().contains(text) {
                    Ok(())
                } else {
                    Err(format!("Expected stderr to contain '{text}'").into())
                }
            }
            Expectation::ExitCode(code) => {
                if output.exit_code() == Some(*code) {
                    Ok(())
                } else {
                    Err(format!(
                        "Expected exit code {} but got {:?}",
                        code,
                        output.exit_code()
                    )
                    .into())
                }
            }
        }
    }
}
