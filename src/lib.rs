//! suite-runner library
//!
//! An xUnit-style test execution engine: register tests and fixtures, then
//! run them with filtering, sharding, shuffling, repetition and panic
//! containment while listeners observe every step.
//!
//! # Examples
//!
//! Basic usage:
//!
//! ```rust
//! use suite_runner::{RunConfig, TestProgram, TestRegistration};
//!
//! let mut program = TestProgram::new(RunConfig::default());
//! program.register(TestRegistration::function("Math", "Add", |ctx| {
//!     ctx.assert_eq(4, 2 + 2)
//! }))?;
//! program.register(TestRegistration::function("Math", "Div", |ctx| {
//!     Err(ctx.fail("division by zero"))
//! }))?;
//!
//! let passed = program.run_all_tests()?;
//! assert!(!passed);
//! assert_eq!(program.unit_test().failed_test_count(), 1);
//! # Ok::<(), suite_runner::Error>(())
//! ```

pub mod config;
pub mod containment;
pub mod context;
pub mod error;
mod execution;
pub mod filter;
pub mod fixture;
pub mod listener;
pub mod printer;
pub mod program;
pub mod random;
pub mod result;
pub mod shard;
pub mod test_info;
pub mod test_suite;

pub use config::{CliArgs, ConfigBuilder, ConfigError, RunConfig};
pub use context::{Abort, BodyResult, CurrentTest, TestContext};
pub use error::{Error, Result};
pub use filter::TestFilter;
pub use fixture::{Environment, Fixture, FixtureClass, SuiteHooks, Test, TestFactory};
pub use listener::{ListenerId, TestEventListener, TestEventListeners};
pub use printer::PrettyPrinter;
pub use program::{exit_code, TestProgram};
pub use result::{PartKind, SourceLocation, TestPartResult, TestProperty, TestResult};
pub use shard::ShardSpec;
pub use test_info::{TestInfo, TestRegistration};
pub use test_suite::TestSuite;
pub use unit_test::{RunState, UnitTest};
