//! The test program
//!
//! [`TestProgram`] is the engine a binary drives: tests and environments are
//! registered into it, then [`TestProgram::run_all_tests`] filters, shards,
//! shuffles and runs them while listeners observe every step.

use crate::config::RunConfig;
use crate::context::Recorder;
use crate::error::{Error, Result};
use crate::execution::now_millis;
use crate::fixture::Environment;
use crate::listener::{TestEventListener, TestEventListeners};
use crate::printer::PrettyPrinter;
use crate::random::{next_random_seed, normalize_seed, Random};
use crate::result::{PartKind, PropertyScope, SourceLocation, TestPartResult, TestProperty};
use crate::shard::touch_status_file;
use crate::test_info::TestRegistration;
use crate::unit_test::{RunState, UnitTest};
use std::fmt::Display;
use std::io::{self, Write};
use std::time::Instant;

/// Exit status for a finished run
pub fn exit_code(passed: bool) -> i32 {
    if passed {
        0
    } else {
        1
    }
}

pub struct TestProgram {
    config: RunConfig,
    unit_test: UnitTest,
    listeners: TestEventListeners,
    environments: Vec<Box<dyn Environment>>,
    recorder: Recorder,
    random: Random,
}

impl TestProgram {
    pub fn new(config: RunConfig) -> Self {
        Self {
            config,
            unit_test: UnitTest::new(),
            listeners: TestEventListeners::new(),
            environments: Vec::new(),
            recorder: Recorder::new(),
            random: Random::new(0),
        }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn unit_test(&self) -> &UnitTest {
        &self.unit_test
    }

    pub fn listeners_mut(&mut self) -> &mut TestEventListeners {
        &mut self.listeners
    }

    /// Register one test
    ///
    /// Fails on a duplicate `(suite, test)` pair or once the run has started.
    pub fn register(&mut self, registration: TestRegistration) -> Result<()> {
        self.unit_test.add_test(registration)
    }

    /// Register a batch of tests, stopping at the first error
    pub fn register_all<I>(&mut self, registrations: I) -> Result<()>
    where
        I: IntoIterator<Item = TestRegistration>,
    {
        registrations
            .into_iter()
            .try_for_each(|registration| self.register(registration))
    }

    /// Add a global environment; set-ups run in insertion order, tear-downs in reverse
    pub fn add_environment(&mut self, environment: Box<dyn Environment>) {
        self.environments.push(environment);
    }

    /// Install the plain text printer on stdout as the default result printer
    pub fn install_default_printer(&mut self) {
        let printer = PrettyPrinter::stdout(&self.config);
        self.listeners.set_default_result_printer(Box::new(printer));
    }

    /// Record a property on the program's ad hoc result
    ///
    /// Reserved keys are rejected with a non-fatal failure.
    #[track_caller]
    pub fn record_property<K: Into<String>, V: Display>(&mut self, key: K, value: V) {
        let location = SourceLocation::caller();
        let property = TestProperty::new(key, value.to_string());
        let ad_hoc = self.unit_test.ad_hoc_test_result_mut();
        if let Err(reserved) = ad_hoc.record_property(PropertyScope::TestSuites, property) {
            let part = TestPartResult::new(PartKind::NonFatalFailure, location, reserved.to_string());
            self.listeners.repeater_mut().on_test_part_result(&part);
            self.unit_test.ad_hoc_test_result_mut().add_part(part);
        }
    }

    /// Print the tests selected by the configured filter without running them
    pub fn list_tests<W: Write>(&mut self, out: &mut W) -> Result<()> {
        self.filter_tests();
        self.unit_test.list_tests_matching_filter(out)?;
        Ok(())
    }

    fn filter_tests(&mut self) -> usize {
        self.unit_test.filter_tests(
            self.config.filter(),
            self.config.also_run_disabled_tests(),
            self.config.sharding(),
        )
    }

    /// Run all selected tests
    ///
    /// Returns `Ok(true)` when every iteration passed. A program runs at most
    /// once.
    pub fn run_all_tests(&mut self) -> Result<bool> {
        if self.unit_test.state() != RunState::NotStarted {
            return Err(Error::invalid_state("run_all_tests() can only be called once"));
        }
        self.unit_test.set_state(RunState::Running);
        let outcome = self.run_started();
        self.unit_test.set_state(RunState::Completed);
        outcome
    }

    fn run_started(&mut self) -> Result<bool> {
        if let Some(path) = self.config.shard_status_file() {
            touch_status_file(path)?;
        }

        let has_tests = self.filter_tests() > 0;

        if self.config.list_tests() {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            self.unit_test.list_tests_matching_filter(&mut out)?;
            return Ok(true);
        }

        let shuffle = self.config.shuffle();
        let catch_panics = self.config.catch_panics();
        let mut seed = if shuffle {
            normalize_seed(self.config.random_seed(), now_millis())
        } else {
            0
        };
        self.unit_test.set_random_seed(seed);
        self.unit_test.set_start_timestamp(now_millis());

        log::info!(
            "running {} tests from {} test suites",
            self.unit_test.test_to_run_count(),
            self.unit_test.test_suite_to_run_count()
        );
        self.listeners
            .repeater_mut()
            .on_test_program_start(&self.unit_test);

        let repeat = self.config.repeat();
        let mut failed = false;
        let mut iteration = 0usize;
        while repeat < 0 || iteration < repeat.unsigned_abs() as usize {
            self.run_iteration(iteration, has_tests, shuffle, catch_panics, seed);
            if !self.unit_test.passed() {
                failed = true;
            }
            if shuffle {
                seed = next_random_seed(seed);
                self.unit_test.set_random_seed(seed);
            }
            iteration += 1;
        }

        self.listeners
            .repeater_mut()
            .on_test_program_end(&self.unit_test);
        log::info!(
            "finished {iteration} iteration(s), {}",
            if failed { "failed" } else { "passed" }
        );
        Ok(!failed)
    }

    fn run_iteration(
        &mut self,
        iteration: usize,
        has_tests: bool,
        shuffle: bool,
        catch_panics: bool,
        seed: u32,
    ) {
        let timer = Instant::now();
        self.unit_test.clear_non_ad_hoc_test_result();

        if has_tests && shuffle {
            self.random.reseed(seed);
            self.unit_test.shuffle_tests(&mut self.random);
        }

        log::debug!("starting iteration {iteration}");
        let repeater = self.listeners.repeater_mut();
        repeater.on_test_iteration_start(&self.unit_test, iteration);

        if has_tests {
            let clean = self.unit_test.set_up_environments(
                &mut self.environments,
                repeater,
                &self.recorder,
                catch_panics,
            );
            if clean {
                self.unit_test
                    .run_suites(repeater, &self.recorder, catch_panics);
            } else {
                log::debug!("global environment set-up failed, skipping all suites");
            }
            self.unit_test.tear_down_environments(
                &mut self.environments,
                repeater,
                &self.recorder,
                catch_panics,
            );
        }

        self.unit_test.set_elapsed_time(timer.elapsed());
        repeater.on_test_iteration_end(&self.unit_test, iteration);
        self.unit_test.unshuffle_tests();
    }
}
