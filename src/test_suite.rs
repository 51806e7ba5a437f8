//! Test suites
//!
//! A suite groups the tests registered under one suite name. Tests keep their
//! registration order; shuffling only permutes the order they run in.

use crate::containment::Phase;
use crate::context::CurrentTest;
use crate::execution::{now_millis, RunEnv};
use crate::fixture::{FixtureClass, SuiteHooks};
use crate::listener::TestEventListener;
use crate::random::{shuffle, Random};
use crate::result::{PropertyScope, TestResult};
use crate::test_info::{SuiteFixture, TestInfo};
use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct TestSuite {
    name: String,
    type_param: Option<String>,
    fixture: FixtureClass,
    hooks: SuiteHooks,
    tests: Vec<TestInfo>,
    order: Vec<usize>,
    should_run: bool,
    start_timestamp: u64,
    elapsed_time: Duration,
    ad_hoc_test_result: TestResult,
}

impl TestSuite {
    pub(crate) fn new(
        name: String,
        type_param: Option<String>,
        fixture: FixtureClass,
        hooks: SuiteHooks,
    ) -> Self {
        Self {
            name,
            type_param,
            fixture,
            hooks,
            tests: Vec::new(),
            order: Vec::new(),
            should_run: false,
            start_timestamp: 0,
            elapsed_time: Duration::ZERO,
            ad_hoc_test_result: TestResult::new(),
        }
    }

    pub(crate) fn add_test(&mut self, test: TestInfo) {
        self.order.push(self.tests.len());
        self.tests.push(test);
    }

    pub(crate) fn contains_test(&self, name: &str) -> bool {
        self.tests.iter().any(|test| test.name() == name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_param(&self) -> Option<&str> {
        self.type_param.as_deref()
    }

    /// Fixture class of the first registered test
    pub fn fixture_class(&self) -> FixtureClass {
        self.fixture
    }

    pub fn should_run(&self) -> bool {
        self.should_run
    }

    pub(crate) fn set_should_run(&mut self, should_run: bool) {
        self.should_run = should_run;
    }

    /// The `i`th test in run order
    pub fn test_info(&self, i: usize) -> Option<&TestInfo> {
        let canonical = *self.order.get(i)?;
        self.tests.get(canonical)
    }

    /// The `i`th test in registration order
    pub fn test_info_canonical(&self, i: usize) -> Option<&TestInfo> {
        self.tests.get(i)
    }

    /// Tests in run order
    pub fn tests(&self) -> impl Iterator<Item = &TestInfo> + '_ {
        self.order.iter().filter_map(|&i| self.tests.get(i))
    }

    pub(crate) fn tests_canonical_mut(&mut self) -> impl Iterator<Item = &mut TestInfo> + '_ {
        self.tests.iter_mut()
    }

    pub fn successful_test_count(&self) -> usize {
        self.count(|test| test.should_run() && test.result().passed())
    }

    pub fn skipped_test_count(&self) -> usize {
        self.count(|test| test.should_run() && test.result().skipped())
    }

    pub fn failed_test_count(&self) -> usize {
        self.count(|test| test.should_run() && test.result().failed())
    }

    /// Disabled tests that would have been reported
    pub fn reportable_disabled_test_count(&self) -> usize {
        self.count(|test| test.is_reportable() && test.is_disabled())
    }

    pub fn disabled_test_count(&self) -> usize {
        self.count(TestInfo::is_disabled)
    }

    pub fn reportable_test_count(&self) -> usize {
        self.count(TestInfo::is_reportable)
    }

    pub fn test_to_run_count(&self) -> usize {
        self.count(TestInfo::should_run)
    }

    pub fn total_test_count(&self) -> usize {
        self.tests.len()
    }

    fn count<P: Fn(&TestInfo) -> bool>(&self, predicate: P) -> usize {
        self.tests.iter().filter(|test| predicate(test)).count()
    }

    pub fn passed(&self) -> bool {
        !self.failed()
    }

    /// Any selected test failed, or a suite-level hook failed
    pub fn failed(&self) -> bool {
        self.failed_test_count() > 0 || self.ad_hoc_test_result.failed()
    }

    pub fn skipped(&self) -> bool {
        !self.failed() && self.skipped_test_count() > 0
    }

    /// Result holding failures and properties recorded outside any test
    pub fn ad_hoc_test_result(&self) -> &TestResult {
        &self.ad_hoc_test_result
    }

    pub fn start_timestamp(&self) -> u64 {
        self.start_timestamp
    }

    pub fn elapsed_time(&self) -> Duration {
        self.elapsed_time
    }

    pub(crate) fn shuffle_tests(&mut self, random: &mut Random) {
        shuffle(random, &mut self.order);
    }

    pub(crate) fn unshuffle_tests(&mut self) {
        for (position, canonical) in self.order.iter_mut().enumerate() {
            *canonical = position;
        }
    }

    /// Clear the results of all tests and the suite's own result
    pub(crate) fn clear_result(&mut self) {
        self.ad_hoc_test_result.clear();
        for test in &mut self.tests {
            test.clear_result();
        }
    }

    /// Run every selected test, in run order, between the suite hooks
    pub(crate) fn run(&mut self, env: &mut RunEnv<'_>) {
        if !self.should_run {
            return;
        }

        env.set_current(Some(CurrentTest::suite(&self.name)));
        log::debug!("running test suite {}", self.name);
        env.listeners().on_test_suite_start(self);

        if let Some(hook) = self.hooks.set_up {
            env.begin_slot(PropertyScope::TestSuite, &self.ad_hoc_test_result);
            let _ = env.run_phase(Phase::SetUpTestSuite, &mut self.ad_hoc_test_result, hook);
        }

        self.start_timestamp = now_millis();
        let timer = Instant::now();

        let first_test = self
            .tests
            .first()
            .map(|test| test.name().to_owned())
            .unwrap_or_default();
        let suite = SuiteFixture {
            class: self.fixture,
            first_test: &first_test,
        };
        for position in 0..self.order.len() {
            let canonical = self.order[position];
            if let Some(test) = self.tests.get_mut(canonical) {
                test.run(env, suite);
            }
        }

        self.elapsed_time = timer.elapsed();

        if let Some(hook) = self.hooks.tear_down {
            env.begin_slot(PropertyScope::TestSuite, &self.ad_hoc_test_result);
            let _ = env.run_phase(
                Phase::TearDownTestSuite,
                &mut self.ad_hoc_test_result,
                hook,
            );
        }

        env.listeners().on_test_suite_end(self);
        env.set_current(None);
    }
}
