//! Event recording listener
//!
//! Appends one line per listener event to a shared log so tests can assert on
//! the exact event sequence of a run.

use std::cell::RefCell;
use std::rc::Rc;
use suite_runner::{
    PartKind, RunConfig, TestEventListener, TestInfo, TestPartResult, TestProgram, TestSuite,
    UnitTest,
};

/// Shared handle to the recorded events
#[derive(Debug, Clone, Default)]
pub struct EventLog(Rc<RefCell<Vec<String>>>);

#[allow(dead_code)]
impl EventLog {
    pub fn events(&self) -> Vec<String> {
        self.0.borrow().clone()
    }

    /// Events starting with `prefix`
    pub fn matching(&self, prefix: &str) -> Vec<String> {
        self.0
            .borrow()
            .iter()
            .filter(|event| event.starts_with(prefix))
            .cloned()
            .collect()
    }

    fn push(&self, event: String) {
        self.0.borrow_mut().push(event);
    }
}

pub struct RecordingListener {
    log: EventLog,
}

impl RecordingListener {
    pub fn new(log: &EventLog) -> Self {
        Self { log: log.clone() }
    }
}

impl TestEventListener for RecordingListener {
    fn on_test_program_start(&mut self, _unit_test: &UnitTest) {
        self.log.push("program_start".to_owned());
    }

    fn on_test_iteration_start(&mut self, _unit_test: &UnitTest, iteration: usize) {
        self.log.push(format!("iteration_start {iteration}"));
    }

    fn on_environments_set_up_start(&mut self, _unit_test: &UnitTest) {
        self.log.push("env_set_up_start".to_owned());
    }

    fn on_environments_set_up_end(&mut self, _unit_test: &UnitTest) {
        self.log.push("env_set_up_end".to_owned());
    }

    fn on_test_suite_start(&mut self, test_suite: &TestSuite) {
        self.log.push(format!("suite_start {}", test_suite.name()));
    }

    fn on_test_start(&mut self, test_info: &TestInfo) {
        self.log.push(format!("test_start {}", test_info.full_name()));
    }

    fn on_test_part_result(&mut self, result: &TestPartResult) {
        let kind = match result.kind() {
            PartKind::Success => "success",
            PartKind::NonFatalFailure => "nonfatal",
            PartKind::FatalFailure => "fatal",
            PartKind::Skip => "skip",
        };
        self.log.push(format!("part {kind} {}", result.message()));
    }

    fn on_test_end(&mut self, test_info: &TestInfo) {
        let result = test_info.result();
        let status = if result.passed() {
            "passed"
        } else if result.skipped() {
            "skipped"
        } else {
            "failed"
        };
        self.log
            .push(format!("test_end {} {status}", test_info.full_name()));
    }

    fn on_test_suite_end(&mut self, test_suite: &TestSuite) {
        self.log.push(format!("suite_end {}", test_suite.name()));
    }

    fn on_environments_tear_down_start(&mut self, _unit_test: &UnitTest) {
        self.log.push("env_tear_down_start".to_owned());
    }

    fn on_environments_tear_down_end(&mut self, _unit_test: &UnitTest) {
        self.log.push("env_tear_down_end".to_owned());
    }

    fn on_test_iteration_end(&mut self, unit_test: &UnitTest, iteration: usize) {
        self.log.push(format!(
            "iteration_end {iteration} {}",
            if unit_test.passed() { "passed" } else { "failed" }
        ));
    }

    fn on_test_program_end(&mut self, _unit_test: &UnitTest) {
        self.log.push("program_end".to_owned());
    }
}

/// A program with a recording listener attached and no printer
#[allow(dead_code)]
pub fn recorded_program(config: RunConfig) -> (TestProgram, EventLog) {
    let log = EventLog::default();
    let mut program = TestProgram::new(config);
    program
        .listeners_mut()
        .append(Box::new(RecordingListener::new(&log)));
    (program, log)
}
