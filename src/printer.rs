//! Plain text result printer
//!
//! The default listener. It frames every event in the familiar
//! `[ RUN      ]` / `[       OK ]` layout and ends each iteration with a
//! summary of passed, skipped, failed and disabled tests.

use crate::config::RunConfig;
use crate::listener::TestEventListener;
use crate::result::TestPartResult;
use crate::shard::ShardSpec;
use crate::test_info::TestInfo;
use crate::test_suite::TestSuite;
use crate::unit_test::UnitTest;
use std::fmt;
use std::io::{self, ErrorKind, Write};

macro_rules! emit {
    ($printer:expr, $($arg:tt)*) => {
        $printer.write_fmt(format_args!($($arg)*))
    };
}

/// `1 test`, `3 tests`
fn countable(count: usize, singular: &str, plural: &str) -> String {
    format!("{count} {}", if count == 1 { singular } else { plural })
}

fn test_count(count: usize) -> String {
    countable(count, "test", "tests")
}

fn test_suite_count(count: usize) -> String {
    countable(count, "test suite", "test suites")
}

/// `, where TypeParam = T and GetParam() = v`, or nothing
fn param_comment(test: &TestInfo) -> String {
    let mut comment = String::new();
    if test.type_param().is_none() && test.value_param().is_none() {
        return comment;
    }
    comment.push_str(", where ");
    if let Some(type_param) = test.type_param() {
        comment.push_str("TypeParam = ");
        comment.push_str(type_param);
        if test.value_param().is_some() {
            comment.push_str(" and ");
        }
    }
    if let Some(value_param) = test.value_param() {
        comment.push_str("GetParam() = ");
        comment.push_str(value_param);
    }
    comment
}

pub struct PrettyPrinter<W: Write> {
    out: W,
    print_time: bool,
    also_run_disabled_tests: bool,
    filter: Option<String>,
    sharding: Option<ShardSpec>,
    shuffle: bool,
    repeat: i32,
    broken: bool,
}

impl PrettyPrinter<io::Stdout> {
    pub fn stdout(config: &RunConfig) -> Self {
        Self::new(io::stdout(), config)
    }
}

impl<W: Write> PrettyPrinter<W> {
    pub fn new(out: W, config: &RunConfig) -> Self {
        let filter = config.filter();
        Self {
            out,
            print_time: config.print_time(),
            also_run_disabled_tests: config.also_run_disabled_tests(),
            filter: (!filter.is_universal()).then(|| filter.as_str().to_owned()),
            sharding: config.sharding(),
            shuffle: config.shuffle(),
            repeat: config.repeat(),
            broken: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Write, giving up quietly once the reader has gone away
    fn write_fmt(&mut self, args: fmt::Arguments<'_>) {
        if self.broken {
            return;
        }
        if let Err(e) = self.out.write_fmt(args) {
            self.handle_error(e);
        }
    }

    fn flush(&mut self) {
        if self.broken {
            return;
        }
        if let Err(e) = self.out.flush() {
            self.handle_error(e);
        }
    }

    fn handle_error(&mut self, e: io::Error) {
        if e.kind() == ErrorKind::BrokenPipe {
            self.broken = true;
        } else {
            log::warn!("cannot write test output: {e}");
        }
    }

    fn print_failed_tests(&mut self, unit_test: &UnitTest) {
        let failed = unit_test.failed_test_count();
        emit!(self, "[  FAILED  ] {}, listed below:\n", test_count(failed));

        for suite in unit_test.test_suites() {
            if !suite.should_run() || suite.failed_test_count() == 0 {
                continue;
            }
            for test in suite.tests() {
                if !test.should_run() || !test.result().failed() {
                    continue;
                }
                emit!(
                    self,
                    "[  FAILED  ] {}{}\n",
                    test.full_name(),
                    param_comment(test)
                );
            }
        }
        emit!(
            self,
            "\n{:2} FAILED {}\n",
            failed,
            if failed == 1 { "TEST" } else { "TESTS" }
        );
    }

    fn print_failed_test_suites(&mut self, unit_test: &UnitTest) {
        let mut count = 0;
        for suite in unit_test.test_suites() {
            if suite.should_run() && suite.ad_hoc_test_result().failed() {
                emit!(
                    self,
                    "[  FAILED  ] {}: set_up_test_suite or tear_down_test_suite\n",
                    suite.name()
                );
                count += 1;
            }
        }
        if count > 0 {
            emit!(
                self,
                "\n{:2} FAILED TEST {}\n",
                count,
                if count == 1 { "SUITE" } else { "SUITES" }
            );
        }
    }

    fn print_skipped_tests(&mut self, unit_test: &UnitTest) {
        for suite in unit_test.test_suites() {
            for test in suite.tests() {
                if test.should_run() && test.result().skipped() {
                    emit!(self, "[  SKIPPED ] {}\n", test.full_name());
                }
            }
        }
    }
}

impl<W: Write> TestEventListener for PrettyPrinter<W> {
    fn on_test_iteration_start(&mut self, unit_test: &UnitTest, iteration: usize) {
        if self.repeat != 1 {
            emit!(
                self,
                "\nRepeating all tests (iteration {}) . . .\n\n",
                iteration + 1
            );
        }
        if let Some(filter) = self.filter.clone() {
            emit!(self, "Note: filter = {filter}\n");
        }
        if let Some(shard) = self.sharding {
            emit!(
                self,
                "Note: This is test shard {} of {}.\n",
                shard.index() + 1,
                shard.total()
            );
        }
        if self.shuffle {
            emit!(
                self,
                "Note: Randomizing tests' orders with a seed of {} .\n",
                unit_test.random_seed()
            );
        }
        emit!(
            self,
            "[==========] Running {} from {}.\n",
            test_count(unit_test.test_to_run_count()),
            test_suite_count(unit_test.test_suite_to_run_count())
        );
        self.flush();
    }

    fn on_environments_set_up_start(&mut self, _unit_test: &UnitTest) {
        emit!(self, "[----------] Global test environment set-up.\n");
        self.flush();
    }

    fn on_test_suite_start(&mut self, test_suite: &TestSuite) {
        emit!(
            self,
            "[----------] {} from {}",
            test_count(test_suite.test_to_run_count()),
            test_suite.name()
        );
        match test_suite.type_param() {
            Some(type_param) => emit!(self, ", where TypeParam = {type_param}\n"),
            None => emit!(self, "\n"),
        }
        self.flush();
    }

    fn on_test_start(&mut self, test_info: &TestInfo) {
        emit!(self, "[ RUN      ] {}\n", test_info.full_name());
        self.flush();
    }

    fn on_test_part_result(&mut self, result: &TestPartResult) {
        if result.passed() {
            return;
        }
        emit!(self, "{result}\n");
        self.flush();
    }

    fn on_test_end(&mut self, test_info: &TestInfo) {
        let result = test_info.result();
        if result.passed() {
            emit!(self, "[       OK ] ");
        } else if result.skipped() {
            emit!(self, "[  SKIPPED ] ");
        } else {
            emit!(self, "[  FAILED  ] ");
        }
        emit!(self, "{}", test_info.full_name());
        if result.failed() {
            emit!(self, "{}", param_comment(test_info));
        }
        if self.print_time {
            emit!(self, " ({} ms)\n", result.elapsed_time().as_millis());
        } else {
            emit!(self, "\n");
        }
        self.flush();
    }

    fn on_test_suite_end(&mut self, test_suite: &TestSuite) {
        if !self.print_time {
            return;
        }
        emit!(
            self,
            "[----------] {} from {} ({} ms total)\n\n",
            test_count(test_suite.test_to_run_count()),
            test_suite.name(),
            test_suite.elapsed_time().as_millis()
        );
        self.flush();
    }

    fn on_environments_tear_down_start(&mut self, _unit_test: &UnitTest) {
        emit!(self, "[----------] Global test environment tear-down\n");
        self.flush();
    }

    fn on_test_iteration_end(&mut self, unit_test: &UnitTest, _iteration: usize) {
        emit!(
            self,
            "[==========] {} from {} ran.",
            test_count(unit_test.test_to_run_count()),
            test_suite_count(unit_test.test_suite_to_run_count())
        );
        if self.print_time {
            emit!(self, " ({} ms total)", unit_test.elapsed_time().as_millis());
        }
        emit!(self, "\n");
        emit!(
            self,
            "[  PASSED  ] {}.\n",
            test_count(unit_test.successful_test_count())
        );

        let skipped = unit_test.skipped_test_count();
        if skipped > 0 {
            emit!(self, "[  SKIPPED ] {}, listed below:\n", test_count(skipped));
            self.print_skipped_tests(unit_test);
        }

        if !unit_test.passed() {
            self.print_failed_tests(unit_test);
            self.print_failed_test_suites(unit_test);
        }

        let disabled = unit_test.reportable_disabled_test_count();
        if disabled > 0 && !self.also_run_disabled_tests {
            if unit_test.passed() {
                emit!(self, "\n");
            }
            emit!(
                self,
                "  YOU HAVE {} DISABLED {}\n\n",
                disabled,
                if disabled == 1 { "TEST" } else { "TESTS" }
            );
        }
        self.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigBuilder;
    use crate::context::{BodyResult, TestContext};
    use crate::filter::TestFilter;
    use crate::program::TestProgram;
    use crate::test_info::TestRegistration;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuffer {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.borrow()).into_owned()
        }
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::from(ErrorKind::BrokenPipe))
        }
    }

    fn pass(_ctx: &TestContext) -> BodyResult {
        Ok(())
    }

    fn divide(ctx: &TestContext) -> BodyResult {
        Err(ctx.fail("division by zero"))
    }

    fn run_printed(config: RunConfig, registrations: Vec<TestRegistration>) -> String {
        let buffer = SharedBuffer::default();
        let mut program = TestProgram::new(config);
        let printer = PrettyPrinter::new(buffer.clone(), program.config());
        program.listeners_mut().set_default_result_printer(Box::new(printer));
        program.register_all(registrations).unwrap();
        let _ = program.run_all_tests().unwrap();
        buffer.text()
    }

    /// **What is tested:** Output of a run with a failure and a disabled test
    /// **Why it is tested:** Users and tools read results from this layout
    /// **Test conditions:** Math.Add passes, Math.Div fails, one disabled test, timing off
    /// **Expectations:** Exact framing, failure listing and disabled notice
    #[test]
    fn test_failed_run_output() {
        let config = ConfigBuilder::new().with_print_time(false).build();
        let output = run_printed(
            config,
            vec![
                TestRegistration::function("Math", "Add", pass),
                TestRegistration::function("Math", "Div", divide),
                TestRegistration::function("Math", "DISABLED_Slow", pass),
            ],
        );

        let expected_start = "[==========] Running 2 tests from 1 test suite.\n\
             [----------] Global test environment set-up.\n\
             [----------] 2 tests from Math\n\
             [ RUN      ] Math.Add\n\
             [       OK ] Math.Add\n\
             [ RUN      ] Math.Div\n";
        assert!(output.starts_with(expected_start), "{output}");
        assert!(output.contains(" Failure\ndivision by zero\n[  FAILED  ] Math.Div\n"));

        let expected_end = "[----------] Global test environment tear-down\n\
             [==========] 2 tests from 1 test suite ran.\n\
             [  PASSED  ] 1 test.\n\
             [  FAILED  ] 1 test, listed below:\n\
             [  FAILED  ] Math.Div\n\
             \n 1 FAILED TEST\n  YOU HAVE 1 DISABLED TEST\n\n";
        assert!(output.ends_with(expected_end), "{output}");
    }

    /// **What is tested:** Notes printed at iteration start
    /// **Why it is tested:** Filter, shard, seed and repeat settings must be visible in logs
    /// **Test conditions:** Non-universal filter, two shards, shuffle with seed 5, repeat 2
    /// **Expectations:** Each note present, iteration banner per repeat
    #[test]
    fn test_iteration_notes() {
        let config = ConfigBuilder::new()
            .with_filter(TestFilter::parse("Math.*").unwrap())
            .with_sharding(crate::shard::ShardSpec::new(2, 1).unwrap())
            .with_shuffle(true)
            .with_random_seed(5)
            .with_repeat(2)
            .build();
        let output = run_printed(config, vec![TestRegistration::function("Math", "Add", pass)]);

        assert!(output.contains("\nRepeating all tests (iteration 1) . . .\n\n"));
        assert!(output.contains("\nRepeating all tests (iteration 2) . . .\n\n"));
        assert!(output.contains("Note: filter = Math.*\n"));
        assert!(output.contains("Note: This is test shard 2 of 2.\n"));
        assert!(output.contains("Note: Randomizing tests' orders with a seed of 5 .\n"));
        assert!(output.contains("Note: Randomizing tests' orders with a seed of 6 .\n"));
        assert!(output.contains("[==========] Running 0 tests from 0 test suites.\n"));
    }

    /// **What is tested:** Skips, parameters and timing
    /// **Why it is tested:** Skipped tests are listed and failed parameterized tests name their parameters
    /// **Test conditions:** Skipped test and failing value-parameterized test, timing on
    /// **Expectations:** SKIPPED listing, parameter comment and millisecond timings
    #[test]
    fn test_skips_params_and_timing() {
        let output = run_printed(
            RunConfig::default(),
            vec![
                TestRegistration::function("Skipping", "Later", |ctx| Err(ctx.skip("not now"))),
                TestRegistration::function("Params", "IsPositive/1", divide).with_value_param(-1),
            ],
        );

        assert!(output.contains("[  SKIPPED ] Skipping.Later ("));
        assert!(output.contains("[  SKIPPED ] 1 test, listed below:\n[  SKIPPED ] Skipping.Later\n"));
        assert!(output.contains("[  FAILED  ] Params.IsPositive/1, where GetParam() = -1 ("));
        assert!(output.contains("[----------] 1 test from Params ("));
        assert!(output.contains(" ms total)\n"));
    }

    /// **What is tested:** Broken pipe handling
    /// **Why it is tested:** Piping output into `head` must not fail the run
    /// **Test conditions:** Printer writing to a sink that always reports a broken pipe
    /// **Expectations:** Run completes and the printer marks itself broken
    #[test]
    fn test_broken_pipe_is_ignored() {
        let mut printer = PrettyPrinter::new(BrokenPipe, &RunConfig::default());
        printer.on_test_part_result(&TestPartResult::new(
            crate::result::PartKind::FatalFailure,
            crate::result::SourceLocation::unknown(),
            "x",
        ));
        assert!(printer.broken);
        printer.on_test_program_end(&UnitTest::new());
    }

    /// **What is tested:** Parameter comment rendering
    /// **Why it is tested:** Typed and value-parameterized failures are reported with both parameters
    /// **Test conditions:** TestInfo with both parameters, and one with none
    /// **Expectations:** Joined with ` and `, empty without parameters
    #[test]
    fn test_param_comment() {
        let both = TestInfo::new(
            TestRegistration::function("T", "t", pass)
                .with_type_param("i32")
                .with_value_param(3),
        );
        assert_eq!(
            param_comment(&both),
            ", where TypeParam = i32 and GetParam() = 3"
        );
        let none = TestInfo::new(TestRegistration::function("T", "t", pass));
        assert_eq!(param_comment(&none), "");
        assert_eq!(test_suite_count(1), "1 test suite");
        assert_eq!(test_count(0), "0 tests");
    }
}
