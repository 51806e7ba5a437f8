//! Registered tests
//!
//! A [`TestInfo`] is one registered test: its identity, the factory that
//! builds its test object, its scheduling flags and its result.

use crate::containment::Phase;
use crate::context::{BodyResult, CurrentTest, TestContext};
use crate::execution::{now_millis, RunEnv};
use crate::fixture::{
    Fixture, FixtureBody, FixtureClass, FixtureFactory, FnFactory, SuiteHooks, TestFactory,
};
use crate::listener::TestEventListener;
use crate::result::{PartKind, PropertyScope, SourceLocation, TestPartResult, TestResult};
use std::fmt::{self, Display};
use std::time::Instant;

/// Everything needed to register one test
pub struct TestRegistration {
    pub(crate) suite: String,
    pub(crate) name: String,
    pub(crate) type_param: Option<String>,
    pub(crate) value_param: Option<String>,
    pub(crate) location: SourceLocation,
    pub(crate) fixture: FixtureClass,
    pub(crate) factory: Box<dyn TestFactory>,
    pub(crate) hooks: SuiteHooks,
}

impl TestRegistration {
    /// A test without a fixture
    #[track_caller]
    pub fn function<S, N, B>(suite: S, name: N, body: B) -> Self
    where
        S: Into<String>,
        N: Into<String>,
        B: Fn(&TestContext) -> BodyResult + 'static,
    {
        Self {
            suite: suite.into(),
            name: name.into(),
            type_param: None,
            value_param: None,
            location: SourceLocation::caller(),
            fixture: FixtureClass::plain(),
            factory: Box::new(FnFactory::new(body)),
            hooks: SuiteHooks::none(),
        }
    }

    /// A test whose fixture is built with `F::default()`
    #[track_caller]
    pub fn fixture<F, S, N>(suite: S, name: N, body: FixtureBody<F>) -> Self
    where
        F: Fixture + Default,
        S: Into<String>,
        N: Into<String>,
    {
        Self::fixture_with(suite, name, F::default, body)
    }

    /// A test whose fixture is built by `make`
    #[track_caller]
    pub fn fixture_with<F, S, N, M>(suite: S, name: N, make: M, body: FixtureBody<F>) -> Self
    where
        F: Fixture,
        S: Into<String>,
        N: Into<String>,
        M: Fn() -> F + 'static,
    {
        Self {
            suite: suite.into(),
            name: name.into(),
            type_param: None,
            value_param: None,
            location: SourceLocation::caller(),
            fixture: FixtureClass::of::<F>(),
            factory: Box::new(FixtureFactory::new(make, body)),
            hooks: SuiteHooks::of::<F>(),
        }
    }

    /// A test with a custom factory and fixture class
    #[track_caller]
    pub fn with_factory<S, N>(
        suite: S,
        name: N,
        fixture: FixtureClass,
        hooks: SuiteHooks,
        factory: Box<dyn TestFactory>,
    ) -> Self
    where
        S: Into<String>,
        N: Into<String>,
    {
        Self {
            suite: suite.into(),
            name: name.into(),
            type_param: None,
            value_param: None,
            location: SourceLocation::caller(),
            fixture,
            factory,
            hooks,
        }
    }

    /// Name of the type a typed test suite is instantiated with
    #[must_use]
    pub fn with_type_param<S: Into<String>>(mut self, type_param: S) -> Self {
        self.type_param = Some(type_param.into());
        self
    }

    /// Printed form of a value-parameterized test's parameter
    #[must_use]
    pub fn with_value_param<V: Display>(mut self, value_param: V) -> Self {
        self.value_param = Some(value_param.to_string());
        self
    }

    /// Override the source location of the registration
    #[must_use]
    pub fn at(mut self, location: SourceLocation) -> Self {
        self.location = location;
        self
    }

    pub fn suite_name(&self) -> &str {
        &self.suite
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for TestRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestRegistration")
            .field("suite", &self.suite)
            .field("name", &self.name)
            .field("type_param", &self.type_param)
            .field("value_param", &self.value_param)
            .field("location", &self.location)
            .field("fixture", &self.fixture)
            .finish_non_exhaustive()
    }
}

/// Fixture class and first test name of the suite a test runs in
#[derive(Debug, Clone, Copy)]
pub(crate) struct SuiteFixture<'s> {
    pub class: FixtureClass,
    pub first_test: &'s str,
}

/// One registered test
pub struct TestInfo {
    suite_name: String,
    name: String,
    type_param: Option<String>,
    value_param: Option<String>,
    location: SourceLocation,
    fixture: FixtureClass,
    factory: Box<dyn TestFactory>,
    should_run: bool,
    is_disabled: bool,
    matches_filter: bool,
    is_in_another_shard: bool,
    result: TestResult,
}

impl TestInfo {
    pub(crate) fn new(registration: TestRegistration) -> Self {
        Self {
            suite_name: registration.suite,
            name: registration.name,
            type_param: registration.type_param,
            value_param: registration.value_param,
            location: registration.location,
            fixture: registration.fixture,
            factory: registration.factory,
            should_run: false,
            is_disabled: false,
            matches_filter: false,
            is_in_another_shard: false,
            result: TestResult::new(),
        }
    }

    pub fn test_suite_name(&self) -> &str {
        &self.suite_name
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `Suite.Test`
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.suite_name, self.name)
    }

    pub fn type_param(&self) -> Option<&str> {
        self.type_param.as_deref()
    }

    pub fn value_param(&self) -> Option<&str> {
        self.value_param.as_deref()
    }

    pub fn location(&self) -> &SourceLocation {
        &self.location
    }

    pub fn fixture_class(&self) -> FixtureClass {
        self.fixture
    }

    pub fn should_run(&self) -> bool {
        self.should_run
    }

    pub fn is_disabled(&self) -> bool {
        self.is_disabled
    }

    pub fn matches_filter(&self) -> bool {
        self.matches_filter
    }

    pub fn is_in_another_shard(&self) -> bool {
        self.is_in_another_shard
    }

    /// Counted in reports of this shard
    pub fn is_reportable(&self) -> bool {
        self.matches_filter && !self.is_in_another_shard
    }

    pub fn result(&self) -> &TestResult {
        &self.result
    }

    pub(crate) fn set_selection(
        &mut self,
        is_disabled: bool,
        matches_filter: bool,
        is_in_another_shard: bool,
        should_run: bool,
    ) {
        self.is_disabled = is_disabled;
        self.matches_filter = matches_filter;
        self.is_in_another_shard = is_in_another_shard;
        self.should_run = should_run;
    }

    pub(crate) fn clear_result(&mut self) {
        self.result.clear();
    }

    /// Run the test if it is selected
    ///
    /// Unselected tests are left untouched and produce no events.
    pub(crate) fn run(&mut self, env: &mut RunEnv<'_>, suite: SuiteFixture<'_>) {
        if !self.should_run {
            return;
        }

        env.set_current(Some(CurrentTest::test(&self.suite_name, &self.name)));
        env.listeners().on_test_start(self);

        self.result.set_start_timestamp(now_millis());
        let timer = Instant::now();
        env.begin_slot(PropertyScope::TestCase, &self.result);

        if suite.class == self.fixture {
            self.execute(env);
        } else {
            let message = self.fixture_mismatch_message(suite.first_test);
            log::debug!("{}: {}", self.full_name(), message);
            env.report(
                &mut self.result,
                TestPartResult::new(PartKind::NonFatalFailure, self.location.clone(), message),
            );
        }

        self.result.set_elapsed_time(timer.elapsed());
        env.listeners().on_test_end(self);
        env.set_current(Some(CurrentTest::suite(&self.suite_name)));
    }

    fn execute(&mut self, env: &mut RunEnv<'_>) {
        let factory = &self.factory;
        let result = &mut self.result;

        let Some(mut test) = env.run_phase(Phase::Constructor, result, |_| factory.create_test())
        else {
            return;
        };

        if !Self::stopped(result) {
            let _ = env.run_phase(Phase::SetUp, result, |ctx| test.set_up(ctx));
            if !Self::stopped(result) {
                let _ = env.run_phase(Phase::TestBody, result, |ctx| test.test_body(ctx));
            }
            let _ = env.run_phase(Phase::TearDown, result, |ctx| test.tear_down(ctx));
        }

        env.run_phase(Phase::Destructor, result, move |_| drop(test));
    }

    /// Later phases are skipped after a fatal failure or a skip
    fn stopped(result: &TestResult) -> bool {
        result.has_fatal_failure() || result.skipped()
    }

    fn fixture_mismatch_message(&self, first_test: &str) -> String {
        format!(
            "All tests in the same test suite must use the same test fixture class. \
             However, in test suite {}, you defined test {} and test {} using two \
             different test fixture classes. You should probably rename one of the \
             tests' suites to put the tests into different test suites.",
            self.suite_name, first_test, self.name
        )
    }
}

impl fmt::Debug for TestInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestInfo")
            .field("suite_name", &self.suite_name)
            .field("name", &self.name)
            .field("fixture", &self.fixture)
            .field("should_run", &self.should_run)
            .field("result", &self.result)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Recorder;
    use crate::listener::TestEventListeners;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn run_one(info: &mut TestInfo, suite_class: FixtureClass) {
        let mut listeners = TestEventListeners::new();
        let recorder = Recorder::new();
        let mut env = RunEnv::new(listeners.repeater_mut(), &recorder, true);
        info.run(
            &mut env,
            SuiteFixture {
                class: suite_class,
                first_test: "First",
            },
        );
    }

    fn selected(registration: TestRegistration) -> TestInfo {
        let mut info = TestInfo::new(registration);
        info.set_selection(false, true, false, true);
        info
    }

    #[derive(Default)]
    struct Tracked {
        log: Rc<RefCell<Vec<&'static str>>>,
    }

    impl Fixture for Tracked {
        fn set_up(&mut self, _ctx: &TestContext) -> BodyResult {
            self.log.borrow_mut().push("set_up");
            Ok(())
        }

        fn tear_down(&mut self, _ctx: &TestContext) -> BodyResult {
            self.log.borrow_mut().push("tear_down");
            Ok(())
        }
    }

    impl Drop for Tracked {
        fn drop(&mut self) {
            self.log.borrow_mut().push("drop");
        }
    }

    /// **What is tested:** Full lifecycle of a passing fixture test
    /// **Why it is tested:** Phases must run in constructor, set_up, body, tear_down, drop order
    /// **Test conditions:** Fixture logging each phase and a body that logs too
    /// **Expectations:** Log in phase order, result passed with timing recorded
    #[test]
    fn test_lifecycle_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let shared = Rc::clone(&log);
        let mut info = selected(TestRegistration::fixture_with(
            "Tracked",
            "Order",
            move || Tracked {
                log: Rc::clone(&shared),
            },
            |fixture: &mut Tracked, _ctx| {
                fixture.log.borrow_mut().push("body");
                Ok(())
            },
        ));

        run_one(&mut info, FixtureClass::of::<Tracked>());

        assert_eq!(*log.borrow(), vec!["set_up", "body", "tear_down", "drop"]);
        assert!(info.result().passed());
        assert!(info.result().start_timestamp() > 0);
    }

    /// **What is tested:** Fatal failure in the body
    /// **Why it is tested:** tear_down and drop must still run after a failed body
    /// **Test conditions:** Body returns a fatal failure
    /// **Expectations:** One fatal part, tear_down and drop logged
    #[test]
    fn test_fatal_body_still_tears_down() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let shared = Rc::clone(&log);
        let mut info = selected(TestRegistration::fixture_with(
            "Tracked",
            "Fails",
            move || Tracked {
                log: Rc::clone(&shared),
            },
            |_fixture: &mut Tracked, ctx| Err(ctx.fail("division by zero")),
        ));

        run_one(&mut info, FixtureClass::of::<Tracked>());

        assert_eq!(*log.borrow(), vec!["set_up", "tear_down", "drop"]);
        assert!(info.result().has_fatal_failure());
        assert_eq!(info.result().total_part_count(), 1);
    }

    /// **What is tested:** Panicking body
    /// **Why it is tested:** A panic becomes exactly one fatal failure and the test completes
    /// **Test conditions:** Plain test panicking with "boom"
    /// **Expectations:** One fatal part naming the body phase
    #[test]
    fn test_panicking_body_is_contained() {
        let mut info = selected(TestRegistration::function("Plain", "Panics", |_ctx| {
            panic!("boom")
        }));

        run_one(&mut info, FixtureClass::plain());

        let parts = info.result().parts();
        assert_eq!(parts.len(), 1);
        assert!(parts[0].fatally_failed());
        assert_eq!(
            parts[0].message(),
            "panic with message \"boom\" in the test body."
        );
    }

    /// **What is tested:** Panicking fixture constructor
    /// **Why it is tested:** No later phase may run when construction fails
    /// **Test conditions:** Fixture factory that panics
    /// **Expectations:** One fatal part naming the constructor
    #[test]
    fn test_panicking_constructor() {
        let mut info = selected(TestRegistration::fixture_with(
            "Tracked",
            "Ctor",
            || -> Tracked { panic!("no fixture") },
            |_fixture: &mut Tracked, ctx| Err(ctx.fail("body must not run")),
        ));

        run_one(&mut info, FixtureClass::of::<Tracked>());

        let parts = info.result().parts();
        assert_eq!(parts.len(), 1);
        assert!(parts[0].message().contains("the test fixture's constructor"));
    }

    /// **What is tested:** Skip from the body
    /// **Why it is tested:** A skipped test is neither passed nor failed
    /// **Test conditions:** Body returns `ctx.skip(...)`
    /// **Expectations:** Result skipped
    #[test]
    fn test_skip() {
        let mut info = selected(TestRegistration::function("Plain", "Skips", |ctx| {
            Err(ctx.skip("not today"))
        }));

        run_one(&mut info, FixtureClass::plain());

        assert!(info.result().skipped());
        assert!(!info.result().passed());
        assert!(!info.result().failed());
    }

    /// **What is tested:** Unselected tests
    /// **Why it is tested:** Tests that should not run must stay untouched
    /// **Test conditions:** Test with should_run false whose body would fail
    /// **Expectations:** Empty result and no start timestamp
    #[test]
    fn test_not_selected_does_nothing() {
        let mut info = TestInfo::new(TestRegistration::function("Plain", "Off", |ctx| {
            Err(ctx.fail("ran"))
        }));

        run_one(&mut info, FixtureClass::plain());

        assert_eq!(info.result().total_part_count(), 0);
        assert_eq!(info.result().start_timestamp(), 0);
    }

    /// **What is tested:** Fixture class mismatch at run time
    /// **Why it is tested:** Mixing fixture types in one suite is reported on the offending test
    /// **Test conditions:** Plain test run in a suite whose class is Tracked
    /// **Expectations:** One non-fatal failure naming both tests, body never runs
    #[test]
    fn test_fixture_mismatch() {
        let ran = Rc::new(RefCell::new(false));
        let flag = Rc::clone(&ran);
        let mut info = selected(TestRegistration::function("Tracked", "Plain", move |_ctx| {
            *flag.borrow_mut() = true;
            Ok(())
        }));

        run_one(&mut info, FixtureClass::of::<Tracked>());

        assert!(!*ran.borrow());
        let parts = info.result().parts();
        assert_eq!(parts.len(), 1);
        assert!(parts[0].nonfatally_failed());
        assert!(parts[0].message().contains("test First and test Plain"));
    }

    /// **What is tested:** Registration builder metadata
    /// **Why it is tested:** Names, parameters and locations appear in every report
    /// **Test conditions:** Registration with type and value parameters
    /// **Expectations:** TestInfo exposes them together with the caller's location
    #[test]
    fn test_registration_metadata() {
        let info = TestInfo::new(
            TestRegistration::function("Params", "IsPositive/0", |_ctx| Ok(()))
                .with_type_param("u32")
                .with_value_param(5),
        );

        assert_eq!(info.full_name(), "Params.IsPositive/0");
        assert_eq!(info.type_param(), Some("u32"));
        assert_eq!(info.value_param(), Some("5"));
        assert_eq!(info.location().file.as_deref(), Some(file!()));
        assert!(info.fixture_class().is_plain());
        assert!(!info.is_reportable());
    }
}
