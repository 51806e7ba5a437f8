//! Assertion recording
//!
//! User code receives a [`TestContext`] and records assertion outcomes through
//! it. Recorded parts land in a lock-protected pending buffer shared with the
//! engine, so worker threads spawned by a test may assert too. The engine
//! drains the buffer into the current result after every phase.

use crate::result::{PartKind, PropertyScope, SourceLocation, TestPartResult, TestProperty};
use parking_lot::Mutex;
use std::fmt::{self, Debug, Display};
use std::sync::Arc;

/// Early return from user code after a fatal failure or a skip
///
/// Only a [`TestContext`] can create one, so every early return carries a
/// recorded part.
#[derive(Debug, PartialEq, Eq)]
pub struct Abort {
    _recorded: (),
}

impl Display for Abort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("test aborted")
    }
}

/// Return type of test bodies, fixture hooks and environment hooks
pub type BodyResult = Result<(), Abort>;

/// Something recorded by user code, in recording order
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Recorded {
    Part(TestPartResult),
    Property(TestProperty, SourceLocation),
}

/// Names of the suite and test executing right now
///
/// Inside a suite hook only the suite is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentTest {
    suite: String,
    test: Option<String>,
}

impl CurrentTest {
    pub(crate) fn suite<S: Into<String>>(suite: S) -> Self {
        Self {
            suite: suite.into(),
            test: None,
        }
    }

    pub(crate) fn test<S: Into<String>, T: Into<String>>(suite: S, test: T) -> Self {
        Self {
            suite: suite.into(),
            test: Some(test.into()),
        }
    }

    pub fn test_suite_name(&self) -> &str {
        &self.suite
    }

    pub fn test_name(&self) -> Option<&str> {
        self.test.as_deref()
    }

    /// `Suite.Test`, or `None` outside a test
    pub fn full_name(&self) -> Option<String> {
        self.test
            .as_ref()
            .map(|test| format!("{}.{test}", self.suite))
    }
}

#[derive(Debug)]
struct Slot {
    scope: PropertyScope,
    pending: Vec<Recorded>,
    fatal: bool,
    failed: bool,
    skipped: bool,
    current: Option<CurrentTest>,
}

impl Slot {
    fn new(scope: PropertyScope) -> Self {
        Self {
            scope,
            pending: Vec::new(),
            fatal: false,
            failed: false,
            skipped: false,
            current: None,
        }
    }

    fn push_part(&mut self, part: TestPartResult) {
        match part.kind() {
            PartKind::FatalFailure => {
                self.fatal = true;
                self.failed = true;
            }
            PartKind::NonFatalFailure => self.failed = true,
            PartKind::Skip => self.skipped = true,
            PartKind::Success => {}
        }
        self.pending.push(Recorded::Part(part));
    }
}

/// Engine side of the recording channel
#[derive(Debug, Clone)]
pub(crate) struct Recorder {
    slot: Arc<Mutex<Slot>>,
}

impl Recorder {
    pub(crate) fn new() -> Self {
        Self {
            slot: Arc::new(Mutex::new(Slot::new(PropertyScope::TestSuites))),
        }
    }

    /// Switch to a new current result; anything still pending is discarded
    ///
    /// `fatal`, `failed` and `skipped` seed the slot's status with what the
    /// result already holds. The current test identity is kept.
    pub(crate) fn begin_slot(&self, scope: PropertyScope, fatal: bool, failed: bool, skipped: bool) {
        let mut slot = self.slot.lock();
        let current = slot.current.take();
        *slot = Slot::new(scope);
        slot.current = current;
        slot.fatal = fatal;
        slot.failed = failed;
        slot.skipped = skipped;
    }

    /// Take everything recorded since the last drain
    pub(crate) fn drain(&self) -> (PropertyScope, Vec<Recorded>) {
        let mut slot = self.slot.lock();
        (slot.scope, std::mem::take(&mut slot.pending))
    }

    /// Record a part on behalf of the engine
    pub(crate) fn record(&self, part: TestPartResult) {
        self.slot.lock().push_part(part);
    }

    pub(crate) fn set_current(&self, current: Option<CurrentTest>) {
        self.slot.lock().current = current;
    }

    /// Note a non-fatal failure added to the result outside the buffer
    pub(crate) fn mark_failed(&self) {
        self.slot.lock().failed = true;
    }

    pub(crate) fn context(&self) -> TestContext {
        TestContext {
            slot: Arc::clone(&self.slot),
        }
    }
}

/// Handle through which user code records assertion outcomes
///
/// Cloning is cheap and clones may be moved to other threads.
#[derive(Debug, Clone)]
pub struct TestContext {
    slot: Arc<Mutex<Slot>>,
}

impl TestContext {
    fn push(&self, kind: PartKind, location: SourceLocation, message: String) {
        self.slot
            .lock()
            .push_part(TestPartResult::new(kind, location, message));
    }

    /// Record an explicit success
    #[track_caller]
    pub fn succeed<S: Into<String>>(&self, message: S) {
        self.push(PartKind::Success, SourceLocation::caller(), message.into());
    }

    /// Record a non-fatal failure; execution continues
    #[track_caller]
    pub fn add_failure<S: Into<String>>(&self, message: S) {
        self.push(
            PartKind::NonFatalFailure,
            SourceLocation::caller(),
            message.into(),
        );
    }

    /// Record a fatal failure; return the result with `Err` to stop the phase
    #[track_caller]
    pub fn fail<S: Into<String>>(&self, message: S) -> Abort {
        self.push(
            PartKind::FatalFailure,
            SourceLocation::caller(),
            message.into(),
        );
        Abort { _recorded: () }
    }

    /// Mark the current test as skipped
    #[track_caller]
    pub fn skip<S: Into<String>>(&self, message: S) -> Abort {
        self.push(PartKind::Skip, SourceLocation::caller(), message.into());
        Abort { _recorded: () }
    }

    /// Non-fatal check of a condition
    #[track_caller]
    pub fn expect<S: Into<String>>(&self, condition: bool, message: S) -> bool {
        if !condition {
            self.add_failure(message);
        }
        condition
    }

    /// Non-fatal equality check
    #[track_caller]
    pub fn expect_eq<T: PartialEq + Debug>(&self, expected: T, actual: T) -> bool {
        let equal = expected == actual;
        if !equal {
            self.add_failure(equality_message(&expected, &actual));
        }
        equal
    }

    /// Non-fatal inequality check
    #[track_caller]
    pub fn expect_ne<T: PartialEq + Debug>(&self, left: T, right: T) -> bool {
        let different = left != right;
        if !different {
            self.add_failure(format!(
                "Expected: ({left:?}) != ({right:?}), actual: they are equal"
            ));
        }
        different
    }

    /// Fatal check of a condition
    #[track_caller]
    pub fn assert<S: Into<String>>(&self, condition: bool, message: S) -> BodyResult {
        if condition {
            Ok(())
        } else {
            Err(self.fail(message))
        }
    }

    /// Fatal equality check
    #[track_caller]
    pub fn assert_eq<T: PartialEq + Debug>(&self, expected: T, actual: T) -> BodyResult {
        if expected == actual {
            Ok(())
        } else {
            Err(self.fail(equality_message(&expected, &actual)))
        }
    }

    /// Attach a key-value property to the current result
    ///
    /// Keys reserved by report writers are rejected with a non-fatal failure.
    #[track_caller]
    pub fn record_property<K: Into<String>, V: Display>(&self, key: K, value: V) {
        let location = SourceLocation::caller();
        self.slot.lock().pending.push(Recorded::Property(
            TestProperty::new(key, value.to_string()),
            location,
        ));
    }

    /// Suite and test being executed; `None` in environment hooks
    pub fn current_test(&self) -> Option<CurrentTest> {
        self.slot.lock().current.clone()
    }

    /// True once the current result holds a fatal failure
    pub fn has_fatal_failure(&self) -> bool {
        self.slot.lock().fatal
    }

    /// True once the current result holds any failure
    pub fn has_failure(&self) -> bool {
        self.slot.lock().failed
    }

    /// True when the current result is skipped and has not failed
    pub fn is_skipped(&self) -> bool {
        let slot = self.slot.lock();
        slot.skipped && !slot.failed
    }
}

fn equality_message<T: Debug>(expected: &T, actual: &T) -> String {
    format!("Expected equality of these values:\n  expected: {expected:?}\n  actual: {actual:?}")
}
