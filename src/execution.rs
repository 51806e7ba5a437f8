//! Shared state of one running iteration
//!
//! Tests and suites run against a [`RunEnv`], which carries the listeners, the
//! recording channel and the containment setting. Running a phase of user code
//! through it records captured failures and drained parts into the owning
//! result and forwards them to the listeners.

use crate::containment::{contain, Outcome, Phase};
use crate::context::{CurrentTest, Recorded, Recorder, TestContext};
use crate::listener::{TestEventListener, TestEventRepeater};
use crate::result::{PartKind, PropertyScope, SourceLocation, TestPartResult, TestResult};
use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the UNIX epoch, 0 if the clock is before it
pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

pub(crate) struct RunEnv<'a> {
    listeners: &'a mut TestEventRepeater,
    recorder: &'a Recorder,
    context: TestContext,
    catch_panics: bool,
}

impl<'a> RunEnv<'a> {
    pub(crate) fn new(
        listeners: &'a mut TestEventRepeater,
        recorder: &'a Recorder,
        catch_panics: bool,
    ) -> Self {
        Self {
            listeners,
            context: recorder.context(),
            recorder,
            catch_panics,
        }
    }

    pub(crate) fn listeners(&mut self) -> &mut TestEventRepeater {
        self.listeners
    }

    /// Publish the executing suite and test to user code
    pub(crate) fn set_current(&self, current: Option<CurrentTest>) {
        self.recorder.set_current(current);
    }

    /// Make `result` the current slot for user code recording
    pub(crate) fn begin_slot(&self, scope: PropertyScope, result: &TestResult) {
        self.recorder.begin_slot(
            scope,
            result.has_fatal_failure(),
            result.failed(),
            result.parts().iter().any(TestPartResult::skipped),
        );
    }

    /// Run one phase of user code against the current slot
    ///
    /// Returns `None` when a failure was captured.
    pub(crate) fn run_phase<T, F>(&mut self, phase: Phase, result: &mut TestResult, f: F) -> Option<T>
    where
        F: FnOnce(&TestContext) -> T,
    {
        let context = &self.context;
        let outcome = contain(phase, self.catch_panics, || f(context));
        self.flush(result);

        match outcome {
            Outcome::Completed(value) => Some(value),
            Outcome::Captured(failure) => {
                let part = TestPartResult::new(
                    PartKind::FatalFailure,
                    SourceLocation::unknown(),
                    failure.message(),
                );
                self.recorder.record(part);
                self.flush(result);
                None
            }
        }
    }

    /// Record a part generated by the engine itself
    pub(crate) fn report(&mut self, result: &mut TestResult, part: TestPartResult) {
        self.recorder.record(part);
        self.flush(result);
    }

    /// Move pending records into `result`, forwarding parts to the listeners
    pub(crate) fn flush(&mut self, result: &mut TestResult) {
        let (scope, recorded) = self.recorder.drain();
        for record in recorded {
            let part = match record {
                Recorded::Part(part) => part,
                Recorded::Property(property, location) => {
                    match result.record_property(scope, property) {
                        Ok(()) => continue,
                        Err(reserved) => {
                            let part = TestPartResult::new(
                                PartKind::NonFatalFailure,
                                location,
                                reserved.to_string(),
                            );
                            // Keep the context's status in step with the result
                            self.recorder.mark_failed();
                            part
                        }
                    }
                }
            };
            self.listeners.on_test_part_result(&part);
            result.add_part(part);
        }
    }
}
