//! Test event listeners
//!
//! Listeners observe every lifecycle transition of a run. The repeater fans
//! each event out to all listeners: start events in registration order, end
//! events in reverse, so the first listener brackets all the others.

use crate::result::TestPartResult;
use crate::test_info::TestInfo;
use crate::test_suite::TestSuite;
use crate::unit_test::UnitTest;

/// Observer of run lifecycle events; every method defaults to a no-op
#[allow(unused_variables)]
pub trait TestEventListener {
    fn on_test_program_start(&mut self, unit_test: &UnitTest) {}
    fn on_test_iteration_start(&mut self, unit_test: &UnitTest, iteration: usize) {}
    fn on_environments_set_up_start(&mut self, unit_test: &UnitTest) {}
    fn on_environments_set_up_end(&mut self, unit_test: &UnitTest) {}
    fn on_test_suite_start(&mut self, test_suite: &TestSuite) {}
    fn on_test_start(&mut self, test_info: &TestInfo) {}
    fn on_test_part_result(&mut self, result: &TestPartResult) {}
    fn on_test_end(&mut self, test_info: &TestInfo) {}
    fn on_test_suite_end(&mut self, test_suite: &TestSuite) {}
    fn on_environments_tear_down_start(&mut self, unit_test: &UnitTest) {}
    fn on_environments_tear_down_end(&mut self, unit_test: &UnitTest) {}
    fn on_test_iteration_end(&mut self, unit_test: &UnitTest, iteration: usize) {}
    fn on_test_program_end(&mut self, unit_test: &UnitTest) {}
}

/// Handle returned by [`TestEventListeners::append`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Fan-out over an ordered list of owned listeners
pub struct TestEventRepeater {
    listeners: Vec<(ListenerId, Box<dyn TestEventListener>)>,
    forwarding_enabled: bool,
}

macro_rules! forward {
    ($name:ident($($arg:ident: $ty:ty),*)) => {
        fn $name(&mut self, $($arg: $ty),*) {
            if self.forwarding_enabled {
                for (_, listener) in self.listeners.iter_mut() {
                    listener.$name($($arg),*);
                }
            }
        }
    };
}

macro_rules! reverse {
    ($name:ident($($arg:ident: $ty:ty),*)) => {
        fn $name(&mut self, $($arg: $ty),*) {
            if self.forwarding_enabled {
                for (_, listener) in self.listeners.iter_mut().rev() {
                    listener.$name($($arg),*);
                }
            }
        }
    };
}

impl TestEventRepeater {
    fn new() -> Self {
        Self {
            listeners: Vec::new(),
            forwarding_enabled: true,
        }
    }

    pub fn forwarding_enabled(&self) -> bool {
        self.forwarding_enabled
    }

    pub fn set_forwarding_enabled(&mut self, enabled: bool) {
        self.forwarding_enabled = enabled;
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl TestEventListener for TestEventRepeater {
    forward!(on_test_program_start(unit_test: &UnitTest));
    forward!(on_test_iteration_start(unit_test: &UnitTest, iteration: usize));
    forward!(on_environments_set_up_start(unit_test: &UnitTest));
    reverse!(on_environments_set_up_end(unit_test: &UnitTest));
    forward!(on_test_suite_start(test_suite: &TestSuite));
    forward!(on_test_start(test_info: &TestInfo));
    forward!(on_test_part_result(result: &TestPartResult));
    reverse!(on_test_end(test_info: &TestInfo));
    reverse!(on_test_suite_end(test_suite: &TestSuite));
    forward!(on_environments_tear_down_start(unit_test: &UnitTest));
    reverse!(on_environments_tear_down_end(unit_test: &UnitTest));
    reverse!(on_test_iteration_end(unit_test: &UnitTest, iteration: usize));
    reverse!(on_test_program_end(unit_test: &UnitTest));
}

/// The listener list of a program
pub struct TestEventListeners {
    repeater: TestEventRepeater,
    default_result_printer: Option<ListenerId>,
    next_id: u64,
}

impl TestEventListeners {
    pub fn new() -> Self {
        Self {
            repeater: TestEventRepeater::new(),
            default_result_printer: None,
            next_id: 0,
        }
    }

    /// Add a listener at the end of the list
    pub fn append(&mut self, listener: Box<dyn TestEventListener>) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.repeater.listeners.push((id, listener));
        id
    }

    /// Remove a listener and hand it back to the caller
    pub fn release(&mut self, id: ListenerId) -> Option<Box<dyn TestEventListener>> {
        if self.default_result_printer == Some(id) {
            self.default_result_printer = None;
        }
        let position = self
            .repeater
            .listeners
            .iter()
            .position(|(listener_id, _)| *listener_id == id)?;
        Some(self.repeater.listeners.remove(position).1)
    }

    /// Replace the default result printer, dropping the previous one
    pub fn set_default_result_printer(&mut self, listener: Box<dyn TestEventListener>) -> ListenerId {
        if let Some(previous) = self.default_result_printer.take() {
            drop(self.release(previous));
        }
        let id = self.append(listener);
        self.default_result_printer = Some(id);
        id
    }

    /// Remove the default result printer, if any, and hand it back
    pub fn release_default_result_printer(&mut self) -> Option<Box<dyn TestEventListener>> {
        let id = self.default_result_printer.take()?;
        self.release(id)
    }

    pub fn default_result_printer(&self) -> Option<ListenerId> {
        self.default_result_printer
    }

    /// Stop forwarding events to any listener
    pub fn suppress_event_forwarding(&mut self) {
        self.repeater.set_forwarding_enabled(false);
    }

    pub fn event_forwarding_enabled(&self) -> bool {
        self.repeater.forwarding_enabled()
    }

    pub fn len(&self) -> usize {
        self.repeater.len()
    }

    pub fn is_empty(&self) -> bool {
        self.repeater.is_empty()
    }

    pub(crate) fn repeater_mut(&mut self) -> &mut TestEventRepeater {
        &mut self.repeater
    }
}

impl Default for TestEventListeners {
    fn default() -> Self {
        Self::new()
    }
}
