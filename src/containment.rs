//! Failure containment around user code
//!
//! Every call into user code (fixture construction, hooks, the test body,
//! fixture destruction) goes through [`contain`], which turns a panic into a
//! [`CapturedFailure`] instead of unwinding through the engine. Panics caught
//! there skip the panic hook's report; the failure message carries them.

use std::any::Any;
use std::cell::Cell;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;

thread_local! {
    static CONTAINING: Cell<bool> = const { Cell::new(false) };
}

static QUIET_HOOK: Once = Once::new();

/// Wrap the process panic hook so it stays silent inside [`contain`]
fn install_quiet_hook() {
    QUIET_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if !CONTAINING.with(Cell::get) {
                previous(info);
            }
        }));
    });
}

/// True while this thread runs user code under a catching boundary
pub fn is_containing() -> bool {
    CONTAINING.with(Cell::get)
}

/// The piece of user code a failure escaped from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Constructor,
    SetUp,
    TestBody,
    TearDown,
    Destructor,
    SetUpTestSuite,
    TearDownTestSuite,
    EnvironmentSetUp,
    EnvironmentTearDown,
}

impl Phase {
    pub fn description(self) -> &'static str {
        match self {
            Phase::Constructor => "the test fixture's constructor",
            Phase::SetUp => "set_up()",
            Phase::TestBody => "the test body",
            Phase::TearDown => "tear_down()",
            Phase::Destructor => "the test fixture's destructor",
            Phase::SetUpTestSuite => "set_up_test_suite()",
            Phase::TearDownTestSuite => "tear_down_test_suite()",
            Phase::EnvironmentSetUp => "the environment's set_up()",
            Phase::EnvironmentTearDown => "the environment's tear_down()",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// A panic caught at a containment boundary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedFailure {
    phase: Phase,
    payload: Option<String>,
}

impl CapturedFailure {
    fn from_payload(phase: Phase, payload: &(dyn Any + Send)) -> Self {
        let payload = payload
            .downcast_ref::<&str>()
            .map(|msg| (*msg).to_owned())
            .or_else(|| payload.downcast_ref::<String>().cloned());
        Self { phase, payload }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The panic message, when the payload was a string
    pub fn payload(&self) -> Option<&str> {
        self.payload.as_deref()
    }

    /// Message recorded as the fatal failure
    pub fn message(&self) -> String {
        match &self.payload {
            Some(msg) => format!("panic with message \"{msg}\" in {}.", self.phase),
            None => format!("unknown panic payload in {}.", self.phase),
        }
    }
}

/// Result of a contained call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Completed(T),
    Captured(CapturedFailure),
}

impl<T> Outcome<T> {
    pub fn completed(self) -> Option<T> {
        match self {
            Outcome::Completed(value) => Some(value),
            Outcome::Captured(_) => None,
        }
    }

    pub fn is_captured(&self) -> bool {
        matches!(self, Outcome::Captured(_))
    }
}

/// Run `f`, capturing a panic when `catch_panics` is set
///
/// With `catch_panics` unset a panic propagates to the caller.
pub fn contain<T, F>(phase: Phase, catch_panics: bool, f: F) -> Outcome<T>
where
    F: FnOnce() -> T,
{
    if !catch_panics {
        return Outcome::Completed(f());
    }

    install_quiet_hook();
    let outer = CONTAINING.with(|flag| flag.replace(true));
    let caught = panic::catch_unwind(AssertUnwindSafe(f));
    CONTAINING.with(|flag| flag.set(outer));

    match caught {
        Ok(value) => Outcome::Completed(value),
        Err(payload) => {
            let failure = CapturedFailure::from_payload(phase, payload.as_ref());
            log::debug!("captured {}", failure.message());
            Outcome::Captured(failure)
        }
    }
}
