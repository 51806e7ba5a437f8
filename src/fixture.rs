//! Tests, fixtures and the factories that build them
//!
//! A registered test owns a [`TestFactory`]. Each execution asks the factory
//! for a fresh [`Test`] object, runs its phases, and drops it.

use crate::context::{BodyResult, TestContext};
use std::any::{self, TypeId};
use std::fmt;
use std::rc::Rc;

/// One executable test object, built fresh for each run
pub trait Test {
    fn set_up(&mut self, _ctx: &TestContext) -> BodyResult {
        Ok(())
    }

    fn test_body(&mut self, ctx: &TestContext) -> BodyResult;

    fn tear_down(&mut self, _ctx: &TestContext) -> BodyResult {
        Ok(())
    }
}

/// User fixture type shared by all tests of a suite
///
/// The suite-level hooks run once around the suite; the instance hooks run
/// around every test.
pub trait Fixture: 'static {
    fn set_up(&mut self, _ctx: &TestContext) -> BodyResult {
        Ok(())
    }

    fn tear_down(&mut self, _ctx: &TestContext) -> BodyResult {
        Ok(())
    }

    fn set_up_test_suite(_ctx: &TestContext) -> BodyResult
    where
        Self: Sized,
    {
        Ok(())
    }

    fn tear_down_test_suite(_ctx: &TestContext) -> BodyResult
    where
        Self: Sized,
    {
        Ok(())
    }
}

/// Builds the test object for one execution
pub trait TestFactory {
    fn create_test(&self) -> Box<dyn Test>;
}

/// Suite-level hook signature
pub type SuiteHook = fn(&TestContext) -> BodyResult;

/// Suite set-up and tear-down hooks, captured on first registration
#[derive(Clone, Copy, Default)]
pub struct SuiteHooks {
    pub set_up: Option<SuiteHook>,
    pub tear_down: Option<SuiteHook>,
}

impl SuiteHooks {
    pub fn none() -> Self {
        Self::default()
    }

    /// The hooks of fixture type `F`
    pub fn of<F: Fixture>() -> Self {
        Self {
            set_up: Some(F::set_up_test_suite),
            tear_down: Some(F::tear_down_test_suite),
        }
    }
}

impl fmt::Debug for SuiteHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SuiteHooks")
            .field("set_up", &self.set_up.is_some())
            .field("tear_down", &self.tear_down.is_some())
            .finish()
    }
}

/// Identity of the fixture type a test was registered with
#[derive(Debug, Clone, Copy, Eq)]
pub struct FixtureClass {
    id: TypeId,
    name: &'static str,
}

/// Fixture class of tests registered without a fixture
struct PlainTest;

impl FixtureClass {
    pub fn of<F: 'static>() -> Self {
        Self {
            id: TypeId::of::<F>(),
            name: any::type_name::<F>(),
        }
    }

    /// The class shared by every fixture-less test
    pub fn plain() -> Self {
        Self::of::<PlainTest>()
    }

    pub fn is_plain(&self) -> bool {
        self.id == TypeId::of::<PlainTest>()
    }

    pub fn type_id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for FixtureClass {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

/// Body of a fixture test
pub type FixtureBody<F> = fn(&mut F, &TestContext) -> BodyResult;

/// Test object pairing a fixture instance with its body
pub struct FixtureTest<F: Fixture> {
    fixture: F,
    body: FixtureBody<F>,
}

impl<F: Fixture> Test for FixtureTest<F> {
    fn set_up(&mut self, ctx: &TestContext) -> BodyResult {
        self.fixture.set_up(ctx)
    }

    fn test_body(&mut self, ctx: &TestContext) -> BodyResult {
        (self.body)(&mut self.fixture, ctx)
    }

    fn tear_down(&mut self, ctx: &TestContext) -> BodyResult {
        self.fixture.tear_down(ctx)
    }
}

/// Factory constructing a fixture per execution
pub struct FixtureFactory<F: Fixture> {
    make: Box<dyn Fn() -> F>,
    body: FixtureBody<F>,
}

impl<F: Fixture> FixtureFactory<F> {
    pub fn new<M>(make: M, body: FixtureBody<F>) -> Self
    where
        M: Fn() -> F + 'static,
    {
        Self {
            make: Box::new(make),
            body,
        }
    }
}

impl<F: Fixture> TestFactory for FixtureFactory<F> {
    fn create_test(&self) -> Box<dyn Test> {
        Box::new(FixtureTest {
            fixture: (self.make)(),
            body: self.body,
        })
    }
}

type SharedBody = Rc<dyn Fn(&TestContext) -> BodyResult>;

/// Test object for a fixture-less body
struct FnTest {
    body: SharedBody,
}

impl Test for FnTest {
    fn test_body(&mut self, ctx: &TestContext) -> BodyResult {
        (self.body)(ctx)
    }
}

/// Factory for fixture-less tests
///
/// Value-parameterized tests capture their parameter in the closure.
pub struct FnFactory {
    body: SharedBody,
}

impl FnFactory {
    pub fn new<B>(body: B) -> Self
    where
        B: Fn(&TestContext) -> BodyResult + 'static,
    {
        Self {
            body: Rc::new(body),
        }
    }
}

impl TestFactory for FnFactory {
    fn create_test(&self) -> Box<dyn Test> {
        Box::new(FnTest {
            body: Rc::clone(&self.body),
        })
    }
}

/// Global set-up and tear-down around all suites of an iteration
pub trait Environment {
    fn set_up(&mut self, _ctx: &TestContext) -> BodyResult {
        Ok(())
    }

    fn tear_down(&mut self, _ctx: &TestContext) -> BodyResult {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Recorder;

    #[derive(Default)]
    struct Counter {
        value: u32,
    }

    impl Fixture for Counter {
        fn set_up(&mut self, _ctx: &TestContext) -> BodyResult {
            self.value = 10;
            Ok(())
        }
    }

    struct Other;
    impl Fixture for Other {}

    /// **What is tested:** Fixture factory building independent instances
    /// **Why it is tested:** State must never leak from one test execution to the next
    /// **Test conditions:** Two tests created from one factory, the first mutated
    /// **Expectations:** The second starts from a fresh fixture
    #[test]
    fn test_fixture_factory_fresh_instances() {
        let recorder = Recorder::new();
        let ctx = recorder.context();
        let factory = FixtureFactory::<Counter>::new(Counter::default, |fixture, ctx| {
            fixture.value += 1;
            ctx.assert_eq(11, fixture.value)
        });

        let mut first = factory.create_test();
        assert_eq!(first.set_up(&ctx), Ok(()));
        assert_eq!(first.test_body(&ctx), Ok(()));

        let mut second = factory.create_test();
        assert!(second.test_body(&ctx).is_err());
        assert!(ctx.has_fatal_failure());
    }

    /// **What is tested:** Closure factory sharing its body
    /// **Why it is tested:** Value-parameterized tests capture parameters in closures
    /// **Test conditions:** Body capturing the value 3, invoked through two test objects
    /// **Expectations:** Both succeed without failures
    #[test]
    fn test_fn_factory() {
        let recorder = Recorder::new();
        let ctx = recorder.context();
        let param = 3;
        let factory = FnFactory::new(move |ctx| ctx.assert(param > 0, "positive"));

        assert_eq!(factory.create_test().test_body(&ctx), Ok(()));
        assert_eq!(factory.create_test().test_body(&ctx), Ok(()));
        assert!(!ctx.has_failure());
    }

    /// **What is tested:** Fixture class identity
    /// **Why it is tested:** Suites reject tests registered with another fixture type
    /// **Test conditions:** Classes of Counter, Other and plain tests
    /// **Expectations:** Equal only for the same type
    #[test]
    fn test_fixture_class_identity() {
        assert_eq!(FixtureClass::of::<Counter>(), FixtureClass::of::<Counter>());
        assert_ne!(FixtureClass::of::<Counter>(), FixtureClass::of::<Other>());
        assert!(FixtureClass::plain().is_plain());
        assert!(!FixtureClass::of::<Counter>().is_plain());
        assert!(FixtureClass::of::<Counter>().name().ends_with("Counter"));
    }

    /// **What is tested:** Default suite hooks of a fixture
    /// **Why it is tested:** Fixtures without hooks must still run cleanly
    /// **Test conditions:** SuiteHooks of Other called directly
    /// **Expectations:** Both hooks exist and return Ok
    #[test]
    fn test_suite_hooks_of_fixture() {
        let recorder = Recorder::new();
        let ctx = recorder.context();
        let hooks = SuiteHooks::of::<Other>();
        assert_eq!(hooks.set_up.map(|hook| hook(&ctx)), Some(Ok(())));
        assert_eq!(hooks.tear_down.map(|hook| hook(&ctx)), Some(Ok(())));
        assert!(SuiteHooks::none().set_up.is_none());
    }
}
