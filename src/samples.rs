//! Sample tests bundled with the `suite-runner` binary

use std::fmt::Debug;
use std::sync::atomic::{AtomicUsize, Ordering};
use suite_runner::{
    BodyResult, Environment, Fixture, Result, TestContext, TestProgram, TestRegistration,
};

static COUNTER_SUITE_SET_UPS: AtomicUsize = AtomicUsize::new(0);

#[derive(Default)]
struct Counter {
    value: u64,
}

impl Fixture for Counter {
    fn set_up(&mut self, _ctx: &TestContext) -> BodyResult {
        self.value = 1;
        Ok(())
    }

    fn set_up_test_suite(_ctx: &TestContext) -> BodyResult {
        COUNTER_SUITE_SET_UPS.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn tear_down_test_suite(ctx: &TestContext) -> BodyResult {
        ctx.record_property("suite_set_ups", COUNTER_SUITE_SET_UPS.load(Ordering::SeqCst));
        Ok(())
    }
}

struct Announce;

impl Environment for Announce {
    fn set_up(&mut self, _ctx: &TestContext) -> BodyResult {
        log::info!("sample environment set up");
        Ok(())
    }

    fn tear_down(&mut self, _ctx: &TestContext) -> BodyResult {
        log::info!("sample environment torn down");
        Ok(())
    }
}

fn divide(dividend: i64, divisor: i64) -> Option<i64> {
    dividend.checked_div(divisor)
}

fn default_is_zero<T: Default + PartialEq + Debug + From<u8>>(ctx: &TestContext) -> BodyResult {
    ctx.assert_eq(T::from(0), T::default())
}

pub fn register(program: &mut TestProgram) -> Result<()> {
    program.add_environment(Box::new(Announce));

    program.register_all([
        TestRegistration::function("Math", "Add", |ctx| {
            ctx.expect_eq(4, 2 + 2);
            Ok(())
        }),
        TestRegistration::function("Math", "Div", |ctx| {
            let Some(quotient) = divide(1, 0) else {
                return Err(ctx.fail("division by zero"));
            };
            ctx.expect_eq(0, quotient);
            Ok(())
        }),
        TestRegistration::fixture::<Counter, _, _>("Counter", "Increment", |counter, ctx| {
            counter.value += 1;
            ctx.assert_eq(2, counter.value)
        }),
        TestRegistration::fixture::<Counter, _, _>("Counter", "StartsAtOne", |counter, ctx| {
            ctx.assert_eq(1, counter.value)
        }),
    ])?;

    for (i, value) in [1i64, 5, 42].into_iter().enumerate() {
        program.register(
            TestRegistration::function("Params", format!("IsPositive/{i}"), move |ctx| {
                ctx.assert(value > 0, format!("{value} is not positive"))
            })
            .with_value_param(value),
        )?;
    }

    program.register_all([
        TestRegistration::function("Typed/0", "DefaultIsZero", default_is_zero::<u8>)
            .with_type_param("u8"),
        TestRegistration::function("Typed/1", "DefaultIsZero", default_is_zero::<u64>)
            .with_type_param("u64"),
        TestRegistration::function("Skipping", "NotOnThisMachine", |ctx| {
            Err(ctx.skip("requires hardware that is not present"))
        }),
        TestRegistration::function("DISABLED_Slow", "Sleep", |_ctx| {
            std::thread::sleep(std::time::Duration::from_secs(5));
            Ok(())
        }),
        TestRegistration::function("Threads", "ScopedWorkers", |ctx| {
            std::thread::scope(|scope| {
                for worker in 0..4u32 {
                    let ctx = ctx.clone();
                    scope.spawn(move || {
                        ctx.expect(worker * 2 < 8, format!("worker {worker} out of range"));
                    });
                }
            });
            ctx.assert(!ctx.has_failure(), "a worker reported a failure")
        }),
    ])
}
