pub mod device;
pub mod driver;
pub mod error;
mod executor;
mod obj;
pub mod prelude;
pub mod report;
pub mod scenarios;
pub mod signal;
pub mod sim;
pub mod test;
pub mod testbench;
pub mod trigger;
pub mod utils;
pub mod value;

use std::sync::Arc;
use std::time;

use lazy_static::lazy_static;
use once_cell::sync::OnceCell;

use error::TbError;
use executor::Task;
use obj::TbObjSafe;
use report::SessionSummary;
use value::Val;

pub type SimpleResult<T> = Result<T, ()>;
pub type TestResult = Result<Val, TbError>;

static SIM_START_TIME: OnceCell<time::Instant> = OnceCell::new();
pub static CRATE_NAME: OnceCell<String> = OnceCell::new();

lazy_static! {
    static ref CURRENT_TEST: TbObjSafe<Option<(Arc<Task>, TbObjSafe<test::Test>)>> =
        TbObjSafe::new(None);
}

/// Passes the scenario that has not already passed or failed.
pub fn pass_test(msg: &str) {
    if let Some((task, test)) = CURRENT_TEST.get_mut().take() {
        test.with_mut(|t| t.set_result(Ok(Val::String(msg.to_string()))));
        tear_down_test(task);
    }
}

/// Fails the scenario that has not already passed or failed.
pub fn fail_test(err: TbError) {
    if let Some((task, test)) = CURRENT_TEST.get_mut().take() {
        test.with_mut(|t| t.set_result(Err(err)));
        tear_down_test(task);
    }
}

fn tear_down_test(task: Arc<Task>) {
    trigger::cancel_all_triggers();
    executor::clear_ready_queue();
    task.cancel();
}

/// Early-return mismatch check for scenario bodies. The message carries both
/// values.
#[macro_export]
macro_rules! check_eq {
    ($obs:expr, $exp:expr, $what:expr) => {{
        let observed: u64 = ($obs).into();
        let expected: u64 = ($exp).into();
        if observed != expected {
            return Err($crate::error::TbError::Mismatch {
                context: ($what).to_string(),
                expected,
                observed,
            });
        }
    }};
}

pub(crate) fn start_of_simulation() {
    SIM_START_TIME
        .set(time::Instant::now())
        .expect("simulation started twice");

    let sim_root = signal::SimObject::get_root().expect("device hierarchy not initialized");

    // All scenarios are chained at startup; each link awaits the previous
    // scenario's completion before spawning its own.
    let mut join_handle = None;
    for test in test::TESTS.get().expect("no scenarios registered").iter() {
        join_handle = Some(Task::spawn_from_future(
            async move {
                // await previous scenario, if there is one
                if let Some(handle) = join_handle {
                    let _ = handle.await;
                }
                let test_handle = Task::spawn_from_future(
                    async move {
                        let time_start = time::Instant::now();
                        let sim_time_start = sim::now();
                        let generator = test.with_mut(|t| {
                            t.set_running();
                            t.generator
                        });
                        let result = (generator)(sim_root).await;

                        test.with_mut(|t| {
                            t.time_secs = time_start.elapsed().as_secs_f64();
                            t.sim_time_ns = sim::now() - sim_time_start;
                        });
                        match result {
                            Ok(val) => pass_test(&val.to_string()),
                            Err(err) => fail_test(err),
                        }
                        Ok(Val::None)
                    },
                    "scenario",
                );
                let task = test_handle.task().expect("scenario task missing");
                CURRENT_TEST.with_mut(move |c| {
                    let _ = c.replace((task, test.clone()));
                });
                let _ = test_handle.await;
                Ok(Val::None)
            },
            "scenario chain",
        ));
    }

    // execute the first simulation tick
    executor::run_once();
}

pub(crate) fn end_of_simulation() -> SessionSummary {
    // Anything still running starved on events; close it out as failed.
    for test in test::TESTS.get().expect("no scenarios registered").iter() {
        test.with_mut(|t| {
            if t.result.is_none() && t.outcome == test::Outcome::Running {
                t.set_result(Err(TbError::Incomplete));
            }
        });
    }

    let wall_secs = SIM_START_TIME
        .get()
        .map(|t| t.elapsed().as_secs_f64())
        .unwrap_or(0.0);
    let summary = SessionSummary::collect();
    report::print_summary(&summary, wall_secs);
    if let Some(name) = CRATE_NAME.get() {
        report::write_junit(name);
    }
    summary
}
