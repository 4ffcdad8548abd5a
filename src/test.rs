use futures::future::BoxFuture;
use once_cell::sync::OnceCell;

use crate::obj::TbObjSafe;
use crate::signal::SimObject;
use crate::TestResult;

/// Per-scenario state machine. A scenario that never leaves `Running` by
/// session end starved on events and is reported as failed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome {
    NotStarted,
    Running,
    Passed,
    Failed,
}

pub struct Test {
    pub name: String,
    pub generator: fn(SimObject) -> BoxFuture<'static, TestResult>,
    pub outcome: Outcome,
    pub result: Option<TestResult>,
    pub time_secs: f64,
    pub sim_time_ns: u64,
}

impl Test {
    pub fn new(name: String, generator: fn(SimObject) -> BoxFuture<'static, TestResult>) -> Self {
        Self {
            name,
            generator,
            outcome: Outcome::NotStarted,
            result: None,
            time_secs: 0.0,
            sim_time_ns: 0,
        }
    }
    pub fn set_running(&mut self) {
        self.outcome = Outcome::Running;
    }
    pub fn set_result(&mut self, result: TestResult) {
        self.outcome = match result {
            Ok(_) => Outcome::Passed,
            Err(_) => Outcome::Failed,
        };
        self.result = Some(result);
    }
}

pub struct Tests(Vec<TbObjSafe<Test>>);

impl Tests {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self(Vec::new())
    }
    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    pub fn iter(&self) -> core::slice::Iter<'_, TbObjSafe<Test>> {
        self.0.iter()
    }
    pub fn push(&mut self, test: Test) {
        self.0.push(TbObjSafe::new(test));
    }
}

pub(crate) static TESTS: OnceCell<Tests> = OnceCell::new();
