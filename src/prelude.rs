pub use crate::device::DeviceConfig;
pub use crate::driver::{BusMaster, MicroMaster};
pub use crate::error::TbError;
pub use crate::executor::{JoinHandle, Task};
pub use crate::obj::{TbObj, TbObjSafe};
pub use crate::report::{ScenarioReport, SessionSummary};
pub use crate::signal::SimObject;
pub use crate::sim;
pub use crate::test::{Outcome, Test, Tests};
pub use crate::testbench::{
    clock, session_state, ClockSource, IdleInjector, ResetSequencer, Scoreboard, SessionState,
};
pub use crate::trigger::Trigger;
pub use crate::utils;
pub use crate::value::Val;
pub use crate::{check_eq, fail_test, pass_test, SimpleResult, TestResult};
pub use futures::future::FutureExt;
