//! The simulation kernel: signal table, simulated time and the event loop.
//!
//! One step equals one nanosecond. The kernel owns time the way a
//! self-clocking backend does: scheduled wakeups live in a time wheel, and
//! between wakeups every queued signal change is settled by evaluating the
//! device model and dispatching edge triggers, followed by the read-only
//! stage in which waiters sample fully settled values.

use lazy_mut::lazy_mut;
use lazy_static::lazy_static;
use num_format::{Locale, ToFormattedString};
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::device::{self, DeviceConfig, EchoCore};
use crate::obj::TbObjSafe;
use crate::report::SessionSummary;
use crate::signal::ObjectKind;
use crate::test::Tests;
use crate::trigger::{self, EdgeKind};
use crate::SimpleResult;

pub(crate) struct SignalState {
    pub name: String,
    pub width: u32,
    pub kind: ObjectKind,
    pub value: u64,
}

lazy_mut! {
    static mut SIG_TABLE: Vec<SignalState> = Vec::new();
}
lazy_mut! {
    static mut SIG_NAMES: HashMap<String, usize> = HashMap::new();
}
lazy_mut! {
    static mut TIME_SET: BTreeSet<u64> = BTreeSet::new();
}
lazy_mut! {
    static mut CHANGES: VecDeque<(usize, EdgeKind)> = VecDeque::new();
}
static SIM_TIME: AtomicU64 = AtomicU64::new(0);
static RO_ARMED: AtomicBool = AtomicBool::new(false);
lazy_static! {
    static ref MODEL: TbObjSafe<Option<EchoCore>> = TbObjSafe::new(None);
}

fn init_session(cfg: DeviceConfig) {
    unsafe {
        SIG_TABLE.init();
        SIG_NAMES.init();
        TIME_SET.init();
        CHANGES.init();
    }
    device::create_ports(&cfg);
    MODEL.with_mut(|m| *m = Some(EchoCore::bind()));
}

pub(crate) fn create_object(name: &str, width: u32, kind: ObjectKind, init: u64) -> usize {
    unsafe {
        let handle = SIG_TABLE.len();
        SIG_TABLE.push(SignalState {
            name: name.to_string(),
            width,
            kind,
            value: init,
        });
        SIG_NAMES.insert(name.to_string(), handle);
        handle
    }
}

pub(crate) fn lookup(full_name: &str) -> SimpleResult<(usize, ObjectKind)> {
    unsafe {
        SIG_NAMES
            .get(full_name)
            .map(|h| (*h, SIG_TABLE[*h].kind))
            .ok_or(())
    }
}

pub(crate) fn root() -> SimpleResult<(usize, ObjectKind)> {
    unsafe {
        if SIG_TABLE.is_empty() {
            Err(())
        } else {
            Ok((0, SIG_TABLE[0].kind))
        }
    }
}

pub(crate) fn name_of(handle: usize) -> String {
    unsafe { SIG_TABLE[handle].name.clone() }
}

pub(crate) fn width_of(handle: usize) -> u32 {
    unsafe { SIG_TABLE[handle].width }
}

pub(crate) fn peek(handle: usize) -> u64 {
    unsafe { SIG_TABLE[handle].value }
}

pub(crate) fn drive(handle: usize, value: u64) {
    unsafe {
        let sig = &mut SIG_TABLE[handle];
        if matches!(sig.kind, ObjectKind::Param | ObjectKind::Hier) {
            panic!("can't drive {}", sig.name);
        }
        let masked = if sig.width >= 64 {
            value
        } else {
            value & ((1u64 << sig.width) - 1)
        };
        if sig.value == masked {
            return;
        }
        sig.value = masked;
        let kind = if sig.width == 1 {
            match masked {
                1 => EdgeKind::Rising,
                _ => EdgeKind::Falling,
            }
        } else {
            EdgeKind::Any
        };
        CHANGES.push_back((handle, kind));
    }
}

pub fn now() -> u64 {
    SIM_TIME.load(Ordering::Relaxed)
}

pub(crate) fn schedule_wakeup(t_abs: u64) {
    unsafe {
        if !TIME_SET.insert(t_abs) {
            panic!("wakeup already scheduled at t={}", t_abs);
        }
    }
}

pub(crate) fn cancel_wakeup(t_abs: u64) {
    unsafe {
        TIME_SET.remove(&t_abs);
    }
}

pub(crate) fn arm_read_only() {
    RO_ARMED.store(true, Ordering::Relaxed);
}

pub(crate) fn disarm_read_only() {
    RO_ARMED.store(false, Ordering::Relaxed);
}

// Drain queued signal changes: every change is first seen by the device
// model (which may queue further changes), then offered to edge waiters.
fn settle() {
    loop {
        let next = unsafe { CHANGES.pop_front() };
        match next {
            Some((handle, kind)) => {
                MODEL.with_mut(|m| {
                    if let Some(core) = m.as_mut() {
                        core.eval();
                    }
                });
                trigger::react_edge(handle, kind);
            }
            None => break,
        }
    }
}

fn run_sim() {
    loop {
        let t = now();
        if unsafe { TIME_SET.remove(&t) } {
            trigger::react_time(t);
        }
        settle();
        while RO_ARMED.swap(false, Ordering::Relaxed) {
            trigger::react_ro();
            settle();
        }
        let next = unsafe { TIME_SET.iter().next().copied() };
        match next {
            Some(t_next) => SIM_TIME.store(t_next, Ordering::Relaxed),
            None => break,
        }
    }
}

/// Convert a duration to simulation steps. Kernel precision is 1 ns.
pub fn steps(time: u64, unit: &str) -> u64 {
    match unit {
        "ns" => time,
        "us" => time * 1_000,
        "ms" => time * 1_000_000,
        "sec" => time * 1_000_000_000,
        _ => panic!("unsupported time unit: {}", unit),
    }
}

pub fn log(msg: &str) {
    println!("{:>10} ns  {}", now().to_formatted_string(&Locale::en), msg);
}

/// Run one full session: bring up the device, execute every registered
/// scenario in order and report the outcomes. Kernel state is process-global,
/// so at most one session can run per process.
pub fn run_session(cfg: DeviceConfig, tests: Tests) -> SessionSummary {
    if crate::test::TESTS.set(tests).is_err() {
        panic!("a session has already run in this process");
    }
    init_session(cfg);
    crate::start_of_simulation();
    run_sim();
    crate::end_of_simulation()
}

#[macro_export]
macro_rules! run_scenarios {
    ($( $i:ident ),+ $(,)?) => {
        fn main() {
            $crate::CRATE_NAME
                .set(std::module_path!().to_string())
                .expect("main entered twice");
            let mut tests = $crate::test::Tests::new();
            $(
                tests.push($crate::test::Test::new(
                    stringify!($i).to_string(),
                    |dut| $crate::prelude::FutureExt::boxed($i(dut)),
                ));
            )+
            let summary = $crate::sim::run_session(
                $crate::device::DeviceConfig::default(),
                tests,
            );
            if !summary.all_passed() {
                std::process::exit(1);
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::steps;

    #[test]
    fn step_conversion_is_ns_based() {
        assert_eq!(steps(7, "ns"), 7);
        assert_eq!(steps(3, "us"), 3_000);
        assert_eq!(steps(2, "ms"), 2_000_000);
        assert_eq!(steps(1, "sec"), 1_000_000_000);
    }
}
