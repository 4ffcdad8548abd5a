use intmap::IntMap;
use lazy_mut::lazy_mut;
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll, Waker};

use crate::executor;
use crate::signal::SimObject;
use crate::sim;
use crate::value::Val;

// IntMap specializes on u64 keys, so no hashing happens on the hot path.
lazy_mut! {
    // key is the signal handle
    static mut EDGE_MAP: IntMap<VecDeque<TrigShared>> = IntMap::new();
}
lazy_mut! {
    // key is the absolute wakeup time in steps
    static mut TIMER_MAP: IntMap<VecDeque<TrigShared>> = IntMap::new();
}
lazy_mut! {
    static mut READ_ONLY: VecDeque<TrigShared> = VecDeque::new();
}

#[derive(PartialEq, Clone, Copy, Debug)]
pub enum EdgeKind {
    Any,
    Rising,
    Falling,
}

pub(crate) fn cancel_all_triggers() {
    unsafe {
        READ_ONLY.init();
        READ_ONLY.clear();
        sim::disarm_read_only();
        TIMER_MAP.init();
        for (t, _) in TIMER_MAP.drain() {
            sim::cancel_wakeup(t);
        }
        EDGE_MAP.init();
        for (_, _) in EDGE_MAP.drain() {}
    }
}

#[derive(Debug, Clone)]
struct TrigShared {
    waker: Waker,
    // edge waiters record which edge they want, so a wrong-kind edge just
    // puts them back instead of waking them
    edge_kind: EdgeKind,
}

#[derive(Clone)]
enum TrigKind {
    Edge(usize, EdgeKind),
    Timer(u64),
    ReadOnly,
}

#[derive(Clone)]
pub struct Trigger {
    kind: TrigKind,
    awaited: bool,
}

impl Trigger {
    pub fn timer(time: u64, unit: &str) -> Self {
        Trigger {
            kind: TrigKind::Timer(sim::steps(time, unit)),
            awaited: false,
        }
    }
    pub fn timer_steps(steps: u64) -> Self {
        Trigger {
            kind: TrigKind::Timer(steps),
            awaited: false,
        }
    }
    pub async fn timer_ro(time: u64, unit: &str) {
        Trigger::timer(time, unit).await;
        Trigger::read_only().await;
    }
    pub fn edge(signal: SimObject) -> Self {
        Trigger {
            kind: TrigKind::Edge(signal.handle(), EdgeKind::Any),
            awaited: false,
        }
    }
    pub fn rising_edge(signal: SimObject) -> Self {
        Trigger {
            kind: TrigKind::Edge(signal.handle(), EdgeKind::Rising),
            awaited: false,
        }
    }
    pub fn falling_edge(signal: SimObject) -> Self {
        Trigger {
            kind: TrigKind::Edge(signal.handle(), EdgeKind::Falling),
            awaited: false,
        }
    }
    pub fn read_only() -> Self {
        Trigger {
            kind: TrigKind::ReadOnly,
            awaited: false,
        }
    }
}

impl Future for Trigger {
    type Output = Val;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        // A trigger is only awaited once, so a second poll means the waker
        // signaled its completion.
        if self.awaited {
            return Poll::Ready(Val::None);
        }
        self.awaited = true;
        let mut shared = TrigShared {
            waker: cx.waker().clone(),
            edge_kind: EdgeKind::Any,
        };

        match self.kind {
            TrigKind::ReadOnly => unsafe {
                READ_ONLY.push_back(shared);
                sim::arm_read_only();
            },
            TrigKind::Timer(t) => {
                let abs_time = t + sim::now();
                unsafe {
                    if let Some(waiters) = TIMER_MAP.get_mut(abs_time) {
                        waiters.push_back(shared);
                    } else {
                        sim::schedule_wakeup(abs_time);
                        let mut waiters = VecDeque::new();
                        waiters.push_back(shared);
                        TIMER_MAP.insert(abs_time, waiters);
                    }
                }
            }
            TrigKind::Edge(sig_hdl, edge_kind) => {
                shared.edge_kind = edge_kind;
                unsafe {
                    if let Some(waiters) = EDGE_MAP.get_mut(sig_hdl as u64) {
                        waiters.push_back(shared);
                    } else {
                        let mut waiters = VecDeque::new();
                        waiters.push_back(shared);
                        EDGE_MAP.insert(sig_hdl as u64, waiters);
                    }
                }
            }
        }
        Poll::Pending
    }
}

pub(crate) fn react_time(t_abs: u64) {
    let waiters = unsafe { TIMER_MAP.remove(t_abs) };
    match waiters {
        Some(waiters) => {
            for shared in waiters {
                shared.waker.wake();
            }
            executor::run_once();
        }
        None => panic!("did not expect a timer wakeup at t={}", t_abs),
    }
}

// The kernel reports every change of every signal; most have no waiters.
pub(crate) fn react_edge(sig_hdl: usize, edge: EdgeKind) {
    let waiters = unsafe { EDGE_MAP.remove(sig_hdl as u64) };
    let Some(mut waiters) = waiters else {
        return;
    };
    let mut wake: VecDeque<TrigShared> = VecDeque::new();
    let mut resched: VecDeque<TrigShared> = VecDeque::new();
    for trig in waiters.drain(..) {
        if trig.edge_kind == EdgeKind::Any || trig.edge_kind == edge {
            wake.push_back(trig);
        } else {
            resched.push_back(trig);
        }
    }
    if !resched.is_empty() {
        unsafe {
            EDGE_MAP.insert(sig_hdl as u64, resched);
        }
    }
    if !wake.is_empty() {
        for shared in wake {
            shared.waker.wake();
        }
        executor::run_once();
    }
}

pub(crate) fn react_ro() {
    let waiters = unsafe {
        if READ_ONLY.is_empty() {
            return;
        }
        std::mem::take(&mut *READ_ONLY)
    };
    for shared in waiters {
        shared.waker.wake();
    }
    executor::run_once();
}
