use futures::{
    future::{BoxFuture, FutureExt},
    task::{waker_ref, ArcWake, Context, Poll},
};
use futures_channel::oneshot;
use lazy_mut::lazy_mut;
use queues::{IsQueue, Queue};
use std::{
    future::Future,
    pin::Pin,
    sync::{Arc, Mutex},
};

use crate::error::TbError;
use crate::TestResult;

lazy_mut! {
    static mut READY_QUEUE: Queue<Arc<Task>> = Queue::new();
}

pub(crate) fn schedule_task(task: Arc<Task>) {
    unsafe {
        READY_QUEUE.add(task).expect("error queueing task");
    }
}

fn next_task() -> Option<Arc<Task>> {
    unsafe { READY_QUEUE.remove().ok() }
}

pub(crate) fn clear_ready_queue() {
    while unsafe { READY_QUEUE.remove().is_ok() } {}
}

// Run every ready task until it suspends or completes. Reactions to kernel
// events call this again, so a woken task executes within the same timestep.
#[inline]
pub(crate) fn run_once() {
    while let Some(task) = next_task() {
        process_task(task);
    }
}

fn process_task(task: Arc<Task>) {
    if *task.state.lock().unwrap() == TaskState::Cancelled {
        // dropped once all references disappear
        return;
    }

    let mut fut_slot = task.future.lock().unwrap();
    if let Some(mut fut) = fut_slot.take() {
        let waker = waker_ref(&task);
        let context = &mut Context::from_waker(&waker);
        let result = match fut.as_mut().poll(context) {
            Poll::Pending => {
                *fut_slot = Some(fut);
                None
            }
            Poll::Ready(result) => Some(result),
        };
        if let Some(result) = result {
            let mut tx_slot = task.join_tx.lock().unwrap();
            // the join handle may have been dropped without being awaited
            let _ = tx_slot.take().expect("task completed twice").send(result);
        }
    } else {
        panic!("scheduled a completed or uninitialized task ({})", task.name);
    }
}

#[derive(PartialEq)]
enum TaskState {
    Pending,
    Cancelled,
}

pub struct Task {
    future: Mutex<Option<BoxFuture<'static, TestResult>>>,
    state: Mutex<TaskState>,
    name: String,
    join_tx: Mutex<Option<oneshot::Sender<TestResult>>>,
}

impl Task {
    pub fn fork(future: impl Future<Output = TestResult> + Send + 'static) -> JoinHandle {
        Task::spawn_from_future(future, "forked")
    }
    pub fn spawn_from_future(
        future: impl Future<Output = TestResult> + Send + 'static,
        name: &str,
    ) -> JoinHandle {
        let (task, join_handle) = Task::new(future.boxed(), name);
        schedule_task(task);
        join_handle
    }
    fn new(fut: BoxFuture<'static, TestResult>, name: &str) -> (Arc<Self>, JoinHandle) {
        let (tx, rx) = oneshot::channel::<TestResult>();
        let task = Arc::new(Self {
            future: Mutex::new(Some(fut)),
            state: Mutex::new(TaskState::Pending),
            name: name.to_string(),
            join_tx: Mutex::new(Some(tx)),
        });
        let join_handle = JoinHandle {
            awaited_task: Some(task.clone()),
            join_rx: rx,
        };
        (task, join_handle)
    }
    pub fn cancel(&self) {
        // the executor drops the task without further execution on wake
        *self.state.lock().unwrap() = TaskState::Cancelled;
    }
}

impl ArcWake for Task {
    fn wake_by_ref(arc_self: &Arc<Self>) {
        schedule_task(arc_self.clone());
    }
}

pub struct JoinHandle {
    awaited_task: Option<Arc<Task>>,
    join_rx: oneshot::Receiver<TestResult>,
}

impl JoinHandle {
    pub(crate) fn task(&self) -> Option<Arc<Task>> {
        self.awaited_task.clone()
    }
    pub fn cancel(mut self) {
        let task = self.awaited_task.take().expect("task already cancelled");
        task.cancel();
    }
}

impl Future for JoinHandle {
    type Output = TestResult;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match self.join_rx.poll_unpin(cx) {
            // a task torn down mid-flight never sends a result
            Poll::Ready(result) => Poll::Ready(result.unwrap_or(Err(TbError::Cancelled))),
            Poll::Pending => Poll::Pending,
        }
    }
}
