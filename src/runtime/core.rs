//! Single-threaded cooperative scheduler.
//!
//! The scheduler owns one Ready Queue, one Wait Set and the arena holding
//! every live continuation. Its run loop alternates between resuming
//! everything that is ready and sweeping expired deadlines back into the
//! Ready Queue, pausing briefly whenever nothing is runnable:
//!
//! ```text
//! while ready or waiting:
//!     loop:
//!         drain_ready()      resume until the Ready Queue is empty
//!         sweep_wait()       promote deadline <= now, then a short pause
//!         break if nothing became ready
//!     idle pause
//! ```

use crate::builder::Builder;
use crate::clock::Clock;
use crate::error::Fault;
use crate::runtime::context::enter_context;
use crate::runtime::fault::FaultPolicy;
use crate::runtime::queue::ReadyQueue;
use crate::runtime::wait::WaitSet;
use crate::runtime::waker::make_waker;
use crate::task::{Resumable, Stepper, Submit, Task, TaskId, TaskState};
use crate::utils::slab::Slab;

use futures::future::LocalBoxFuture;
use std::cell::RefCell;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll, Waker};
use std::time::{Duration, Instant};

static NEXT_INSTANCE: AtomicU64 = AtomicU64::new(1);

/// Counters describing one [`Scheduler::run_until_idle`] call.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct RunReport {
    /// Passes of the outer run loop (one idle pause each).
    pub iterations: u64,

    /// Wait Set sweeps performed.
    pub sweeps: u64,

    /// Continuation resumes, including the ones that completed or faulted.
    pub resumes: u64,

    /// Continuations that ran to completion.
    pub completed: u64,

    /// Faults kept under [`FaultPolicy::Collect`].
    pub faults: Vec<Fault>,
}

/// Stores shared between the scheduler and the continuations it resumes.
pub(crate) struct Stores {
    pub(crate) tasks: Slab<Task>,
    pub(crate) ready: ReadyQueue,
    pub(crate) wait: WaitSet,
    pub(crate) running: Option<TaskId>,
}

impl Stores {
    /// Frees a finished continuation's slot and any store entry it left
    /// behind during its final resume.
    fn release(&mut self, id: TaskId) {
        let Some(task) = self.tasks.remove(id.key()) else {
            return;
        };

        match task.state {
            TaskState::Ready => self.ready.remove(id),
            TaskState::Waiting(deadline) => {
                self.wait.remove(deadline, id);
            }
            TaskState::Running | TaskState::Parked => {}
        }
    }
}

// A continuation's destructor runs outside the resume that finished it; a
// panic there is not allowed to take the run loop down.
fn drop_quietly(future: LocalBoxFuture<'static, ()>) {
    if panic::catch_unwind(AssertUnwindSafe(move || drop(future))).is_err() {
        tracing::error!("continuation panicked while being dropped");
    }
}

/// Scheduler state reachable from the thread-local context.
///
/// Borrows of `stores` are always short and never held across a poll.
pub(crate) struct Shared {
    instance: u64,
    pub(crate) clock: Rc<dyn Clock>,
    pub(crate) stores: RefCell<Stores>,
}

impl Shared {
    fn new(clock: Rc<dyn Clock>) -> Self {
        Self {
            instance: NEXT_INSTANCE.fetch_add(1, Ordering::Relaxed),
            clock,
            stores: RefCell::new(Stores {
                tasks: Slab::new(),
                ready: ReadyQueue::new(),
                wait: WaitSet::new(),
                running: None,
            }),
        }
    }

    pub(crate) fn instance(&self) -> u64 {
        self.instance
    }

    /// Adds a continuation to the arena and appends it to the Ready Queue.
    pub(crate) fn submit(&self, future: LocalBoxFuture<'static, ()>) -> TaskId {
        let mut stores = self.stores.borrow_mut();

        let key = stores.tasks.insert(Task {
            state: TaskState::Ready,
            future: Some(future),
            waker: Waker::noop().clone(),
        });
        let id = TaskId(key);

        if let Some(task) = stores.tasks.get_mut(key) {
            task.waker = make_waker(self.instance, id);
        }
        stores.ready.enqueue(id);

        tracing::debug!(task = %id, "continuation submitted");
        id
    }

    /// Files the running continuation into the Ready Queue, or a parked one
    /// back into it. Ready and waiting continuations are left where they are.
    pub(crate) fn wake(&self, id: TaskId) {
        let mut stores = self.stores.borrow_mut();
        let Stores { tasks, ready, .. } = &mut *stores;

        let Some(task) = tasks.get_mut(id.key()) else {
            tracing::trace!(task = %id, "wake for finished continuation ignored");
            return;
        };

        match task.state {
            TaskState::Running | TaskState::Parked => {
                task.state = TaskState::Ready;
                ready.enqueue(id);
            }
            TaskState::Ready | TaskState::Waiting(_) => {
                tracing::trace!(task = %id, state = ?task.state, "redundant wake ignored");
            }
        }
    }

    /// Files the running continuation into the Wait Set under `deadline`.
    ///
    /// Only the first suspension requested during a single resume takes
    /// effect, so a continuation sits in at most one store.
    pub(crate) fn suspend_until(&self, deadline: Instant) {
        let mut stores = self.stores.borrow_mut();
        let Stores {
            tasks,
            wait,
            running,
            ..
        } = &mut *stores;

        let Some(id) = *running else {
            panic!("timeout() polled outside of a running continuation");
        };

        if let Some(task) = tasks.get_mut(id.key())
            && task.state == TaskState::Running
        {
            task.state = TaskState::Waiting(deadline);
            wait.insert(deadline, id);
        }
    }
}

/// Cooperative scheduler multiplexing timed continuations onto one thread.
///
/// # Example
/// ```
/// use cosched::{Scheduler, timeout_ms};
///
/// let mut scheduler = Scheduler::new();
/// for _ in 0..3 {
///     scheduler.submit(async {
///         timeout_ms(1).await;
///         timeout_ms(1).await;
///     });
/// }
///
/// let report = scheduler.run_until_idle();
/// assert_eq!(report.completed, 3);
/// assert!(scheduler.is_idle());
/// ```
///
/// # Waking
/// A [`Waker`](std::task::Waker) handed to a continuation is honored only
/// while this scheduler drains its Ready Queue, i.e. when it is invoked from
/// a continuation of the same scheduler. A wake issued by the driving code
/// between calls, or from inside another scheduler, is dropped with a
/// warning and the target stays parked.
pub struct Scheduler {
    shared: Rc<Shared>,
    sweep_pause: Duration,
    idle_pause: Duration,
    fault_policy: FaultPolicy,
    report: RunReport,
}

impl Scheduler {
    /// Creates a scheduler on the real monotonic clock with default pauses.
    pub fn new() -> Self {
        Builder::new().build()
    }

    /// Returns a [`Builder`] for configuring a scheduler.
    pub fn builder() -> Builder {
        Builder::new()
    }

    pub(crate) fn from_parts(
        clock: Rc<dyn Clock>,
        sweep_pause: Duration,
        idle_pause: Duration,
        fault_policy: FaultPolicy,
    ) -> Self {
        Self {
            shared: Rc::new(Shared::new(clock)),
            sweep_pause,
            idle_pause,
            fault_policy,
            report: RunReport::default(),
        }
    }

    /// Appends a new continuation to the Ready Queue.
    ///
    /// Nothing runs until [`drain_ready`](Self::drain_ready) or
    /// [`run_until_idle`](Self::run_until_idle) is called.
    ///
    /// # Arguments
    /// * `continuation` - Future resumed cooperatively until it completes
    ///
    /// # Returns
    /// The [`TaskId`] of the new continuation
    pub fn submit<F>(&self, continuation: F) -> TaskId
    where
        F: Future<Output = ()> + 'static,
    {
        self.shared.submit(Box::pin(continuation))
    }

    /// Appends an explicit state machine to the Ready Queue.
    pub fn submit_resumable<R>(&self, resumable: R) -> TaskId
    where
        R: Resumable + Unpin + 'static,
    {
        self.submit(Stepper::new(resumable))
    }

    /// Resumes continuations from the front of the Ready Queue until it is
    /// empty, including any that resumed continuations put there.
    pub fn drain_ready(&mut self) {
        let shared = self.shared.clone();

        enter_context(shared, || {
            loop {
                let id = {
                    let mut stores = self.shared.stores.borrow_mut();
                    if stores.ready.is_empty() {
                        break;
                    }
                    stores.ready.dequeue()
                };

                self.resume(id);
            }
        });
    }

    /// Promotes every Wait Set entry whose deadline has passed into the
    /// Ready Queue, then pauses for the sweep interval.
    ///
    /// "Now" is sampled once, before scanning.
    pub fn sweep_wait(&mut self) {
        let now = self.shared.clock.now();

        {
            let mut stores = self.shared.stores.borrow_mut();
            let Stores {
                tasks, ready, wait, ..
            } = &mut *stores;

            let promoted = wait.promote_expired(now, |id| {
                if let Some(task) = tasks.get_mut(id.key()) {
                    task.state = TaskState::Ready;
                }
                ready.enqueue(id);
            });

            tracing::trace!(
                promoted,
                waiting = wait.len(),
                next_deadline = ?wait.next_deadline().map(|d| d.saturating_duration_since(now)),
                "wait set swept"
            );
        }

        self.report.sweeps += 1;
        self.shared.clock.pause(self.sweep_pause);
    }

    /// Runs until both the Ready Queue and the Wait Set are empty.
    ///
    /// Blocks the calling thread. Parked continuations do not keep the loop
    /// alive.
    ///
    /// # Returns
    /// The counters gathered since the previous call. With nothing submitted
    /// it returns immediately with every counter at zero.
    ///
    /// # Example
    /// ```
    /// use cosched::{Scheduler, yield_now};
    ///
    /// let mut scheduler = Scheduler::new();
    /// scheduler.submit(async {
    ///     yield_now().await;
    /// });
    ///
    /// let report = scheduler.run_until_idle();
    /// assert_eq!(report.resumes, 2);
    /// assert_eq!(report.completed, 1);
    /// ```
    pub fn run_until_idle(&mut self) -> RunReport {
        while !self.is_idle() {
            loop {
                self.drain_ready();
                self.sweep_wait();

                if self.ready_len() == 0 {
                    break;
                }
            }

            self.shared.clock.pause(self.idle_pause);
            self.report.iterations += 1;
        }

        let parked = self.parked_len();
        if parked > 0 {
            tracing::warn!(parked, "run loop idle with parked continuations left behind");
        }

        let report = std::mem::take(&mut self.report);
        tracing::debug!(
            iterations = report.iterations,
            sweeps = report.sweeps,
            resumes = report.resumes,
            completed = report.completed,
            faults = report.faults.len(),
            "run loop finished"
        );

        report
    }

    /// Number of continuations in the Ready Queue.
    pub fn ready_len(&self) -> usize {
        self.shared.stores.borrow().ready.len()
    }

    /// Number of continuations in the Wait Set.
    pub fn wait_len(&self) -> usize {
        self.shared.stores.borrow().wait.len()
    }

    /// Live continuations: ready, waiting or parked.
    pub fn live_len(&self) -> usize {
        self.shared.stores.borrow().tasks.len()
    }

    /// `true` when both the Ready Queue and the Wait Set are empty.
    pub fn is_idle(&self) -> bool {
        let stores = self.shared.stores.borrow();
        stores.ready.is_empty() && stores.wait.is_empty()
    }

    /// Policy applied when a continuation panics while resumed.
    pub fn fault_policy(&self) -> FaultPolicy {
        self.fault_policy
    }

    fn parked_len(&self) -> usize {
        let stores = self.shared.stores.borrow();
        stores
            .tasks
            .len()
            .saturating_sub(stores.ready.len() + stores.wait.len())
    }

    // Polls one continuation. The stores are never borrowed across the poll.
    fn resume(&mut self, id: TaskId) {
        let taken = {
            let mut stores = self.shared.stores.borrow_mut();

            match stores.tasks.get_mut(id.key()) {
                Some(task) => {
                    task.state = TaskState::Running;
                    let taken = task.future.take().map(|future| (future, task.waker.clone()));
                    stores.running = Some(id);
                    taken
                }
                None => None,
            }
        };

        let Some((mut future, waker)) = taken else {
            tracing::trace!(task = %id, "stale ready entry skipped");
            return;
        };

        let mut cx = Context::from_waker(&waker);
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| future.as_mut().poll(&mut cx)));

        self.report.resumes += 1;
        let mut stores = self.shared.stores.borrow_mut();
        stores.running = None;

        match outcome {
            Ok(Poll::Ready(())) => {
                stores.release(id);
                drop(stores);
                drop_quietly(future);

                self.report.completed += 1;
                tracing::trace!(task = %id, "continuation completed");
            }
            Ok(Poll::Pending) => {
                if let Some(task) = stores.tasks.get_mut(id.key()) {
                    task.future = Some(future);

                    if task.state == TaskState::Running {
                        task.state = TaskState::Parked;
                        tracing::trace!(task = %id, "continuation parked");
                    }
                }
            }
            Err(payload) => {
                stores.release(id);
                drop(stores);
                drop_quietly(future);

                self.on_fault(Fault::from_panic(id, payload));
            }
        }
    }

    fn on_fault(&mut self, fault: Fault) {
        match self.fault_policy {
            FaultPolicy::Discard => {}
            FaultPolicy::Log => {
                tracing::error!(task = %fault.task, message = %fault.message, "continuation faulted");
            }
            FaultPolicy::Collect => {
                tracing::error!(task = %fault.task, message = %fault.message, "continuation faulted");
                self.report.faults.push(fault);
            }
        }
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Submit for Scheduler {
    fn submit<F>(&self, continuation: F) -> TaskId
    where
        F: Future<Output = ()> + 'static,
    {
        Scheduler::submit(self, continuation)
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        let drained = self.shared.stores.borrow_mut().tasks.drain();

        if !drained.is_empty() {
            tracing::warn!(
                remaining = drained.len(),
                "scheduler dropped with unfinished continuations"
            );
        }

        // Destructors may call back into the stores.
        drop(drained);
    }
}
