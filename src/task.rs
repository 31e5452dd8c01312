//! Continuations and their identities.
//!
//! A continuation is any `'static` future with `Output = ()`. The scheduler
//! stores it in an arena slot and hands out a [`TaskId`] naming that slot.
//! Each resume polls the future once; a continuation suspends only by
//! awaiting [`timeout`](crate::time::timeout) or [`yield_now`](crate::yield_now),
//! which file it into the Wait Set or the Ready Queue respectively.
//!
//! # Spawning from inside a continuation
//!
//! ```ignore
//! use cosched::{spawn, timeout_ms};
//!
//! async fn parent() {
//!     spawn(async {
//!         timeout_ms(1).await;
//!     });
//! }
//! ```
//!
//! # Explicit state machines
//!
//! Code that prefers a hand-written state machine over `async` implements
//! [`Resumable`] and is submitted through
//! [`Scheduler::submit_resumable`](crate::Scheduler::submit_resumable).

use crate::runtime::context;
use crate::time::Timeout;
use crate::utils::slab::Key;

use futures::future::LocalBoxFuture;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll, Waker};
use std::time::{Duration, Instant};

/// Stable identity of a continuation within one scheduler.
///
/// Ids are ordered, which gives the Wait Set its deterministic tiebreak for
/// equal deadlines. An id is never reused for a different continuation.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(pub(crate) Key);

impl TaskId {
    pub(crate) fn key(self) -> Key {
        self.0
    }
}

impl fmt::Debug for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TaskId({}.{})", self.0.index, self.0.generation)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}.{}", self.0.index, self.0.generation)
    }
}

/// Where a live continuation currently sits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TaskState {
    /// Queued in the Ready Queue.
    Ready,
    /// Being polled right now.
    Running,
    /// Filed in the Wait Set under this deadline.
    Waiting(Instant),
    /// Returned `Pending` without filing itself anywhere; only an explicit
    /// wake brings it back.
    Parked,
}

/// Arena slot for one continuation.
pub(crate) struct Task {
    pub(crate) state: TaskState,
    /// Taken out while the continuation runs.
    pub(crate) future: Option<LocalBoxFuture<'static, ()>>,
    pub(crate) waker: Waker,
}

/// Result of one [`Resumable::step`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// The computation finished.
    Completed,
    /// Run again after everything currently ready.
    Yield,
    /// Suspend for a relative delay.
    SuspendFor(Duration),
    /// Suspend until an absolute deadline on the scheduler's clock.
    SuspendUntil(Instant),
}

/// A continuation written as an explicit state machine.
///
/// Each call to `step` runs up to the next suspension point and reports it.
///
/// ```
/// use cosched::{Resumable, Scheduler, Step};
/// use std::time::Duration;
///
/// struct Countdown(u32);
///
/// impl Resumable for Countdown {
///     fn step(&mut self) -> Step {
///         if self.0 == 0 {
///             return Step::Completed;
///         }
///         self.0 -= 1;
///         Step::SuspendFor(Duration::from_millis(1))
///     }
/// }
///
/// let mut scheduler = Scheduler::new();
/// scheduler.submit_resumable(Countdown(3));
/// let report = scheduler.run_until_idle();
/// assert_eq!(report.completed, 1);
/// ```
pub trait Resumable {
    fn step(&mut self) -> Step;
}

/// Drives a [`Resumable`] as a continuation future.
pub(crate) struct Stepper<R> {
    inner: R,
    suspended: Option<Timeout>,
}

impl<R> Stepper<R> {
    pub(crate) fn new(inner: R) -> Self {
        Self {
            inner,
            suspended: None,
        }
    }
}

impl<R: Resumable + Unpin> Future for Stepper<R> {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let this = self.get_mut();

        if let Some(timeout) = this.suspended.as_mut() {
            if Pin::new(timeout).poll(cx).is_pending() {
                return Poll::Pending;
            }
            this.suspended = None;
        }

        let mut timeout = match this.inner.step() {
            Step::Completed => return Poll::Ready(()),
            Step::Yield => {
                cx.waker().wake_by_ref();
                return Poll::Pending;
            }
            Step::SuspendFor(delay) => Timeout::after(delay),
            Step::SuspendUntil(deadline) => Timeout::until(deadline),
        };

        // First poll of a fresh timeout always files it into the Wait Set.
        let _ = Pin::new(&mut timeout).poll(cx);
        this.suspended = Some(timeout);

        Poll::Pending
    }
}

/// Dispatch surface shared by every scheduler flavor.
///
/// The single-threaded [`Scheduler`](crate::Scheduler) implements it today;
/// a worker-pool scheduler would implement the same entry point.
pub trait Submit {
    fn submit<F>(&self, continuation: F) -> TaskId
    where
        F: Future<Output = ()> + 'static;
}

/// Submits a continuation to the scheduler currently resuming this one.
///
/// # Panics
/// Panics if called outside of a running continuation.
pub fn spawn<F>(continuation: F) -> TaskId
where
    F: Future<Output = ()> + 'static,
{
    context::current("spawn()").submit(Box::pin(continuation))
}
