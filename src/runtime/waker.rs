//! Waker that re-files a continuation into its scheduler's Ready Queue.
//!
//! The waker carries ids only: the owning scheduler's instance id and the
//! continuation's [`TaskId`]. Waking resolves the scheduler through the
//! thread-local context, so a wake delivered outside that scheduler (another
//! thread, or another scheduler instance) is dropped.

use crate::runtime::context;
use crate::task::TaskId;

use std::sync::Arc;
use std::task::{Wake, Waker};

pub(crate) struct TaskWaker {
    scheduler: u64,
    task: TaskId,
}

impl Wake for TaskWaker {
    fn wake(self: Arc<Self>) {
        self.wake_by_ref();
    }

    fn wake_by_ref(self: &Arc<Self>) {
        match context::try_current() {
            Some(shared) if shared.instance() == self.scheduler => shared.wake(self.task),
            _ => tracing::warn!(
                task = %self.task,
                scheduler = self.scheduler,
                "wake outside of the owning scheduler ignored"
            ),
        }
    }
}

/// Creates the waker handed to `task` on every resume.
pub(crate) fn make_waker(scheduler: u64, task: TaskId) -> Waker {
    Waker::from(Arc::new(TaskWaker { scheduler, task }))
}
