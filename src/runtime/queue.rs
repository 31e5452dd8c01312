//! FIFO of continuations eligible to run immediately.

use crate::task::TaskId;

use std::collections::VecDeque;

/// Ready Queue: continuations are resumed in the order they entered.
///
/// Holds ids only; the continuation state lives in the scheduler's arena.
#[derive(Debug, Default)]
pub(crate) struct ReadyQueue {
    queue: VecDeque<TaskId>,
}

impl ReadyQueue {
    pub(crate) fn new() -> Self {
        Self {
            queue: VecDeque::new(),
        }
    }

    /// Appends a continuation to the back of the queue.
    pub(crate) fn enqueue(&mut self, id: TaskId) {
        self.queue.push_back(id);
    }

    /// Removes the continuation at the front of the queue.
    ///
    /// # Panics
    /// Panics if the queue is empty. Callers check [`Self::is_empty`] first.
    pub(crate) fn dequeue(&mut self) -> TaskId {
        self.queue
            .pop_front()
            .expect("dequeue on an empty ready queue")
    }

    /// Drops every queued occurrence of `id`.
    pub(crate) fn remove(&mut self, id: TaskId) {
        self.queue.retain(|queued| *queued != id);
    }

    pub(crate) fn len(&self) -> usize {
        self.queue.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
