//! Deadline-ordered store of suspended continuations.
//!
//! Entries are kept sorted by `(deadline, id)`, so expired entries always form
//! a prefix and a sweep can stop at the first entry that is still in the
//! future.

use crate::task::TaskId;

use std::collections::BTreeSet;
use std::time::Instant;

#[derive(Debug, Default)]
pub(crate) struct WaitSet {
    entries: BTreeSet<(Instant, TaskId)>,
}

impl WaitSet {
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeSet::new(),
        }
    }

    /// Files `id` under `deadline`.
    pub(crate) fn insert(&mut self, deadline: Instant, id: TaskId) {
        self.entries.insert((deadline, id));
    }

    pub(crate) fn remove(&mut self, deadline: Instant, id: TaskId) -> bool {
        self.entries.remove(&(deadline, id))
    }

    /// Removes every entry with `deadline <= now`, earliest first, handing
    /// each id to `promote`. Returns how many entries were promoted.
    pub(crate) fn promote_expired(&mut self, now: Instant, mut promote: impl FnMut(TaskId)) -> usize {
        let mut promoted = 0;

        while let Some(&(deadline, id)) = self.entries.first() {
            if deadline > now {
                break;
            }

            self.entries.pop_first();
            promote(id);
            promoted += 1;
        }

        promoted
    }

    /// Earliest deadline still pending.
    pub(crate) fn next_deadline(&self) -> Option<Instant> {
        self.entries.first().map(|&(deadline, _)| deadline)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::slab::Key;

    use std::time::Duration;

    fn id(index: u32) -> TaskId {
        TaskId(Key {
            index,
            generation: 0,
        })
    }

    #[test]
    fn promotes_only_expired_prefix() {
        let base = Instant::now();
        let mut wait = WaitSet::new();
        wait.insert(base + Duration::from_millis(5), id(0));
        wait.insert(base + Duration::from_millis(1), id(1));
        wait.insert(base + Duration::from_millis(3), id(2));

        let mut promoted = Vec::new();
        let count = wait.promote_expired(base + Duration::from_millis(3), |id| promoted.push(id));

        assert_eq!(count, 2);
        assert_eq!(promoted, vec![id(1), id(2)]);
        assert_eq!(wait.len(), 1);
        assert_eq!(wait.next_deadline(), Some(base + Duration::from_millis(5)));
    }

    #[test]
    fn equal_deadlines_break_ties_by_id() {
        let deadline = Instant::now();
        let mut wait = WaitSet::new();
        wait.insert(deadline, id(7));
        wait.insert(deadline, id(2));
        wait.insert(deadline, id(4));

        let mut promoted = Vec::new();
        wait.promote_expired(deadline, |id| promoted.push(id));

        assert_eq!(promoted, vec![id(2), id(4), id(7)]);
        assert!(wait.is_empty());
    }

    #[test]
    fn remove_targets_exact_entry() {
        let deadline = Instant::now();
        let mut wait = WaitSet::new();
        wait.insert(deadline, id(1));

        assert!(!wait.remove(deadline, id(2)));
        assert!(wait.remove(deadline, id(1)));
        assert!(wait.is_empty());
    }
}
