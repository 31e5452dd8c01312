//! Thread-local scheduler context.
//!
//! While a scheduler drains its Ready Queue it installs its shared state here,
//! so suspension points ([`timeout`](crate::timeout), [`yield_now`](crate::yield_now))
//! and [`spawn`](crate::spawn) can reach the scheduler without being handed a
//! reference. The previous context is restored on exit, so a continuation may
//! drive a nested scheduler of its own.

use crate::runtime::core::Shared;

use std::cell::RefCell;
use std::rc::Rc;

thread_local! {
    /// Shared state of the scheduler currently resuming continuations on
    /// this thread.
    static CURRENT: RefCell<Option<Rc<Shared>>> = const { RefCell::new(None) };
}

// Restores the previous context even if the closure unwinds.
struct Restore(Option<Rc<Shared>>);

impl Drop for Restore {
    fn drop(&mut self) {
        let previous = self.0.take();
        CURRENT.with(|current| *current.borrow_mut() = previous);
    }
}

/// Runs `function` with `shared` installed as the current scheduler.
pub(crate) fn enter_context<F, R>(shared: Rc<Shared>, function: F) -> R
where
    F: FnOnce() -> R,
{
    let previous = CURRENT.with(|current| current.borrow_mut().replace(shared));
    let _restore = Restore(previous);

    function()
}

/// Returns the current scheduler, if any.
pub(crate) fn try_current() -> Option<Rc<Shared>> {
    CURRENT.with(|current| current.borrow().clone())
}

/// Returns the current scheduler.
///
/// # Panics
/// Panics if no scheduler is resuming a continuation on this thread.
pub(crate) fn current(caller: &str) -> Rc<Shared> {
    try_current().unwrap_or_else(|| {
        panic!(
            "{} called outside of a running continuation; it must be awaited inside a scheduler",
            caller
        )
    })
}
