//! Time source consumed by the scheduler.
//!
//! The scheduler needs exactly two things from its environment: a monotonic
//! reading of "now" and a way to pause the (single) scheduler thread. Both go
//! through [`Clock`] so tests can swap in a [`ManualClock`] and observe sweep
//! behavior without depending on real elapsed time.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Monotonic time source plus a sleep primitive for the calling thread.
pub trait Clock {
    /// Current monotonic time.
    fn now(&self) -> Instant;

    /// Suspends the calling thread for `duration`.
    fn pause(&self, duration: Duration);
}

/// Real time: [`Instant::now`] and [`std::thread::sleep`].
#[derive(Clone, Copy, Debug, Default)]
pub struct MonotonicClock;

impl Clock for MonotonicClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn pause(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Virtual time that only moves when paused or advanced.
///
/// Clones share the same timeline, so a test can keep one handle while the
/// scheduler owns another.
///
/// # Example
/// ```
/// use cosched::clock::{Clock, ManualClock};
/// use std::time::Duration;
///
/// let clock = ManualClock::new();
/// let start = clock.now();
/// clock.pause(Duration::from_millis(5));
/// assert_eq!(clock.now() - start, Duration::from_millis(5));
/// ```
#[derive(Clone, Debug)]
pub struct ManualClock {
    origin: Instant,
    offset: Rc<Cell<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Rc::new(Cell::new(Duration::ZERO)),
        }
    }

    /// Moves virtual time forward without going through the scheduler.
    pub fn advance(&self, by: Duration) {
        self.offset.set(self.offset.get() + by);
    }

    /// Virtual time elapsed since the clock was created.
    pub fn elapsed(&self) -> Duration {
        self.offset.get()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.offset.get()
    }

    fn pause(&self, duration: Duration) {
        self.advance(duration);
    }
}
