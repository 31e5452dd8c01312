//! The timed suspension point.
//!
//! The first poll of a [`Timeout`] fixes its deadline on the scheduler's clock
//! and files the running continuation into the Wait Set. Later polls complete
//! once the clock has reached the deadline.

use crate::runtime::context;

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

/// Suspends the running continuation for at least `delay`.
///
/// The deadline is computed when the returned future is first polled. A zero
/// delay still suspends until the next sweep. Delays too large for the clock
/// are clamped to a deadline decades away.
///
/// # Arguments
/// * `delay` - Minimum time between suspension and resumption
///
/// # Returns
/// A [`Timeout`] future resolving once the deadline has been swept
///
/// # Example
/// ```ignore
/// async fn tick() {
///     timeout(Duration::from_millis(1)).await;
/// }
/// ```
///
/// # Panics
/// The returned future panics if polled outside of a running continuation.
pub fn timeout(delay: Duration) -> Timeout {
    Timeout::after(delay)
}

/// [`timeout`] with a delay in milliseconds.
pub fn timeout_ms(delay: u64) -> Timeout {
    Timeout::after(Duration::from_millis(delay))
}

/// Suspends the running continuation until `deadline` on the scheduler's
/// clock.
///
/// A deadline already in the past still suspends once, until the next sweep.
///
/// # Arguments
/// * `deadline` - Absolute instant on the scheduler's [`Clock`](crate::clock::Clock)
pub fn timeout_until(deadline: Instant) -> Timeout {
    Timeout::until(deadline)
}

// Roughly 30 years; stands in for delays that overflow `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// `now + delay`, clamped to [`FAR_FUTURE`] when the sum overflows.
fn deadline_after(now: Instant, delay: Duration) -> Instant {
    now.checked_add(delay)
        .or_else(|| now.checked_add(FAR_FUTURE))
        .unwrap_or(now)
}

#[derive(Clone, Copy, Debug)]
enum Target {
    After(Duration),
    At(Instant),
}

/// Future returned by [`timeout`].
#[derive(Debug)]
#[must_use = "futures do nothing unless awaited"]
pub struct Timeout {
    target: Target,
    armed: bool,
}

impl Timeout {
    pub(crate) fn after(delay: Duration) -> Self {
        Self {
            target: Target::After(delay),
            armed: false,
        }
    }

    pub(crate) fn until(deadline: Instant) -> Self {
        Self {
            target: Target::At(deadline),
            armed: false,
        }
    }

    /// The absolute deadline, once the first poll has fixed it.
    ///
    /// # Returns
    /// `None` before the first poll, the deadline in effect afterwards
    pub fn deadline(&self) -> Option<Instant> {
        match self.target {
            Target::At(deadline) if self.armed => Some(deadline),
            _ => None,
        }
    }
}

impl Future for Timeout {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<()> {
        let shared = context::current("timeout()");
        let now = shared.clock.now();

        let deadline = match self.target {
            Target::After(delay) => {
                let deadline = deadline_after(now, delay);
                self.target = Target::At(deadline);
                deadline
            }
            Target::At(deadline) => deadline,
        };

        if self.armed && now >= deadline {
            return Poll::Ready(());
        }

        self.armed = true;
        shared.suspend_until(deadline);

        Poll::Pending
    }
}
