use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Cooperative scheduling point: suspends once and re-enters the Ready Queue.
///
/// The continuation runs again after everything already queued ahead of it.
/// Unlike a zero-length [`timeout`](crate::timeout), it never visits the
/// Wait Set, so it does not wait for a sweep.
pub fn yield_now() -> YieldNow {
    YieldNow { yielded: false }
}

/// Future returned by [`yield_now`].
#[derive(Debug)]
#[must_use = "futures do nothing unless awaited"]
pub struct YieldNow {
    yielded: bool,
}

impl Future for YieldNow {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.yielded {
            return Poll::Ready(());
        }

        self.yielded = true;
        cx.waker().wake_by_ref();
        Poll::Pending
    }
}
