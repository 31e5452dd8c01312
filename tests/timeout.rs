use cosched::clock::{Clock, ManualClock};
use cosched::{Builder, FaultPolicy, Scheduler, timeout, timeout_ms, timeout_until};
use std::cell::{Cell, RefCell};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::Poll;
use std::time::{Duration, Instant};

fn manual_scheduler(clock: &ManualClock) -> Scheduler {
    Builder::new()
        .clock(clock.clone())
        .sweep_pause(Duration::ZERO)
        .idle_pause(Duration::ZERO)
        .fault_policy(FaultPolicy::Collect)
        .build()
}

#[test]
fn test_timeout_basic() {
    let mut scheduler = Scheduler::new();

    let start = Instant::now();
    scheduler.submit(async {
        timeout(Duration::from_millis(50)).await;
    });
    let report = scheduler.run_until_idle();
    let elapsed = start.elapsed();

    assert_eq!(report.completed, 1);
    assert!(
        elapsed >= Duration::from_millis(50),
        "Timeout should wait at least the specified duration"
    );
}

#[test]
fn test_three_tasks_three_timeouts() {
    let mut scheduler = Scheduler::new();
    let finished = Rc::new(RefCell::new(0));

    let start = Instant::now();
    for _ in 0..3 {
        let finished = finished.clone();
        scheduler.submit(async move {
            for _ in 0..3 {
                timeout_ms(1).await;
            }
            *finished.borrow_mut() += 1;
        });
    }

    let report = scheduler.run_until_idle();
    let elapsed = start.elapsed();

    assert_eq!(*finished.borrow(), 3, "All 3 continuations should complete");
    assert_eq!(report.completed, 3);
    assert_eq!(report.resumes, 12, "Each continuation resumes once per timeout plus once to start");
    assert!(elapsed >= Duration::from_millis(3));
    assert!(
        elapsed < Duration::from_secs(1),
        "Three 1ms timeouts should not take {:?}",
        elapsed
    );
    assert_eq!(scheduler.ready_len(), 0);
    assert_eq!(scheduler.wait_len(), 0);
    assert!(scheduler.is_idle());
}

#[test]
fn test_timeout_never_resumes_early() {
    let mut scheduler = Scheduler::new();
    let gaps = Rc::new(RefCell::new(Vec::new()));

    for delay in [0u64, 1, 2, 5, 10] {
        let gaps = gaps.clone();
        scheduler.submit(async move {
            for _ in 0..2 {
                let suspended = Instant::now();
                timeout_ms(delay).await;
                gaps.borrow_mut().push((delay, suspended.elapsed()));
            }
        });
    }

    scheduler.run_until_idle();

    let gaps = gaps.borrow();
    assert_eq!(gaps.len(), 10);
    for &(delay, gap) in gaps.iter() {
        assert!(
            gap >= Duration::from_millis(delay),
            "Resumed after {:?}, before its {}ms deadline",
            gap,
            delay
        );
    }
}

#[test]
fn test_zero_timeout_still_suspends() {
    let mut scheduler = Scheduler::new();
    let resumed = Rc::new(RefCell::new(false));
    let resumed_clone = resumed.clone();

    scheduler.submit(async move {
        timeout_ms(0).await;
        *resumed_clone.borrow_mut() = true;
    });

    scheduler.drain_ready();
    assert!(!*resumed.borrow(), "Zero timeout should suspend until the next sweep");
    assert_eq!(scheduler.wait_len(), 1);
    assert_eq!(scheduler.ready_len(), 0);

    scheduler.sweep_wait();
    assert_eq!(scheduler.ready_len(), 1);
    assert_eq!(scheduler.wait_len(), 0);

    scheduler.drain_ready();
    assert!(*resumed.borrow());
    assert_eq!(scheduler.live_len(), 0);
}

#[test]
#[should_panic(expected = "outside of a running continuation")]
fn test_timeout_outside_scheduler_panics() {
    futures::executor::block_on(timeout_ms(1));
}

#[test]
fn test_past_deadline_suspends_until_next_sweep() {
    let clock = ManualClock::new();
    clock.advance(Duration::from_millis(10));
    let mut scheduler = manual_scheduler(&clock);
    let resumed = Rc::new(Cell::new(false));
    let resumed_clone = resumed.clone();

    let deadline = clock.now() - Duration::from_millis(1);
    scheduler.submit(async move {
        timeout_until(deadline).await;
        resumed_clone.set(true);
    });

    scheduler.drain_ready();
    assert!(!resumed.get(), "A past deadline still suspends once");
    assert_eq!(scheduler.wait_len(), 1);

    scheduler.sweep_wait();
    assert_eq!(scheduler.ready_len(), 1);

    scheduler.drain_ready();
    assert!(resumed.get());
    assert_eq!(scheduler.live_len(), 0);
}

#[test]
fn test_absolute_deadline_never_resumes_early() {
    let clock = ManualClock::new();
    let mut scheduler = manual_scheduler(&clock);
    let resumed_at = Rc::new(Cell::new(None));
    let resumed_clone = resumed_at.clone();

    let deadline = clock.now() + Duration::from_millis(7);
    let inner_clock = clock.clone();
    scheduler.submit(async move {
        timeout_until(deadline).await;
        resumed_clone.set(Some(inner_clock.now()));
    });

    scheduler.drain_ready();
    for _ in 0..6 {
        clock.advance(Duration::from_millis(1));
        scheduler.sweep_wait();
        scheduler.drain_ready();
        assert_eq!(resumed_at.get(), None, "Resumed before the deadline");
        assert_eq!(scheduler.wait_len(), 1);
    }

    clock.advance(Duration::from_millis(1));
    scheduler.sweep_wait();
    scheduler.drain_ready();

    assert_eq!(resumed_at.get(), Some(deadline));
    assert_eq!(scheduler.live_len(), 0);
}

#[test]
fn test_deadline_fixed_by_first_poll() {
    let clock = ManualClock::new();
    let mut scheduler = manual_scheduler(&clock);
    let before = Rc::new(Cell::new(None));
    let after = Rc::new(Cell::new(None));

    let (before_clone, after_clone) = (before.clone(), after.clone());
    scheduler.submit(async move {
        let mut pending = timeout_ms(5);
        before_clone.set(Some(pending.deadline()));

        std::future::poll_fn(|cx| {
            let _ = Pin::new(&mut pending).poll(cx);
            Poll::Ready(())
        })
        .await;
        after_clone.set(pending.deadline());

        pending.await;
    });

    let expected = clock.now() + Duration::from_millis(5);
    scheduler.drain_ready();

    assert_eq!(before.get(), Some(None), "No deadline before the first poll");
    assert_eq!(after.get(), Some(expected));
    assert_eq!(scheduler.wait_len(), 1);

    clock.advance(Duration::from_millis(5));
    scheduler.sweep_wait();
    scheduler.drain_ready();
    assert_eq!(scheduler.live_len(), 0);
}

#[test]
fn test_huge_delay_is_clamped_not_faulted() {
    let clock = ManualClock::new();
    let mut scheduler = manual_scheduler(&clock);

    scheduler.submit(async {
        timeout(Duration::MAX).await;
    });

    scheduler.drain_ready();
    assert_eq!(scheduler.wait_len(), 1, "Overflowing delay still suspends");
    assert_eq!(scheduler.live_len(), 1, "Continuation was not faulted");

    clock.advance(Duration::from_secs(86_400 * 365));
    scheduler.sweep_wait();
    assert_eq!(scheduler.ready_len(), 0);
    assert_eq!(scheduler.wait_len(), 1);
}
