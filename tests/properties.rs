use cosched::clock::{Clock, ManualClock};
use cosched::{Builder, timeout_ms};
use proptest::prelude::*;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

const SWEEP_PAUSE: Duration = Duration::from_millis(1);
const IDLE_PAUSE: Duration = Duration::from_millis(1);

proptest! {
    #[test]
    fn sweep_splits_at_sampled_now(
        delays in prop::collection::vec(0u64..50, 1..40),
        advance in 0u64..60,
    ) {
        let clock = ManualClock::new();
        let mut scheduler = Builder::new()
            .clock(clock.clone())
            .sweep_pause(Duration::ZERO)
            .build();

        for &delay in &delays {
            scheduler.submit(async move {
                timeout_ms(delay).await;
            });
        }

        scheduler.drain_ready();
        prop_assert_eq!(scheduler.wait_len(), delays.len());

        clock.advance(Duration::from_millis(advance));
        scheduler.sweep_wait();

        let due = delays.iter().filter(|&&d| d <= advance).count();
        prop_assert_eq!(scheduler.ready_len(), due);
        prop_assert_eq!(scheduler.wait_len(), delays.len() - due);
    }

    #[test]
    fn every_deadline_elapses_before_idle(
        plans in prop::collection::vec(prop::collection::vec(0u64..20, 0..5), 0..20),
    ) {
        let clock = ManualClock::new();
        let mut scheduler = Builder::new()
            .clock(clock.clone())
            .sweep_pause(SWEEP_PAUSE)
            .idle_pause(IDLE_PAUSE)
            .build();
        let lateness = Rc::new(RefCell::new(Vec::new()));
        let finished = Rc::new(RefCell::new(0usize));

        for plan in plans.clone() {
            let clock = clock.clone();
            let lateness = lateness.clone();
            let finished = finished.clone();

            scheduler.submit(async move {
                for delay_ms in plan {
                    let suspended = clock.now();
                    timeout_ms(delay_ms).await;
                    let waited = clock.now() - suspended;
                    lateness
                        .borrow_mut()
                        .push(waited.checked_sub(Duration::from_millis(delay_ms)));
                }
                *finished.borrow_mut() += 1;
            });
        }

        let report = scheduler.run_until_idle();

        prop_assert_eq!(*finished.borrow(), plans.len());
        prop_assert_eq!(report.completed as usize, plans.len());
        prop_assert!(scheduler.is_idle());

        let longest: u64 = plans.iter().map(|p| p.iter().sum::<u64>()).max().unwrap_or(0);
        prop_assert!(clock.elapsed() >= Duration::from_millis(longest));

        let timeouts: usize = plans.iter().map(Vec::len).sum();
        prop_assert_eq!(lateness.borrow().len(), timeouts);
        for late in lateness.borrow().iter() {
            let late = late.expect("resumed before its deadline");
            prop_assert!(late <= SWEEP_PAUSE * 2 + IDLE_PAUSE, "resumed {:?} late", late);
        }
    }
}
