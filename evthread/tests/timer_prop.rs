use evthread::{ManualClock, ONE_SHOT, Timer, TimerManager};
use proptest::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Fires due timers the way the event loop does before it blocks.
fn drain(manager: &TimerManager) {
    while let Some(next) = manager.next_expiring() {
        if !next.is_expired() {
            break;
        }

        next.timer.update_after_expiry();
        next.timer.fire();
    }
}

#[derive(Debug, Clone)]
struct Arming {
    delay_ms: i64,
    period_ms: i64,
}

fn arming() -> impl Strategy<Value = Option<Arming>> {
    prop::option::of((0i64..500, prop_oneof![Just(ONE_SHOT), 1i64..500]).prop_map(
        |(delay_ms, period_ms)| Arming {
            delay_ms,
            period_ms,
        },
    ))
}

proptest! {
    #[test]
    fn next_expiring_is_earliest_armed_in_registration_order(
        armings in prop::collection::vec(arming(), 1..8),
        elapsed_ms in 0u64..1_000,
    ) {
        let clock = Arc::new(ManualClock::new(1_000));
        let mut manager = TimerManager::new(8, clock.clone());

        let timers: Vec<Timer> = armings
            .iter()
            .enumerate()
            .map(|(i, _)| Timer::new(format!("t{i}"), || {}))
            .collect();

        for (timer, arming) in timers.iter().zip(&armings) {
            manager.register(timer);
            if let Some(arming) = arming {
                timer.start_with_delay(arming.delay_ms, arming.period_ms);
            }
        }

        clock.advance_ms(elapsed_ms);

        let expected = armings
            .iter()
            .enumerate()
            .filter_map(|(i, a)| a.as_ref().map(|a| (a.delay_ms, i)))
            .min();

        match (manager.next_expiring(), expected) {
            (None, None) => {}
            (Some(next), Some((delay_ms, index))) => {
                prop_assert_eq!(next.timer.name(), format!("t{index}"));

                let remaining_ms = (delay_ms as u64).saturating_sub(elapsed_ms);
                prop_assert_eq!(next.wait_us, remaining_ms * 1_000);
            }
            (got, want) => prop_assert!(false, "got {:?}, want {:?}", got, want),
        }
    }

    #[test]
    fn periodic_timer_catches_up_without_skipping(
        delay_ms in 0i64..200,
        period_ms in 1i64..100,
        elapsed_ms in 0u64..2_000,
    ) {
        let clock = Arc::new(ManualClock::new(1_000));
        let mut manager = TimerManager::new(1, clock.clone());

        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        let timer = Timer::new("periodic", move || {
            c.fetch_add(1, Ordering::SeqCst);
        });

        manager.register(&timer);
        timer.start_with_delay(delay_ms, period_ms);

        clock.advance_ms(elapsed_ms);
        drain(&manager);

        let elapsed = elapsed_ms as i64;
        let expected = if elapsed >= delay_ms {
            ((elapsed - delay_ms) / period_ms + 1) as usize
        } else {
            0
        };

        prop_assert_eq!(count.load(Ordering::SeqCst), expected);
        prop_assert_eq!(
            timer.next_fire_ticks(),
            Some(delay_ms + expected as i64 * period_ms)
        );
    }

    #[test]
    fn one_shot_timer_fires_at_most_once(
        delay_ms in 0i64..200,
        steps in prop::collection::vec(0u64..100, 1..10),
    ) {
        let clock = Arc::new(ManualClock::new(1_000));
        let mut manager = TimerManager::new(1, clock.clone());

        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        let timer = Timer::new("once", move || {
            c.fetch_add(1, Ordering::SeqCst);
        });

        manager.register(&timer);
        timer.start_with_delay(delay_ms, ONE_SHOT);

        let mut elapsed = 0u64;
        for step in steps {
            clock.advance_ms(step);
            elapsed += step;
            drain(&manager);

            let fired = count.load(Ordering::SeqCst);
            prop_assert!(fired <= 1);
            prop_assert_eq!(fired == 1, elapsed as i64 >= delay_ms);
            prop_assert_eq!(timer.is_running(), fired == 0);
        }
    }
}
