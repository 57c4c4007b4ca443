use evthread::{Clock, ManualClock, SystemClock};
use std::panic::{self, AssertUnwindSafe};

#[test]
fn test_manual_clock_moves_forward() {
    let clock = ManualClock::new(1000);

    clock.set_ticks(10);
    clock.advance_ticks(5);
    clock.advance_ms(3);

    assert_eq!(clock.now_ticks(), 18);
    assert_eq!(clock.uptime_ms(), 18);
}

#[test]
fn test_manual_clock_rejects_going_backwards_without_moving() {
    let clock = ManualClock::new(1000);
    clock.set_ticks(10);

    let result = panic::catch_unwind(AssertUnwindSafe(|| clock.set_ticks(5)));

    assert!(result.is_err());
    assert_eq!(clock.now_ticks(), 10);
}

#[test]
fn test_conversions_round_in_the_safe_direction() {
    let clock = ManualClock::new(300);

    assert_eq!(clock.ms_to_ticks_ceil(5), 2);
    assert_eq!(clock.ticks_to_us_ceil(1), 3_334);
    assert_eq!(clock.ticks_to_us_ceil(-4), 0);
    assert_eq!(clock.us_to_ticks_ceil(3_334), 2);
    assert_eq!(clock.us_to_ticks_ceil(3_333), 1);
    assert_eq!(clock.ticks_to_ms_floor(299), 996);
}

#[test]
fn test_system_clocks_share_an_origin() {
    let coarse = SystemClock::with_resolution(1000);
    let fine = SystemClock::new();

    let before = coarse.now_ticks();
    let fine_ms = fine.ticks_to_ms_floor(fine.now_ticks());
    let after = coarse.now_ticks();

    assert!(before as u64 <= fine_ms);
    assert!(fine_ms <= after as u64);
}
