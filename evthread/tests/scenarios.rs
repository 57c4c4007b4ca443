//! End-to-end timing scenarios against the system clock.
//!
//! Checks are made half a period away from every expected expiry, so
//! scheduling jitter well below 500 ms does not affect the outcome.

use evthread::clock::sleep_until_ms;
use evthread::{EventLoop, LoopState, Mutex, Timer, WAIT_FOREVER};
use std::sync::Arc;

enum Event {
    Flash { rate_ms: i64 },
    Exit,
}

fn counter() -> Arc<Mutex<u32>> {
    Arc::new(Mutex::new("counter", 0))
}

fn read(counter: &Mutex<u32>) -> u32 {
    *counter.lock(WAIT_FOREVER).unwrap()
}

fn counting_timer(name: &str, counter: &Arc<Mutex<u32>>) -> Timer {
    let counter = counter.clone();
    Timer::new(name, move || {
        *counter.lock(WAIT_FOREVER).unwrap() += 1;
    })
}

fn exit_handler(event_loop: &mut EventLoop<Event>) {
    let handle = event_loop.handle();
    event_loop.on_external_event(move |event| {
        if let Event::Exit = event {
            handle.exit_event_loop();
        }
    });
}

fn shut_down(event_loop: EventLoop<Event>) {
    event_loop.send_event(Event::Exit).unwrap();
    drop(event_loop);
}

#[test]
fn test_single_periodic_timer() {
    let mut event_loop = EventLoop::<Event>::builder("single").build();
    exit_handler(&mut event_loop);

    let count = counter();
    let timer = counting_timer("second", &count);
    event_loop.timer_manager().register(&timer);

    let clock = event_loop.clock().clone();
    let t0 = clock.uptime_ms();

    timer.start_with_delay(1000, 1000);
    event_loop.start().unwrap();

    assert_eq!(read(&count), 0);

    sleep_until_ms(clock.as_ref(), t0 + 1_500);
    assert_eq!(read(&count), 1);

    sleep_until_ms(clock.as_ref(), t0 + 10_500);
    assert_eq!(read(&count), 10);

    shut_down(event_loop);
}

#[test]
fn test_three_periodic_timers() {
    let mut event_loop = EventLoop::<Event>::builder("three").build();
    exit_handler(&mut event_loop);

    let counts = [counter(), counter(), counter()];
    let timers: Vec<Timer> = counts
        .iter()
        .enumerate()
        .map(|(i, count)| counting_timer(&format!("every {}s", i + 1), count))
        .collect();

    for timer in &timers {
        event_loop.timer_manager().register(timer);
    }

    let clock = event_loop.clock().clone();
    let t0 = clock.uptime_ms();

    for (i, timer) in timers.iter().enumerate() {
        let period = 1000 * (i as i64 + 1);
        timer.start_with_delay(period, period);
    }
    event_loop.start().unwrap();

    let snapshot = || counts.iter().map(|c| read(c)).collect::<Vec<_>>();

    sleep_until_ms(clock.as_ref(), t0 + 1_500);
    assert_eq!(snapshot(), [1, 0, 0]);

    sleep_until_ms(clock.as_ref(), t0 + 2_500);
    assert_eq!(snapshot(), [2, 1, 0]);

    sleep_until_ms(clock.as_ref(), t0 + 3_500);
    assert_eq!(snapshot(), [3, 1, 1]);

    sleep_until_ms(clock.as_ref(), t0 + 10_500);
    assert_eq!(snapshot(), [10, 5, 3]);

    shut_down(event_loop);
}

#[test]
fn test_external_event_arms_timer() {
    let mut event_loop = EventLoop::<Event>::builder("led").build();

    let led = Arc::new(Mutex::new("led", false));

    let toggle = led.clone();
    let blink = Timer::new("blink", move || {
        let mut on = toggle.lock(WAIT_FOREVER).unwrap();
        *on = !*on;
    });
    event_loop.timer_manager().register(&blink);

    let handle = event_loop.handle();
    let set = led.clone();
    event_loop.on_external_event(move |event| match event {
        Event::Flash { rate_ms } => {
            blink.start(rate_ms);
            *set.lock(WAIT_FOREVER).unwrap() = true;
        }
        Event::Exit => handle.exit_event_loop(),
    });

    let clock = event_loop.clock().clone();
    event_loop.start().unwrap();

    let t0 = clock.uptime_ms();
    event_loop.send_event(Event::Flash { rate_ms: 1000 }).unwrap();

    let is_on = || *led.lock(WAIT_FOREVER).unwrap();

    sleep_until_ms(clock.as_ref(), t0 + 500);
    assert!(is_on());

    sleep_until_ms(clock.as_ref(), t0 + 1_500);
    assert!(!is_on());

    sleep_until_ms(clock.as_ref(), t0 + 2_500);
    assert!(is_on());

    let handle = event_loop.handle();
    shut_down(event_loop);
    assert_eq!(handle.state(), LoopState::Terminated);
}
