use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use grinder_hardware::{InputReplay, ReplayEvent, ReplayKind};
use grinder_traits::{DigitalInput, TestClock, TouchPanel, TouchSample};
use rstest::rstest;

fn ev(at_ms: u64, kind: ReplayKind) -> ReplayEvent {
    ReplayEvent { at_ms, kind }
}

fn script() -> Vec<ReplayEvent> {
    vec![
        ev(100, ReplayKind::Touch { x: 10, y: 20, pressure: 40_000 }),
        ev(150, ReplayKind::Release),
        ev(200, ReplayKind::ButtonDown),
        ev(260, ReplayKind::ButtonUp),
    ]
}

#[rstest]
#[case(0, None, false)]
#[case(100, Some(TouchSample::new(10, 20, 40_000)), false)]
#[case(149, Some(TouchSample::new(10, 20, 40_000)), false)]
#[case(150, None, false)]
#[case(230, None, true)]
#[case(400, None, false)]
fn state_at_offset(
    #[case] at_ms: u64,
    #[case] touch: Option<TouchSample>,
    #[case] button: bool,
) {
    let clock = TestClock::new();
    let (mut t, mut b) = InputReplay::new(script(), Arc::new(clock.clone())).split();
    clock.advance(Duration::from_millis(at_ms));
    assert_eq!(t.sample().unwrap(), touch);
    assert_eq!(b.is_high().unwrap(), button);
}

#[test]
fn shutdown_is_raised_after_grace() {
    let clock = TestClock::new();
    let flag = Arc::new(AtomicBool::new(false));
    let (mut t, _b) = InputReplay::new(script(), Arc::new(clock.clone()))
        .shutdown_after(Duration::from_millis(100), flag.clone())
        .split();

    clock.advance(Duration::from_millis(300));
    t.sample().unwrap();
    assert!(!flag.load(Ordering::Relaxed));

    clock.advance(Duration::from_millis(60));
    t.sample().unwrap();
    assert!(flag.load(Ordering::Relaxed));
}

#[test]
fn unordered_events_are_sorted() {
    let clock = TestClock::new();
    let events = vec![
        ev(50, ReplayKind::ButtonUp),
        ev(10, ReplayKind::ButtonDown),
    ];
    let (_t, mut b) = InputReplay::new(events, Arc::new(clock.clone())).split();
    clock.advance(Duration::from_millis(20));
    assert!(b.is_high().unwrap());
    clock.advance(Duration::from_millis(40));
    assert!(!b.is_high().unwrap());
}
