mod common;

use std::time::Duration;

use common::Rig;
use grinder_core::mocks::{MemoryRateStore, ScriptedInput, ScriptedTouch};
use grinder_core::{
    CalibrationCfg, GrindPlan, GrindScreen, MainScreen, ProfileCfg, Screen, Splash,
    StorageError, TimingCfg, run_appliance,
};

fn on_off(writes: &[(Duration, bool)]) -> (Duration, Duration) {
    let on = writes.iter().find(|(_, l)| *l).map(|(t, _)| *t).unwrap();
    let off = writes.iter().find(|(t, l)| !*l && *t >= on).map(|(t, _)| *t).unwrap();
    (on, off)
}

#[test]
fn grind_window_is_duration_plus_settle() {
    let rig = Rig::new(MemoryRateStore::with_text("1.000000\n"));
    let mut p = rig.platform(ScriptedTouch::default().idle(5000));
    let mut grind = GrindScreen::new(&TimingCfg::default());

    let plan = grind.grind_grams(5.0, &mut p).unwrap();
    assert!(matches!(plan, GrindPlan::Started { duration_s, .. } if (duration_s - 5.0).abs() < 1e-6));
    p.show(&mut grind).unwrap();

    assert!(grind.completed());
    let (on, off) = on_off(&rig.motor.writes());
    assert_eq!(on, Duration::ZERO);
    let window = off - on;
    assert!(window >= Duration::from_millis(5400), "{window:?}");
    assert!(window <= Duration::from_millis(5405), "{window:?}");
}

#[test]
fn cancel_stops_immediately_without_completing() {
    let rig = Rig::new(MemoryRateStore::with_text("1.000000\n"));
    // Cancel sits at (120,160) 80x40.
    let touch = ScriptedTouch::default().idle(100).press(160, 180, 40_000, 3, 10);
    let mut p = rig.platform(touch);
    let mut grind = GrindScreen::new(&TimingCfg::default());

    grind.grind_grams(5.0, &mut p).unwrap();
    p.show(&mut grind).unwrap();

    assert!(!grind.completed());
    let writes = rig.motor.writes();
    assert_eq!(writes[0], (Duration::ZERO, true));
    assert_eq!(writes[1], (Duration::from_millis(500), false));
    assert!(writes.iter().skip(1).all(|(_, on)| !on));
}

#[test]
fn missing_rate_is_surfaced_and_never_grinds() {
    let rig = Rig::new(MemoryRateStore::new());
    // OK button sits at (120,100) 80x40.
    let touch = ScriptedTouch::default().idle(3).press(160, 120, 40_000, 1, 5);
    let mut p = rig.platform(touch);
    let mut grind = GrindScreen::new(&TimingCfg::default());

    let plan = grind.grind_grams(9.0, &mut p).unwrap();
    assert_eq!(plan, GrindPlan::RateUnavailable(StorageError::Missing));
    assert!(
        grind
            .tree()
            .visible_texts()
            .iter()
            .any(|t| t.starts_with("No calibrated rate"))
    );

    p.show(&mut grind).unwrap();
    assert_eq!(grind.last_error(), Some(&StorageError::Missing));
    assert!(rig.motor.levels().iter().all(|on| !on));
    // Dismissed by the OK press, not by the end of the script.
    assert!(!rig.shutdown.load(std::sync::atomic::Ordering::Relaxed));
}

#[test]
fn corrupt_rate_is_reported_as_corrupt() {
    let rig = Rig::new(MemoryRateStore::with_text("-3\n"));
    let mut p = rig.platform(ScriptedTouch::default());
    let mut grind = GrindScreen::new(&TimingCfg::default());
    let plan = grind.grind_grams(9.0, &mut p).unwrap();
    assert!(matches!(plan, GrindPlan::RateUnavailable(StorageError::Corrupt(_))));
    assert!(rig.motor.writes().is_empty());
}

#[test]
fn zero_grams_grinds_nothing() {
    let rig = Rig::new(MemoryRateStore::with_text("0.5\n"));
    let mut p = rig.platform(ScriptedTouch::default());
    let mut grind = GrindScreen::new(&TimingCfg::default());
    assert_eq!(grind.grind_grams(0.0, &mut p).unwrap(), GrindPlan::Nothing);
    assert!(rig.motor.writes().is_empty());
}

#[test]
fn hardware_button_grinds_the_selected_profile() {
    let rig = Rig::new(MemoryRateStore::with_text("0.500000\n"));
    // Seed low, low on the first tick, then pressed and held.
    let button = ScriptedInput::new([false, false, true]);
    let mut p = rig.platform_with_button(ScriptedTouch::default().idle(3000), button);
    let mut main = MainScreen::new(
        &ProfileCfg::default(),
        &CalibrationCfg::default(),
        &TimingCfg::default(),
    );
    let splash = Splash::new();

    run_appliance(&mut main, &splash, &mut p).unwrap();

    assert!(main.grind_screen().completed());
    let (on, off) = on_off(&rig.motor.writes());
    // Double (19 g) at 0.5 s/g plus 400 ms settle.
    let window = off - on;
    assert!(window >= Duration::from_millis(9900), "{window:?}");
    assert!(window <= Duration::from_millis(9905), "{window:?}");
    // A held button does not start a second grind after returning.
    assert_eq!(rig.motor.levels().iter().filter(|on| **on).count(), 1);
    assert_eq!(rig.display.current(), Some(splash.tree().view_id()));
}

#[test]
fn touching_grind_uses_the_newly_selected_profile() {
    let rig = Rig::new(MemoryRateStore::with_text("1.000000\n"));
    // Select "Single" (profile at (0,10), select region (10,0) 140x100),
    // bump it once with "+", then press Grind at (170,190) 140x40.
    let touch = ScriptedTouch::default()
        .press(50, 50, 40_000, 1, 1)
        .press(130, 140, 40_000, 1, 1)
        .press(240, 210, 40_000, 1, 2500);
    let mut p = rig.platform(touch);
    let mut main = MainScreen::new(
        &ProfileCfg::default(),
        &CalibrationCfg::default(),
        &TimingCfg::default(),
    );

    p.show(&mut main).unwrap();

    assert_eq!(main.profiles().selected(), Some(0));
    assert_eq!(main.profiles().selected_amount(), Some(10));
    let (on, off) = on_off(&rig.motor.writes());
    let window = off - on;
    assert!(window >= Duration::from_millis(10_400), "{window:?}");
    assert!(window <= Duration::from_millis(10_405), "{window:?}");
}

#[test]
fn press_that_opens_grind_does_not_also_cancel_it() {
    let rig = Rig::new(MemoryRateStore::with_text("1.000000\n"));
    // (180,195) is inside Grind (170,190) 140x40 on the main screen and
    // inside Cancel (120,160) 80x40 on the grind screen. Held for 20 ticks.
    let touch = ScriptedTouch::default().press(180, 195, 40_000, 20, 4000);
    let mut p = rig.platform(touch);
    let mut main = MainScreen::new(
        &ProfileCfg::default(),
        &CalibrationCfg::default(),
        &TimingCfg::default(),
    );
    let splash = Splash::new();

    run_appliance(&mut main, &splash, &mut p).unwrap();

    assert!(main.grind_screen().completed());
    assert_eq!(rig.motor.levels().iter().filter(|on| **on).count(), 1);
    let (on, off) = on_off(&rig.motor.writes());
    // Double (19 g) at 1 s/g plus 400 ms settle.
    let window = off - on;
    assert!(window >= Duration::from_millis(19_400), "{window:?}");
    assert!(window <= Duration::from_millis(19_405), "{window:?}");
}
