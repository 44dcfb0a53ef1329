mod common;

use std::sync::Arc;

use common::Rig;
use grinder_core::mocks::{MemoryRateStore, RecordingDisplay, ScriptedInput, ScriptedTouch, SpyMotor};
use grinder_core::{
    GrindScreen, GrinderError, Platform, Point, Region, Result, Screen, TimingCfg, WidgetTree,
};
use grinder_traits::{TestClock, ViewId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Act {
    Touch,
}

struct TestScreen {
    tree: WidgetTree<Act>,
    limit: u32,
    tick: u32,
    touched: Vec<u32>,
    hardware: Vec<u32>,
    child: Option<Box<TestScreen>>,
    nest_on_enter: bool,
}

impl TestScreen {
    fn new(limit: u32) -> Self {
        let mut tree = WidgetTree::new();
        let b = tree.add_button(tree.root(), Region::new(0, 0, 100, 100), "test", Act::Touch);
        tree.show(b);
        Self {
            tree,
            limit,
            tick: 0,
            touched: Vec::new(),
            hardware: Vec::new(),
            child: None,
            nest_on_enter: false,
        }
    }

    fn with_child(mut self, child: TestScreen) -> Self {
        self.child = Some(Box::new(child));
        self
    }
}

impl Screen for TestScreen {
    type Action = Act;

    fn name(&self) -> &'static str {
        "test"
    }

    fn tree(&self) -> &WidgetTree<Act> {
        &self.tree
    }

    fn on_enter(&mut self, p: &mut Platform) -> Result<()> {
        if self.nest_on_enter
            && let Some(child) = self.child.as_deref_mut()
        {
            p.show(child)?;
        }
        Ok(())
    }

    fn keep_polling(&mut self, _p: &mut Platform) -> Result<bool> {
        let go = self.tick < self.limit;
        self.tick += 1;
        Ok(go)
    }

    fn on_action(&mut self, _action: Act, p: &mut Platform) -> Result<()> {
        self.touched.push(self.tick);
        if let Some(child) = self.child.as_deref_mut() {
            p.show(child)?;
        }
        Ok(())
    }

    fn on_hardware_button(&mut self, _p: &mut Platform) -> Result<()> {
        self.hardware.push(self.tick);
        Ok(())
    }
}

fn platform(touch: ScriptedTouch, button: ScriptedInput, display: RecordingDisplay) -> Platform {
    Platform::builder()
        .with_touch(touch)
        .with_button(button)
        .with_motor(SpyMotor::new())
        .with_display(display)
        .with_store(MemoryRateStore::new())
        .with_clock(Arc::new(TestClock::new()))
        .try_build()
        .unwrap()
}

#[test]
fn show_restores_the_previous_view() {
    let display = RecordingDisplay::new();
    let mut p = platform(ScriptedTouch::default(), ScriptedInput::default(), display.clone());
    p.mount(Some(ViewId(500)));

    let mut screen = TestScreen::new(3);
    p.show(&mut screen).unwrap();

    assert_eq!(display.current(), Some(ViewId(500)));
    assert_eq!(
        display.history(),
        vec![Some(ViewId(500)), Some(screen.tree().view_id()), Some(ViewId(500))]
    );
}

#[test]
fn nested_screen_returns_to_its_parent() {
    let display = RecordingDisplay::new();
    let touch = ScriptedTouch::default().press(10, 10, 40_000, 2, 0);
    let mut p = platform(touch, ScriptedInput::default(), display.clone());

    let mut outer = TestScreen::new(5).with_child(TestScreen::new(2));
    p.show(&mut outer).unwrap();

    let outer_view = outer.tree().view_id();
    let inner_view = outer.child.as_ref().unwrap().tree().view_id();
    assert_eq!(
        display.history(),
        vec![Some(outer_view), Some(inner_view), Some(outer_view), None]
    );
    assert_eq!(outer.touched, vec![1]);
    // The press that opened the inner screen was still down on its first tick.
    assert!(outer.child.as_ref().unwrap().touched.is_empty());
    assert_eq!(display.current(), None);
}

#[test]
fn third_screen_is_refused_and_everything_unwinds() {
    let display = RecordingDisplay::new();
    let touch = ScriptedTouch::default().press(10, 10, 40_000, 1, 0);
    let motor = SpyMotor::new();
    let mut p = Platform::builder()
        .with_touch(touch)
        .with_button(ScriptedInput::default())
        .with_motor(motor.clone())
        .with_display(display.clone())
        .with_store(MemoryRateStore::new())
        .with_clock(Arc::new(TestClock::new()))
        .try_build()
        .unwrap();
    p.mount(Some(ViewId(77)));

    let mut mid = TestScreen::new(5).with_child(TestScreen::new(5));
    mid.nest_on_enter = true;
    let mut outer = TestScreen::new(5).with_child(mid);

    let err = p.show(&mut outer).unwrap_err();
    assert_eq!(
        err.downcast_ref::<GrinderError>(),
        Some(&GrinderError::ScreenStackFull)
    );
    assert_eq!(display.current(), Some(ViewId(77)));
    // The refused push, then each of the two shown screens, forced the
    // motor off.
    assert_eq!(motor.writes(), vec![false, false, false]);
}

#[test]
fn touch_and_button_can_both_fire_in_one_tick() {
    let touch = ScriptedTouch::default().press(50, 50, 40_000, 1, 3);
    // Seed read at mount, then one read per iteration.
    let button = ScriptedInput::new([false, true, true, false]);
    let mut p = platform(touch, button, RecordingDisplay::new());

    let mut screen = TestScreen::new(4);
    p.show(&mut screen).unwrap();
    assert_eq!(screen.touched, vec![1]);
    assert_eq!(screen.hardware, vec![1]);
}

#[test]
fn button_held_at_mount_is_not_an_edge() {
    let button = ScriptedInput::new([true, true, true, false, true]);
    let mut p = platform(ScriptedTouch::default(), button, RecordingDisplay::new());

    let mut screen = TestScreen::new(5);
    p.show(&mut screen).unwrap();
    assert_eq!(screen.hardware, vec![4]);
}

#[test]
fn shutdown_mid_grind_leaves_the_motor_off() {
    let rig = Rig::new(MemoryRateStore::with_text("1.000000\n"));
    let mut p = rig.platform(ScriptedTouch::default().idle(20));
    let mut grind = GrindScreen::new(&TimingCfg::default());

    grind.grind_grams(5.0, &mut p).unwrap();
    p.show(&mut grind).unwrap();

    assert!(!grind.completed());
    assert!(!p.motor_on());
    assert_eq!(rig.motor.levels().first(), Some(&true));
    assert_eq!(rig.motor.levels().last(), Some(&false));
    assert_eq!(rig.display.current(), None);
    // About 20 poll intervals passed, far short of the 5.4 s grind.
    assert!(rig.clock.elapsed().as_millis() < 200);
}

/// Shows `inner` on entry, or starts a grind and shows the grind screen when
/// there is no inner screen.
struct GrindLauncher {
    tree: WidgetTree<Act>,
    inner: Option<Box<GrindLauncher>>,
    grind: GrindScreen,
    motor_after_refusal: Option<bool>,
}

impl GrindLauncher {
    fn new(inner: Option<GrindLauncher>) -> Self {
        Self {
            tree: WidgetTree::new(),
            inner: inner.map(Box::new),
            grind: GrindScreen::new(&TimingCfg::default()),
            motor_after_refusal: None,
        }
    }
}

impl Screen for GrindLauncher {
    type Action = Act;

    fn name(&self) -> &'static str {
        "launcher"
    }

    fn tree(&self) -> &WidgetTree<Act> {
        &self.tree
    }

    fn on_enter(&mut self, p: &mut Platform) -> Result<()> {
        if let Some(inner) = self.inner.as_deref_mut() {
            return p.show(inner);
        }
        self.grind.grind_grams(5.0, p)?;
        let res = p.show(&mut self.grind);
        self.motor_after_refusal = Some(p.motor_on());
        res
    }

    fn keep_polling(&mut self, _p: &mut Platform) -> Result<bool> {
        Ok(false)
    }

    fn on_action(&mut self, _action: Act, _p: &mut Platform) -> Result<()> {
        Ok(())
    }
}

#[test]
fn refused_grind_screen_leaves_the_motor_off() {
    let rig = Rig::new(MemoryRateStore::with_text("1.000000\n"));
    let mut p = rig.platform(ScriptedTouch::default().idle(5));
    let mut outer = GrindLauncher::new(Some(GrindLauncher::new(None)));

    let err = p.show(&mut outer).unwrap_err();

    assert_eq!(
        err.downcast_ref::<GrinderError>(),
        Some(&GrinderError::ScreenStackFull)
    );
    let inner = outer.inner.as_ref().unwrap();
    assert_eq!(inner.motor_after_refusal, Some(false));
    assert_eq!(rig.motor.levels().first(), Some(&true));
    assert!(!p.motor_on());
}

#[test]
fn regions_are_hit_in_local_frame() {
    let screen = TestScreen::new(0);
    let hit = screen.tree().dispatch(screen.tree().root(), Point::new(100, 100));
    assert_eq!(hit, vec![Act::Touch]);
}
