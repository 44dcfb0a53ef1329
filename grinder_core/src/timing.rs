//! Grind timing and the motor-enable line.
//!
//! The motor line is the one piece of shared state outside the widget tree.
//! Only [`GrindTimer`] switches it on; the screen teardown path may force it
//! off. A grind runs from `start` to `start + duration + settle`, and the
//! timer is advanced by the owning screen's poll loop.

use std::time::{Duration, Instant};

use eyre::WrapErr;
use grinder_traits::MotorEnable;

use crate::config::TimingCfg;
use crate::error::Result;
use crate::hw_error::map_hw_error;
use crate::widget::{BarId, ButtonId, ContainerId, Region, WidgetTree};

/// Owned motor-enable output plus the last level written to it.
pub struct MotorLine {
    out: Box<dyn MotorEnable>,
    on: bool,
}

impl std::fmt::Debug for MotorLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MotorLine").field("on", &self.on).finish()
    }
}

impl MotorLine {
    pub fn new(out: Box<dyn MotorEnable>) -> Self {
        Self { out, on: false }
    }

    pub fn is_on(&self) -> bool {
        self.on
    }

    fn set(&mut self, on: bool) -> Result<()> {
        self.out
            .set_enabled(on)
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
            .wrap_err(if on { "motor enable" } else { "motor disable" })?;
        self.on = on;
        Ok(())
    }

    /// Drive the line low regardless of timer state. Always writes, even
    /// when the line is believed to be off already.
    pub(crate) fn force_off(&mut self) -> Result<()> {
        self.set(false)
    }
}

/// Start/end of the grind in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingSession {
    pub start: Instant,
    pub end: Instant,
}

/// What a timer tick observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    Idle,
    Running { progress: u8 },
    /// End time passed on this tick; the motor has been switched off.
    Completed,
}

#[derive(Debug, Clone)]
pub struct GrindTimer {
    settle: Duration,
    max: Duration,
    session: Option<TimingSession>,
}

impl GrindTimer {
    pub fn new(cfg: &TimingCfg) -> Self {
        Self {
            settle: cfg.settle_delay(),
            max: cfg.max_grind(),
            session: None,
        }
    }

    pub fn is_grinding(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<TimingSession> {
        self.session
    }

    /// Energize the motor for `duration` (clamped to the configured maximum)
    /// plus the settle delay. A grind already in progress is restarted.
    pub fn grind_for(&mut self, duration: Duration, now: Instant, motor: &mut MotorLine) -> Result<()> {
        let run = duration.min(self.max);
        if run < duration {
            tracing::warn!(
                requested_ms = duration.as_millis() as u64,
                max_ms = self.max.as_millis() as u64,
                "grind clamped to maximum"
            );
        }
        let end = now + run + self.settle;
        motor.set(true)?;
        self.session = Some(TimingSession { start: now, end });
        tracing::info!(
            run_ms = run.as_millis() as u64,
            settle_ms = self.settle.as_millis() as u64,
            "grind started"
        );
        Ok(())
    }

    /// Advance the timer. Completion switches the motor off.
    pub fn tick(&mut self, now: Instant, motor: &mut MotorLine) -> Result<TimerEvent> {
        let Some(s) = self.session else {
            return Ok(TimerEvent::Idle);
        };
        if now > s.end {
            self.session = None;
            motor.set(false)?;
            tracing::info!(
                elapsed_ms = now.saturating_duration_since(s.start).as_millis() as u64,
                "grind completed"
            );
            return Ok(TimerEvent::Completed);
        }
        let progress = progress_percent(s.start, s.end, now);
        tracing::trace!(progress, "grinding");
        Ok(TimerEvent::Running { progress })
    }

    /// Stop a running grind without completing it. Returns whether a grind
    /// was actually running.
    pub fn cancel(&mut self, motor: &mut MotorLine) -> Result<bool> {
        if self.session.take().is_none() {
            return Ok(false);
        }
        motor.set(false)?;
        tracing::info!("grind cancelled");
        Ok(true)
    }
}

/// Elapsed share of `start..end` in percent, truncated and clamped to 0..=100.
pub fn progress_percent(start: Instant, end: Instant, now: Instant) -> u8 {
    let total = end.saturating_duration_since(start).as_micros();
    if total == 0 {
        return 100;
    }
    let elapsed = now.saturating_duration_since(start).as_micros();
    (elapsed.saturating_mul(100) / total).min(100) as u8
}

/// Seconds to a `Duration`; negative, NaN and infinite inputs become zero.
pub fn secs_to_duration(secs: f32) -> Duration {
    if secs.is_finite() && secs > 0.0 {
        Duration::try_from_secs_f32(secs).unwrap_or(Duration::ZERO)
    } else {
        Duration::ZERO
    }
}

/// Timer plus its on-screen controls: a Cancel button and a progress bar,
/// both visible only while grinding.
#[derive(Debug, Clone)]
pub struct ProgressPanel {
    timer: GrindTimer,
    cancel: ButtonId,
    bar: BarId,
}

impl ProgressPanel {
    pub const CANCEL_REGION: Region = Region::new(120, 160, 80, 40);
    pub const BAR_REGION: Region = Region::new(10, 210, 300, 30);

    pub fn attach<A: Copy>(
        tree: &mut WidgetTree<A>,
        container: ContainerId,
        cancel_action: A,
        cfg: &TimingCfg,
    ) -> Self {
        let cancel = tree.add_button(container, Self::CANCEL_REGION, "Cancel", cancel_action);
        let bar = tree.add_bar(container, Self::BAR_REGION);
        Self {
            timer: GrindTimer::new(cfg),
            cancel,
            bar,
        }
    }

    pub fn is_grinding(&self) -> bool {
        self.timer.is_grinding()
    }

    pub fn cancel_button(&self) -> ButtonId {
        self.cancel
    }

    /// Start a grind of `secs` seconds. A zero (or clamped-to-zero) duration
    /// starts nothing and returns `false`; the motor stays off.
    pub fn start<A: Copy>(
        &mut self,
        tree: &mut WidgetTree<A>,
        secs: f32,
        now: Instant,
        motor: &mut MotorLine,
    ) -> Result<bool> {
        let duration = secs_to_duration(secs);
        if duration.is_zero() {
            tracing::info!(secs, "grind skipped: zero duration");
            return Ok(false);
        }
        self.timer.grind_for(duration, now, motor)?;
        tree.show(self.cancel);
        tree.set_bar(self.bar, 0);
        tree.set_bar_visible(self.bar, true);
        Ok(true)
    }

    pub fn tick<A: Copy>(
        &mut self,
        tree: &mut WidgetTree<A>,
        now: Instant,
        motor: &mut MotorLine,
    ) -> Result<TimerEvent> {
        let ev = self.timer.tick(now, motor);
        match ev {
            Ok(TimerEvent::Running { progress }) => tree.set_bar(self.bar, progress),
            Ok(TimerEvent::Completed) | Err(_) => self.hide_controls(tree),
            Ok(TimerEvent::Idle) => {}
        }
        ev
    }

    pub fn cancel<A: Copy>(&mut self, tree: &mut WidgetTree<A>, motor: &mut MotorLine) -> Result<bool> {
        self.hide_controls(tree);
        self.timer.cancel(motor)
    }

    fn hide_controls<A: Copy>(&self, tree: &mut WidgetTree<A>) {
        tree.hide(self.cancel);
        tree.set_bar_visible(self.bar, false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grinder_traits::BoxError;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Spy(Arc<Mutex<Vec<bool>>>);

    impl MotorEnable for Spy {
        fn set_enabled(&mut self, on: bool) -> std::result::Result<(), BoxError> {
            self.0.lock().unwrap().push(on);
            Ok(())
        }
    }

    fn cfg() -> TimingCfg {
        TimingCfg {
            settle_delay_ms: 400,
            max_grind_ms: 60_000,
        }
    }

    #[test]
    fn progress_truncates_and_clamps() {
        let t0 = Instant::now();
        let end = t0 + Duration::from_millis(1000);
        assert_eq!(progress_percent(t0, end, t0), 0);
        assert_eq!(progress_percent(t0, end, t0 + Duration::from_millis(999)), 99);
        assert_eq!(progress_percent(t0, end, end + Duration::from_secs(5)), 100);
    }

    #[test]
    fn negative_and_nan_seconds_are_zero() {
        assert_eq!(secs_to_duration(-3.0), Duration::ZERO);
        assert_eq!(secs_to_duration(f32::NAN), Duration::ZERO);
        assert_eq!(secs_to_duration(1.5), Duration::from_millis(1500));
    }

    #[test]
    fn completion_is_strictly_after_end() {
        let spy = Spy::default();
        let mut motor = MotorLine::new(Box::new(spy.clone()));
        let mut timer = GrindTimer::new(&cfg());
        let t0 = Instant::now();
        timer.grind_for(Duration::from_secs(5), t0, &mut motor).unwrap();
        assert!(motor.is_on());

        let end = t0 + Duration::from_millis(5400);
        assert!(matches!(timer.tick(end, &mut motor).unwrap(), TimerEvent::Running { .. }));
        assert_eq!(
            timer.tick(end + Duration::from_millis(1), &mut motor).unwrap(),
            TimerEvent::Completed
        );
        assert!(!motor.is_on());
        assert_eq!(*spy.0.lock().unwrap(), vec![true, false]);
    }

    #[test]
    fn overlong_requests_are_capped() {
        let mut motor = MotorLine::new(Box::new(Spy::default()));
        let mut timer = GrindTimer::new(&TimingCfg {
            settle_delay_ms: 1,
            max_grind_ms: 1000,
        });
        let t0 = Instant::now();
        timer.grind_for(Duration::from_secs(3600), t0, &mut motor).unwrap();
        let s = timer.session().unwrap();
        assert_eq!(s.end - s.start, Duration::from_millis(1001));
    }

    #[test]
    fn cancel_when_idle_is_a_no_op() {
        let spy = Spy::default();
        let mut motor = MotorLine::new(Box::new(spy.clone()));
        let mut timer = GrindTimer::new(&cfg());
        assert!(!timer.cancel(&mut motor).unwrap());
        assert!(spy.0.lock().unwrap().is_empty());
    }

    #[test]
    fn panel_zero_duration_never_energizes() {
        let spy = Spy::default();
        let mut motor = MotorLine::new(Box::new(spy.clone()));
        let mut tree: WidgetTree<u8> = WidgetTree::new();
        let root = tree.root();
        let mut panel = ProgressPanel::attach(&mut tree, root, 9, &cfg());
        assert!(!panel.start(&mut tree, -2.0, Instant::now(), &mut motor).unwrap());
        assert!(!tree.is_enabled(panel.cancel_button()));
        assert!(spy.0.lock().unwrap().is_empty());
    }
}
