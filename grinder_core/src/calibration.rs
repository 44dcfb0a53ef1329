//! Two-stage rate calibration.
//!
//! Stage `Measure` runs a fixed reference grind. When it completes, the user
//! weighs the result and enters it in tenths of a gram. Stage `TopUp` derives
//! the rate (`reference / measured`), persists it, then grinds the remainder
//! up to the target weight. Only natural completion advances a stage; a
//! cancelled grind leaves the stage where it was. A rate that cannot be
//! saved is shown with an OK button; the stage stays at `TopUp` and the
//! corrective grind does not start.

use crate::config::{grams_to_tenths, tenths_to_grams, CalibrationCfg, TimingCfg};
use crate::error::{Result, StorageError};
use crate::platform::Platform;
use crate::screen::Screen;
use crate::timing::{ProgressPanel, TimerEvent};
use crate::widget::{ButtonId, LabelId, Point, Region, WidgetTree};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupAction {
    Start,
    TopUp,
    CoarseUp,
    CoarseDown,
    FineUp,
    FineDown,
    Cancel,
    Back,
    /// Acknowledge a rate that could not be saved.
    Dismiss,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Waiting for (or running) the reference grind.
    Measure,
    /// Reference grind done; waiting for the weight, or topping up.
    TopUp,
}

/// Seconds per gram from a reference grind.
#[inline]
pub fn rate_from_reference(reference_s: f32, measured_g: f32) -> f32 {
    reference_s / measured_g
}

/// Time needed to bring `measured_g` up to `target_g`. Never negative: an
/// overshoot means there is nothing left to grind.
#[inline]
pub fn corrective_duration_s(target_g: f32, measured_g: f32, rate_s_per_g: f32) -> f32 {
    ((target_g - measured_g) * rate_s_per_g).max(0.0)
}

const COARSE_STEP: i32 = 10;
const FINE_STEP: i32 = 1;

#[derive(Debug, Clone, Copy)]
struct StageControls {
    start: ButtonId,
    top_up: ButtonId,
    adjusters: [ButtonId; 4],
    back: ButtonId,
    measured: LabelId,
    error: LabelId,
    dismiss: ButtonId,
}

pub struct SetupScreen {
    tree: WidgetTree<SetupAction>,
    controls: StageControls,
    panel: ProgressPanel,
    cfg: CalibrationCfg,
    stage: Stage,
    running: Option<Stage>,
    measured_tenths: i32,
    last_rate: Option<f32>,
    autorun_tenths: Option<i32>,
    last_error: Option<StorageError>,
    active: bool,
}

impl SetupScreen {
    pub const START_REGION: Region = Region::new(100, 10, 120, 40);
    pub const BACK_REGION: Region = Region::new(10, 160, 80, 40);
    pub const MEASURED_AT: Point = Point::new(130, 110);
    pub const ERROR_AT: Point = Point::new(10, 60);
    /// Shares Cancel's spot; the two are never shown together.
    pub const DISMISS_REGION: Region = Region::new(120, 160, 80, 40);

    pub fn new(cfg: &CalibrationCfg, timing: &TimingCfg) -> Self {
        let mut tree = WidgetTree::new();
        let root = tree.root();
        let start = tree.add_button(root, Self::START_REGION, "Start", SetupAction::Start);
        let top_up = tree.add_button(root, Self::START_REGION, "Top up", SetupAction::TopUp);
        let adjusters = [
            tree.add_button(root, Region::new(70, 70, 40, 40), "+1", SetupAction::CoarseUp),
            tree.add_button(root, Region::new(70, 110, 40, 40), "-1", SetupAction::CoarseDown),
            tree.add_button(root, Region::new(210, 70, 40, 40), "+.1", SetupAction::FineUp),
            tree.add_button(root, Region::new(210, 110, 40, 40), "-.1", SetupAction::FineDown),
        ];
        let back = tree.add_button(root, Self::BACK_REGION, "Back", SetupAction::Back);
        let measured = tree.add_label(root, Self::MEASURED_AT, "");
        let error = tree.add_label(root, Self::ERROR_AT, "");
        let dismiss = tree.add_button(root, Self::DISMISS_REGION, "OK", SetupAction::Dismiss);
        let panel = ProgressPanel::attach(&mut tree, root, SetupAction::Cancel, timing);
        let mut screen = Self {
            tree,
            controls: StageControls {
                start,
                top_up,
                adjusters,
                back,
                measured,
                error,
                dismiss,
            },
            panel,
            cfg: cfg.clone(),
            stage: Stage::Measure,
            running: None,
            measured_tenths: cfg.default_measured_tenths(),
            last_rate: None,
            autorun_tenths: None,
            last_error: None,
            active: false,
        };
        screen.refresh_controls();
        screen
    }

    /// Run unattended: start the reference grind on entry and, when it
    /// completes, enter `measured_g` and top up.
    pub fn with_autorun(mut self, measured_g: f32) -> Self {
        self.autorun_tenths = Some(self.clamp_tenths(grams_to_tenths(measured_g)));
        self
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn measured_g(&self) -> f32 {
        tenths_to_grams(self.measured_tenths)
    }

    /// Rate persisted by the most recent top-up.
    pub fn last_rate(&self) -> Option<f32> {
        self.last_rate
    }

    pub fn is_grinding(&self) -> bool {
        self.panel.is_grinding()
    }

    /// Storage failure from the last top-up, until it is dismissed.
    pub fn last_error(&self) -> Option<&StorageError> {
        self.last_error.as_ref()
    }

    fn clamp_tenths(&self, t: i32) -> i32 {
        let (lo, hi) = self.cfg.measured_bounds_tenths();
        t.clamp(lo, hi)
    }

    fn adjust(&mut self, delta: i32) {
        self.measured_tenths = self.clamp_tenths(self.measured_tenths.saturating_add(delta));
        self.tree
            .set_text(self.controls.measured, format!("{:.1} g", self.measured_g()));
    }

    /// Show exactly the controls the current stage needs while idle.
    fn refresh_controls(&mut self) {
        let c = self.controls;
        let idle = !self.panel.is_grinding();
        let failed = self.last_error.is_some();
        let ready = idle && !failed;
        let measuring = self.stage == Stage::Measure;
        set_shown(&mut self.tree, c.start, ready && measuring);
        set_shown(&mut self.tree, c.top_up, ready && !measuring);
        for b in c.adjusters {
            set_shown(&mut self.tree, b, ready && !measuring);
        }
        set_shown(&mut self.tree, c.back, idle);
        set_shown(&mut self.tree, c.dismiss, idle && failed);
        self.tree.set_label_visible(c.error, failed);
        self.tree.set_label_visible(c.measured, !measuring);
        self.tree
            .set_text(c.measured, format!("{:.1} g", self.measured_g()));
    }

    fn start_reference(&mut self, p: &mut Platform) -> Result<()> {
        let now = p.now();
        if self
            .panel
            .start(&mut self.tree, self.cfg.reference_grind_s, now, &mut p.motor)?
        {
            self.running = Some(Stage::Measure);
            tracing::info!(reference_s = self.cfg.reference_grind_s, "calibration: reference grind");
        }
        self.refresh_controls();
        Ok(())
    }

    fn open_top_up(&mut self, p: &mut Platform) -> Result<()> {
        self.stage = Stage::TopUp;
        self.measured_tenths = self.cfg.default_measured_tenths();
        tracing::info!("calibration: waiting for measured weight");
        self.refresh_controls();
        if let Some(t) = self.autorun_tenths {
            self.measured_tenths = t;
            self.top_up(p)?;
        }
        Ok(())
    }

    fn top_up(&mut self, p: &mut Platform) -> Result<()> {
        let measured_g = self.measured_g();
        let rate = rate_from_reference(self.cfg.reference_grind_s, measured_g);
        if let Err(e) = p.save_rate(rate) {
            tracing::error!(error = %e, measured_g, rate_s_per_g = rate, "calibration: rate not saved");
            self.tree
                .set_text(self.controls.error, format!("Rate not saved: {e}"));
            self.last_error = Some(e);
            if self.autorun_tenths.is_some() {
                // Nobody to dismiss it; hand the failure to the caller.
                self.active = false;
            }
            self.refresh_controls();
            return Ok(());
        }
        self.last_rate = Some(rate);
        let remaining_s = corrective_duration_s(self.cfg.target_g, measured_g, rate);
        tracing::info!(measured_g, rate_s_per_g = rate, remaining_s, "calibration: top up");

        let now = p.now();
        if self.panel.start(&mut self.tree, remaining_s, now, &mut p.motor)? {
            self.running = Some(Stage::TopUp);
            self.refresh_controls();
        } else {
            self.finish();
        }
        Ok(())
    }

    fn finish(&mut self) {
        self.stage = Stage::Measure;
        self.running = None;
        self.active = false;
        self.refresh_controls();
        tracing::info!(rate_s_per_g = self.last_rate, "calibration done");
    }

    fn cancel(&mut self, p: &mut Platform) -> Result<()> {
        let was = self.running.take();
        let res = self.panel.cancel(&mut self.tree, &mut p.motor);
        if was.is_some() {
            tracing::info!(stage = ?self.stage, "calibration grind cancelled");
        }
        self.refresh_controls();
        res.map(|_| ())
    }

    fn primary(&mut self, p: &mut Platform) -> Result<()> {
        if self.panel.is_grinding() || self.last_error.is_some() {
            return Ok(());
        }
        match self.stage {
            Stage::Measure => self.start_reference(p),
            Stage::TopUp => self.top_up(p),
        }
    }
}

fn set_shown(tree: &mut WidgetTree<SetupAction>, b: ButtonId, on: bool) {
    if on {
        tree.show(b);
    } else {
        tree.hide(b);
    }
}

impl Screen for SetupScreen {
    type Action = SetupAction;

    fn name(&self) -> &'static str {
        "setup"
    }

    fn tree(&self) -> &WidgetTree<SetupAction> {
        &self.tree
    }

    fn on_enter(&mut self, p: &mut Platform) -> Result<()> {
        self.active = true;
        self.refresh_controls();
        if self.autorun_tenths.is_some() && self.stage == Stage::Measure {
            self.start_reference(p)?;
        }
        Ok(())
    }

    fn keep_polling(&mut self, p: &mut Platform) -> Result<bool> {
        let now = p.now();
        if self.panel.tick(&mut self.tree, now, &mut p.motor)? == TimerEvent::Completed {
            match self.running.take() {
                Some(Stage::Measure) => self.open_top_up(p)?,
                Some(Stage::TopUp) => self.finish(),
                None => self.refresh_controls(),
            }
        }
        Ok(self.active)
    }

    fn on_action(&mut self, action: SetupAction, p: &mut Platform) -> Result<()> {
        match action {
            SetupAction::Start | SetupAction::TopUp => self.primary(p)?,
            SetupAction::CoarseUp => self.adjust(COARSE_STEP),
            SetupAction::CoarseDown => self.adjust(-COARSE_STEP),
            SetupAction::FineUp => self.adjust(FINE_STEP),
            SetupAction::FineDown => self.adjust(-FINE_STEP),
            SetupAction::Cancel => self.cancel(p)?,
            SetupAction::Back => self.active = false,
            SetupAction::Dismiss => {
                self.last_error = None;
                self.refresh_controls();
            }
        }
        Ok(())
    }

    fn on_hardware_button(&mut self, p: &mut Platform) -> Result<()> {
        self.primary(p)
    }

    fn on_exit(&mut self, p: &mut Platform) -> Result<()> {
        self.cancel(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn reference_rate_matches_hand_calculation() {
        let r = rate_from_reference(6.0, 9.0);
        assert!((r - 0.666_666_7).abs() < 1e-6);
        assert!((corrective_duration_s(19.0, 9.0, r) - 6.666_667).abs() < 1e-4);
    }

    #[rstest]
    #[case(19.0, 19.0, 0.0)]
    #[case(19.0, 25.0, 0.0)]
    #[case(19.0, f32::NAN, 0.0)]
    fn corrective_duration_never_negative(#[case] target: f32, #[case] measured: f32, #[case] want: f32) {
        assert_eq!(corrective_duration_s(target, measured, 0.5), want);
    }

    #[test]
    fn weight_adjust_clamps_to_bounds() {
        let mut s = SetupScreen::new(&CalibrationCfg::default(), &TimingCfg::default());
        for _ in 0..200 {
            s.adjust(-COARSE_STEP);
        }
        assert_eq!(s.measured_tenths, 1);
        for _ in 0..200 {
            s.adjust(COARSE_STEP);
        }
        assert_eq!(s.measured_tenths, 500);
    }

    #[test]
    fn starts_in_measure_with_only_start_and_back() {
        let s = SetupScreen::new(&CalibrationCfg::default(), &TimingCfg::default());
        let labels: Vec<&str> = s
            .tree()
            .visible_buttons()
            .iter()
            .map(|(_, b)| b.label.as_str())
            .collect();
        assert_eq!(labels, vec!["Start", "Back"]);
        assert_eq!(s.stage(), Stage::Measure);
    }
}
