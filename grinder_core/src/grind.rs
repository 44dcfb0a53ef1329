//! Grind screen: one timed grind at the persisted rate.

use crate::config::TimingCfg;
use crate::error::{Result, StorageError};
use crate::platform::Platform;
use crate::screen::Screen;
use crate::timing::{ProgressPanel, TimerEvent};
use crate::widget::{ButtonId, LabelId, Point, Region, WidgetTree};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrindAction {
    Cancel,
    /// Acknowledge a storage error.
    Dismiss,
}

/// How a grind request was resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum GrindPlan {
    /// The motor is running for `duration_s` seconds plus settle.
    Started { rate_s_per_g: f32, duration_s: f32 },
    /// The computed duration was zero; nothing to grind.
    Nothing,
    /// The rate could not be loaded; the error is on screen.
    RateUnavailable(StorageError),
}

/// Grind duration for `grams` at `rate_s_per_g`.
#[inline]
pub fn grind_duration_s(rate_s_per_g: f32, grams: f32) -> f32 {
    rate_s_per_g * grams
}

pub struct GrindScreen {
    tree: WidgetTree<GrindAction>,
    panel: ProgressPanel,
    error_label: LabelId,
    dismiss: ButtonId,
    last_error: Option<StorageError>,
    completed: bool,
    active: bool,
}

impl GrindScreen {
    pub const DISMISS_REGION: Region = Region::new(120, 100, 80, 40);
    pub const ERROR_AT: Point = Point::new(10, 40);

    pub fn new(timing: &TimingCfg) -> Self {
        let mut tree = WidgetTree::new();
        let root = tree.root();
        let panel = ProgressPanel::attach(&mut tree, root, GrindAction::Cancel, timing);
        let error_label = tree.add_label(root, Self::ERROR_AT, "");
        tree.set_label_visible(error_label, false);
        let dismiss = tree.add_button(root, Self::DISMISS_REGION, "OK", GrindAction::Dismiss);
        Self {
            tree,
            panel,
            error_label,
            dismiss,
            last_error: None,
            completed: false,
            active: false,
        }
    }

    /// Prepare a grind of `grams`: load the rate and start the motor. Call
    /// before showing the screen. A storage failure never starts the motor;
    /// it is shown with an OK button instead.
    pub fn grind_grams(&mut self, grams: f32, p: &mut Platform) -> Result<GrindPlan> {
        self.clear_error();
        self.completed = false;
        let rate = match p.load_rate() {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(error = %e, grams, "grind refused: rate unavailable");
                self.tree.set_text(self.error_label, format!("No calibrated rate: {e}"));
                self.tree.set_label_visible(self.error_label, true);
                self.tree.show(self.dismiss);
                self.last_error = Some(e.clone());
                return Ok(GrindPlan::RateUnavailable(e));
            }
        };
        let duration_s = grind_duration_s(rate, grams);
        let now = p.now();
        if !self.panel.start(&mut self.tree, duration_s, now, &mut p.motor)? {
            return Ok(GrindPlan::Nothing);
        }
        tracing::info!(grams, rate_s_per_g = rate, duration_s, "grind requested");
        Ok(GrindPlan::Started {
            rate_s_per_g: rate,
            duration_s,
        })
    }

    /// Storage error from the last request, if any.
    pub fn last_error(&self) -> Option<&StorageError> {
        self.last_error.as_ref()
    }

    /// Whether the last grind ran to natural completion.
    pub fn completed(&self) -> bool {
        self.completed
    }

    pub fn is_grinding(&self) -> bool {
        self.panel.is_grinding()
    }

    fn clear_error(&mut self) {
        self.last_error = None;
        self.hide_error();
    }

    fn hide_error(&mut self) {
        self.tree.set_label_visible(self.error_label, false);
        self.tree.hide(self.dismiss);
    }
}

impl Screen for GrindScreen {
    type Action = GrindAction;

    fn name(&self) -> &'static str {
        "grind"
    }

    fn tree(&self) -> &WidgetTree<GrindAction> {
        &self.tree
    }

    fn on_enter(&mut self, _p: &mut Platform) -> Result<()> {
        self.active = self.panel.is_grinding() || self.last_error.is_some();
        Ok(())
    }

    fn keep_polling(&mut self, p: &mut Platform) -> Result<bool> {
        let now = p.now();
        if self.panel.tick(&mut self.tree, now, &mut p.motor)? == TimerEvent::Completed {
            self.completed = true;
            self.active = false;
        }
        Ok(self.active)
    }

    fn on_action(&mut self, action: GrindAction, p: &mut Platform) -> Result<()> {
        match action {
            GrindAction::Cancel => {
                self.panel.cancel(&mut self.tree, &mut p.motor)?;
                self.active = false;
            }
            GrindAction::Dismiss => {
                self.hide_error();
                self.active = false;
            }
        }
        Ok(())
    }

    fn on_exit(&mut self, p: &mut Platform) -> Result<()> {
        self.panel.cancel(&mut self.tree, &mut p.motor)?;
        Ok(())
    }
}
