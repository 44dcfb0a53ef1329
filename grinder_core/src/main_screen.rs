//! Main screen: the two grind profiles plus entry points to setup and grind.

use crate::calibration::SetupScreen;
use crate::config::{CalibrationCfg, ProfileCfg, TimingCfg};
use crate::error::Result;
use crate::grind::{GrindPlan, GrindScreen};
use crate::platform::Platform;
use crate::profile::{GrindProfile, ProfileAction, SelectionGroup};
use crate::screen::Screen;
use crate::widget::{Point, Region, WidgetTree};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MainAction {
    Setup,
    Grind,
    Profile(usize, ProfileAction),
}

pub struct MainScreen {
    tree: WidgetTree<MainAction>,
    profiles: SelectionGroup,
    setup: SetupScreen,
    grind: GrindScreen,
}

impl MainScreen {
    pub const SETUP_REGION: Region = Region::new(10, 190, 140, 40);
    pub const GRIND_REGION: Region = Region::new(170, 190, 140, 40);
    pub const SINGLE_AT: Point = Point::new(0, 10);
    pub const DOUBLE_AT: Point = Point::new(160, 10);

    pub fn new(profiles: &ProfileCfg, calibration: &CalibrationCfg, timing: &TimingCfg) -> Self {
        let mut tree = WidgetTree::new();
        let root = tree.root();
        let setup = tree.add_button(root, Self::SETUP_REGION, "Setup", MainAction::Setup);
        let grind = tree.add_button(root, Self::GRIND_REGION, "Grind", MainAction::Grind);
        tree.show(setup);
        tree.show(grind);

        let mut group = SelectionGroup::new();
        for (at, label, amount) in [
            (Self::SINGLE_AT, profiles.single_label.as_str(), profiles.single_g),
            (Self::DOUBLE_AT, profiles.double_label.as_str(), profiles.double_g),
        ] {
            let index = group.len();
            let p = GrindProfile::attach(&mut tree, root, at, label, amount, profiles.max_g, |a| {
                MainAction::Profile(index, a)
            });
            group.push(p);
        }
        group.select(&mut tree, usize::from(!profiles.start_single));

        Self {
            tree,
            profiles: group,
            setup: SetupScreen::new(calibration, timing),
            grind: GrindScreen::new(timing),
        }
    }

    pub fn profiles(&self) -> &SelectionGroup {
        &self.profiles
    }

    pub fn grind_screen(&self) -> &GrindScreen {
        &self.grind
    }

    pub fn setup_screen(&self) -> &SetupScreen {
        &self.setup
    }

    /// Grind the selected profile's amount on the grind screen.
    fn start_grind(&mut self, p: &mut Platform) -> Result<()> {
        let Some(grams) = self.profiles.selected_amount() else {
            return Ok(());
        };
        match self.grind.grind_grams(f32::from(grams), p)? {
            GrindPlan::Nothing => Ok(()),
            GrindPlan::Started { .. } | GrindPlan::RateUnavailable(_) => p.show(&mut self.grind),
        }
    }
}

impl Screen for MainScreen {
    type Action = MainAction;

    fn name(&self) -> &'static str {
        "main"
    }

    fn tree(&self) -> &WidgetTree<MainAction> {
        &self.tree
    }

    fn on_action(&mut self, action: MainAction, p: &mut Platform) -> Result<()> {
        match action {
            MainAction::Setup => p.show(&mut self.setup),
            MainAction::Grind => self.start_grind(p),
            MainAction::Profile(i, a) => {
                self.profiles.apply(&mut self.tree, i, a);
                Ok(())
            }
        }
    }

    fn on_hardware_button(&mut self, p: &mut Platform) -> Result<()> {
        self.start_grind(p)
    }
}

/// Static "Welcome" view mounted underneath the main screen.
#[derive(Debug)]
pub struct Splash {
    tree: WidgetTree<()>,
}

impl Default for Splash {
    fn default() -> Self {
        Self::new()
    }
}

impl Splash {
    pub fn new() -> Self {
        let mut tree = WidgetTree::new();
        let root = tree.root();
        tree.add_label(root, Point::new(110, 110), "Welcome");
        Self { tree }
    }

    pub fn tree(&self) -> &WidgetTree<()> {
        &self.tree
    }
}

/// Mount the splash, then run the main screen until shutdown. The splash is
/// what remains mounted afterwards.
pub fn run_appliance(main: &mut MainScreen, splash: &Splash, p: &mut Platform) -> Result<()> {
    p.mount(Some(splash.tree().view_id()));
    tracing::info!("appliance starting");
    p.show(main)
}
