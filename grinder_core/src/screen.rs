//! Screens, the screen stack, and the blocking poll loop.
//!
//! Showing a screen mounts its view at the display root, saves whatever was
//! mounted before, and polls touch and the grind button until the screen's
//! predicate says stop. Teardown always runs: the screen's exit hook, then the
//! motor line is driven low, then the saved view is remounted.
//!
//! The stack has one base slot and at most [`MAX_OVERLAY_DEPTH`] overlay. A
//! screen shown from inside another screen's hook is the overlay; showing a
//! third is refused with [`GrinderError::ScreenStackFull`].

use std::fmt::Debug;

use grinder_traits::{Display, ViewId};

use crate::dispatch::{EdgeDetector, TouchLatch};
use crate::error::{GrinderError, Result};
use crate::platform::Platform;
use crate::widget::WidgetTree;

/// Overlays allowed above the base screen.
pub const MAX_OVERLAY_DEPTH: usize = 1;

/// A top-level container with its own poll loop.
///
/// Every hook gets the platform so it can read the clock, drive the grind
/// timer, reach the rate store, or show another screen.
pub trait Screen {
    type Action: Copy + Debug;

    fn name(&self) -> &'static str;

    fn tree(&self) -> &WidgetTree<Self::Action>;

    /// Called once after the view is mounted.
    fn on_enter(&mut self, _p: &mut Platform) -> Result<()> {
        Ok(())
    }

    /// Polling predicate, evaluated at the top of every iteration. This is
    /// also where screens advance their grind timer.
    fn keep_polling(&mut self, _p: &mut Platform) -> Result<bool> {
        Ok(true)
    }

    /// A button in this screen's tree fired.
    fn on_action(&mut self, action: Self::Action, p: &mut Platform) -> Result<()>;

    /// Rising edge on the physical grind button.
    fn on_hardware_button(&mut self, _p: &mut Platform) -> Result<()> {
        Ok(())
    }

    /// Called once before the view is unmounted, including on error paths.
    fn on_exit(&mut self, _p: &mut Platform) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Frame {
    view: ViewId,
    saved: Option<ViewId>,
}

/// Mounted screens, base first.
#[derive(Debug, Default)]
pub struct ScreenStack {
    frames: Vec<Frame>,
    restores: u64,
}

impl ScreenStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn top(&self) -> Option<ViewId> {
        self.frames.last().map(|f| f.view)
    }

    /// Number of completed pops; changes whenever a screen finished.
    pub fn restores(&self) -> u64 {
        self.restores
    }

    /// Mount `view`, remembering what it replaces.
    pub fn push(&mut self, view: ViewId, display: &mut dyn Display) -> Result<()> {
        if self.frames.len() > MAX_OVERLAY_DEPTH {
            return Err(GrinderError::ScreenStackFull.into());
        }
        let saved = display.mounted();
        display.mount(Some(view));
        self.frames.push(Frame { view, saved });
        Ok(())
    }

    /// Unmount the top view and remount what it replaced.
    pub fn pop(&mut self, display: &mut dyn Display) -> Option<ViewId> {
        let frame = self.frames.pop()?;
        display.mount(frame.saved);
        self.restores += 1;
        Some(frame.view)
    }
}

impl Platform {
    /// Mount `screen` and run its poll loop until the predicate returns
    /// false, the shutdown flag is raised, or a hook fails. The previously
    /// mounted view is restored and the motor is off when this returns.
    pub fn show<S: Screen>(&mut self, screen: &mut S) -> Result<()> {
        let view = screen.tree().view_id();
        if let Err(e) = self.stack.push(view, &mut *self.display) {
            // A grind may have been started for the refused screen.
            if let Err(off) = self.motor.force_off() {
                tracing::warn!(error = %off, screen = screen.name(), "motor off failed after refused push");
            }
            return Err(e);
        }
        tracing::info!(screen = screen.name(), depth = self.stack.depth(), "screen mounted");

        let polled = self.poll_screen(screen);
        let exited = screen.on_exit(self);
        if let Err(e) = self.motor.force_off() {
            tracing::warn!(error = %e, screen = screen.name(), "motor off failed on teardown");
        }
        self.stack.pop(&mut *self.display);
        tracing::info!(screen = screen.name(), "screen unmounted");
        polled.and(exited)
    }

    fn poll_screen<S: Screen>(&mut self, screen: &mut S) -> Result<()> {
        screen.on_enter(self)?;
        let threshold = self.touch_cfg().pressure_threshold;
        // The press that opened this screen belongs to the parent.
        let mut latch = TouchLatch::seeded(self.last_touch(), threshold);
        let mut edge = EdgeDetector::new(self.read_button()?);
        let interval = self.touch_cfg().poll_interval();

        while !self.shutdown_requested() && screen.keep_polling(self)? {
            let sample = self.sample_touch()?;
            let tree = screen.tree();
            let root = tree.root();
            let fired = latch.poll(sample, threshold, |pt| tree.dispatch(root, pt));

            let restores = self.stack.restores();
            for action in fired {
                tracing::debug!(screen = screen.name(), ?action, "dispatch");
                screen.on_action(action, self)?;
            }

            let level = self.read_button()?;
            if self.stack.restores() != restores {
                // A nested screen ran; its button history is not ours.
                edge = EdgeDetector::new(level);
            } else if edge.rising(level) {
                tracing::debug!(screen = screen.name(), "grind button");
                screen.on_hardware_button(self)?;
            }

            self.clock().sleep(interval);
        }
        Ok(())
    }
}

/// Show `screen` as the base of an otherwise idle platform. Used by headless
/// front ends that drive a single screen to completion.
pub fn run_headless<S: Screen>(screen: &mut S, p: &mut Platform) -> Result<()> {
    p.show(screen)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Root(Option<ViewId>);

    impl Display for Root {
        fn mounted(&self) -> Option<ViewId> {
            self.0
        }
        fn mount(&mut self, view: Option<ViewId>) {
            self.0 = view;
        }
    }

    #[test]
    fn push_pop_restores_previous_view() {
        let mut d = Root(Some(ViewId(99)));
        let mut s = ScreenStack::new();
        s.push(ViewId(1), &mut d).unwrap();
        s.push(ViewId(2), &mut d).unwrap();
        assert_eq!(d.mounted(), Some(ViewId(2)));
        assert_eq!(s.pop(&mut d), Some(ViewId(2)));
        assert_eq!(d.mounted(), Some(ViewId(1)));
        assert_eq!(s.pop(&mut d), Some(ViewId(1)));
        assert_eq!(d.mounted(), Some(ViewId(99)));
        assert_eq!(s.restores(), 2);
    }

    #[test]
    fn second_overlay_is_refused() {
        let mut d = Root::default();
        let mut s = ScreenStack::new();
        s.push(ViewId(1), &mut d).unwrap();
        s.push(ViewId(2), &mut d).unwrap();
        let err = s.push(ViewId(3), &mut d).unwrap_err();
        assert_eq!(
            err.downcast_ref::<GrinderError>(),
            Some(&GrinderError::ScreenStackFull)
        );
        assert_eq!(d.mounted(), Some(ViewId(2)));
        assert_eq!(s.depth(), 2);
    }
}
