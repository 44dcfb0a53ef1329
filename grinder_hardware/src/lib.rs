pub mod error;
#[cfg(all(feature = "hardware", target_os = "linux"))]
pub mod gpio;
pub mod replay;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use grinder_traits::{BoxError, DigitalInput, Display, MotorEnable, TouchPanel, TouchSample, ViewId};

pub use replay::{InputReplay, ReplayButton, ReplayEvent, ReplayKind, ReplayTouch};

/// Simulated motor-enable line
#[derive(Debug, Clone, Default)]
pub struct SimulatedMotor {
    on: Arc<AtomicBool>,
}

impl SimulatedMotor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_on(&self) -> bool {
        self.on.load(Ordering::Relaxed)
    }
}

impl MotorEnable for SimulatedMotor {
    fn set_enabled(&mut self, on: bool) -> Result<(), BoxError> {
        let was = self.on.swap(on, Ordering::Relaxed);
        if was != on {
            tracing::info!(on, "motor enable (simulated)");
        }
        Ok(())
    }
}

/// Simulated momentary button; the level is shared with whoever holds a clone.
#[derive(Debug, Clone, Default)]
pub struct SimulatedButton {
    level: Arc<AtomicBool>,
}

impl SimulatedButton {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, pressed: bool) {
        self.level.store(pressed, Ordering::Relaxed);
    }
}

impl DigitalInput for SimulatedButton {
    fn is_high(&mut self) -> Result<bool, BoxError> {
        Ok(self.level.load(Ordering::Relaxed))
    }
}

/// Touch panel nobody touches.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdleTouch;

impl TouchPanel for IdleTouch {
    fn sample(&mut self) -> Result<Option<TouchSample>, BoxError> {
        Ok(None)
    }
}

/// Display root without a screen: remembers the mounted view and logs changes.
#[derive(Debug, Clone, Default)]
pub struct HeadlessDisplay {
    mounted: Option<ViewId>,
}

impl HeadlessDisplay {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Display for HeadlessDisplay {
    fn mounted(&self) -> Option<ViewId> {
        self.mounted
    }

    fn mount(&mut self, view: Option<ViewId>) {
        tracing::debug!(view = ?view.map(|v| v.0), "display root");
        self.mounted = view;
    }
}
