#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Core grinder control logic (hardware-agnostic).
//!
//! All hardware interactions go through the `grinder_traits` seams: touch
//! panel, grind button, motor-enable line, display root and rate store.
//!
//! ## Architecture
//!
//! - **Widgets**: arena of containers, buttons, labels and bars (`widget`)
//! - **Dispatch**: hit testing, the one-shot touch latch, button edges (`dispatch`)
//! - **Screens**: the blocking poll loop and the depth-limited stack (`screen`)
//! - **Timing**: motor line, grind timer and progress panel (`timing`)
//! - **Profiles**: the two canned settings in an exclusive group (`profile`)
//! - **Calibration**: two-stage rate measurement (`calibration`)
//! - **Grind / Main**: the user-facing screens (`grind`, `main_screen`)
//!
//! Control is single-threaded: the poll loop of the screen on top of the
//! stack is the only driver, and nested screens run inside their parent's
//! action hooks.

pub mod atomic;
pub mod calibration;
pub mod config;
pub mod conversions;
pub mod dispatch;
pub mod error;
pub mod grind;
pub mod hw_error;
pub mod main_screen;
pub mod mocks;
pub mod platform;
pub mod profile;
pub mod screen;
pub mod store;
pub mod timing;
pub mod widget;

pub use calibration::{SetupAction, SetupScreen, Stage};
pub use config::{CalibrationCfg, ProfileCfg, TimingCfg, TouchCfg};
pub use dispatch::{EdgeDetector, TouchLatch};
pub use error::{BuildError, GrinderError, Result, StorageError};
pub use grind::{GrindAction, GrindPlan, GrindScreen};
pub use main_screen::{MainAction, MainScreen, Splash, run_appliance};
pub use platform::{Platform, PlatformBuilder};
pub use profile::{GrindProfile, ProfileAction, SelectionGroup};
pub use screen::{MAX_OVERLAY_DEPTH, Screen, ScreenStack, run_headless};
pub use store::FileRateStore;
pub use timing::{GrindTimer, MotorLine, ProgressPanel, TimerEvent};
pub use widget::{BarId, ButtonId, ContainerId, LabelId, Point, Region, WidgetTree};
