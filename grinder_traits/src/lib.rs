//! Platform seams consumed by the grinder controller.
//!
//! Everything the control logic needs from the outside world goes through
//! one of these traits: touch sampling, the physical grind button, the
//! motor-enable line, the display root, and the persisted rate. Errors are
//! boxed at this boundary and mapped to typed errors in `grinder_core`.

pub mod clock;

pub use clock::{Clock, MonotonicClock, TestClock};

/// Boxed error returned across every platform boundary.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// One raw touch reading in display coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TouchSample {
    pub x: i32,
    pub y: i32,
    /// Raw panel pressure; larger means a firmer press.
    pub pressure: u32,
}

impl TouchSample {
    pub const fn new(x: i32, y: i32, pressure: u32) -> Self {
        Self { x, y, pressure }
    }
}

/// Identifier of a visual container that can be mounted at the display root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewId(pub u32);

pub trait TouchPanel {
    /// Sample the panel once. `None` when nothing touches it.
    fn sample(&mut self) -> Result<Option<TouchSample>, BoxError>;
}

pub trait DigitalInput {
    fn is_high(&mut self) -> Result<bool, BoxError>;
}

pub trait MotorEnable {
    fn set_enabled(&mut self, on: bool) -> Result<(), BoxError>;
}

/// The single mount point of the display.
pub trait Display {
    /// View currently mounted at the root, if any.
    fn mounted(&self) -> Option<ViewId>;
    /// Replace whatever is mounted with `view` (`None` clears the root).
    fn mount(&mut self, view: Option<ViewId>);
}

/// Durable scalar holding the calibrated rate in seconds per gram.
pub trait RateStore {
    fn load(&mut self) -> Result<f32, BoxError>;
    fn save(&mut self, rate_s_per_g: f32) -> Result<(), BoxError>;
}

impl<T: TouchPanel + ?Sized> TouchPanel for Box<T> {
    fn sample(&mut self) -> Result<Option<TouchSample>, BoxError> {
        (**self).sample()
    }
}

impl<T: DigitalInput + ?Sized> DigitalInput for Box<T> {
    fn is_high(&mut self) -> Result<bool, BoxError> {
        (**self).is_high()
    }
}

impl<T: MotorEnable + ?Sized> MotorEnable for Box<T> {
    fn set_enabled(&mut self, on: bool) -> Result<(), BoxError> {
        (**self).set_enabled(on)
    }
}
