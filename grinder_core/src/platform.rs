//! Platform assembly: every external collaborator the screens talk to.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use eyre::WrapErr;
use grinder_traits::{
    Clock, DigitalInput, Display, MonotonicClock, MotorEnable, RateStore, TouchPanel,
    TouchSample, ViewId,
};

use crate::config::TouchCfg;
use crate::error::{BuildError, Result, StorageError};
use crate::hw_error::{map_hw_error, map_storage_error};
use crate::screen::ScreenStack;
use crate::store::check_rate;
use crate::timing::MotorLine;

/// Owns the touch panel, grind button, display root, rate store, clock and
/// motor line, plus the screen stack. Screens receive `&mut Platform` in
/// every hook.
pub struct Platform {
    touch: Box<dyn TouchPanel>,
    button: Box<dyn DigitalInput>,
    pub(crate) display: Box<dyn Display>,
    store: Box<dyn RateStore>,
    clock: Arc<dyn Clock + Send + Sync>,
    pub(crate) motor: MotorLine,
    pub(crate) stack: ScreenStack,
    touch_cfg: TouchCfg,
    shutdown: Option<Arc<AtomicBool>>,
    last_touch: Option<TouchSample>,
}

impl std::fmt::Debug for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Platform")
            .field("motor", &self.motor)
            .field("stack", &self.stack)
            .field("mounted", &self.display.mounted())
            .field("touch_cfg", &self.touch_cfg)
            .finish_non_exhaustive()
    }
}

impl Platform {
    pub fn builder() -> PlatformBuilder {
        PlatformBuilder::default()
    }

    #[inline]
    pub fn now(&self) -> Instant {
        self.clock.now()
    }

    pub fn clock(&self) -> &Arc<dyn Clock + Send + Sync> {
        &self.clock
    }

    pub fn touch_cfg(&self) -> &TouchCfg {
        &self.touch_cfg
    }

    pub fn motor_on(&self) -> bool {
        self.motor.is_on()
    }

    /// Currently mounted view at the display root.
    pub fn mounted(&self) -> Option<ViewId> {
        self.display.mounted()
    }

    /// Mount a view directly, outside the screen stack (splash views).
    pub fn mount(&mut self, view: Option<ViewId>) {
        self.display.mount(view);
    }

    pub fn shutdown_requested(&self) -> bool {
        self.shutdown
            .as_ref()
            .is_some_and(|s| s.load(Ordering::Relaxed))
    }

    pub(crate) fn sample_touch(&mut self) -> Result<Option<TouchSample>> {
        let sample = self
            .touch
            .sample()
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
            .wrap_err("touch sample")?;
        self.last_touch = sample;
        Ok(sample)
    }

    /// Most recent touch sample read by any poll loop. A screen shown from a
    /// touch handler sees the press that opened it here.
    pub(crate) fn last_touch(&self) -> Option<TouchSample> {
        self.last_touch
    }

    pub(crate) fn read_button(&mut self) -> Result<bool> {
        self.button
            .is_high()
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
            .wrap_err("grind button")
    }

    /// Load the persisted rate (seconds per gram). Corrupt values are
    /// rejected here even if the store itself accepted them.
    pub fn load_rate(&mut self) -> std::result::Result<f32, StorageError> {
        let rate = self.store.load().map_err(|e| map_storage_error(&*e))?;
        check_rate(rate)
    }

    /// Persist a new rate. Failures come back as a [`StorageError`] so the
    /// calling screen can show them instead of aborting its loop.
    pub fn save_rate(&mut self, rate_s_per_g: f32) -> std::result::Result<(), StorageError> {
        check_rate(rate_s_per_g)?;
        self.store
            .save(rate_s_per_g)
            .map_err(|e| map_storage_error(&*e))?;
        tracing::info!(rate_s_per_g, "rate persisted");
        Ok(())
    }
}

/// Builder for [`Platform`]; every device is required, the clock defaults
/// to [`MonotonicClock`].
#[derive(Default)]
pub struct PlatformBuilder {
    touch: Option<Box<dyn TouchPanel>>,
    button: Option<Box<dyn DigitalInput>>,
    motor: Option<Box<dyn MotorEnable>>,
    display: Option<Box<dyn Display>>,
    store: Option<Box<dyn RateStore>>,
    clock: Option<Arc<dyn Clock + Send + Sync>>,
    touch_cfg: TouchCfg,
    shutdown: Option<Arc<AtomicBool>>,
}

impl PlatformBuilder {
    pub fn with_touch(mut self, t: impl TouchPanel + 'static) -> Self {
        self.touch = Some(Box::new(t));
        self
    }

    pub fn with_button(mut self, b: impl DigitalInput + 'static) -> Self {
        self.button = Some(Box::new(b));
        self
    }

    pub fn with_motor(mut self, m: impl MotorEnable + 'static) -> Self {
        self.motor = Some(Box::new(m));
        self
    }

    pub fn with_display(mut self, d: impl Display + 'static) -> Self {
        self.display = Some(Box::new(d));
        self
    }

    pub fn with_store(mut self, s: impl RateStore + 'static) -> Self {
        self.store = Some(Box::new(s));
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn with_touch_cfg(mut self, cfg: TouchCfg) -> Self {
        self.touch_cfg = cfg;
        self
    }

    /// Flag polled once per loop iteration; when set, every shown screen
    /// exits (through its normal teardown) at the next tick.
    pub fn with_shutdown(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown = Some(flag);
        self
    }

    pub fn try_build(self) -> Result<Platform> {
        let touch = self.touch.ok_or(BuildError::MissingTouch)?;
        let button = self.button.ok_or(BuildError::MissingButton)?;
        let motor = self.motor.ok_or(BuildError::MissingMotor)?;
        let display = self.display.ok_or(BuildError::MissingDisplay)?;
        let store = self.store.ok_or(BuildError::MissingStore)?;
        Ok(Platform {
            touch,
            button,
            display,
            store,
            clock: self.clock.unwrap_or_else(|| Arc::new(MonotonicClock::new())),
            motor: MotorLine::new(motor),
            stack: ScreenStack::new(),
            touch_cfg: self.touch_cfg,
            shutdown: self.shutdown,
            last_touch: None,
        })
    }
}
