#![allow(dead_code)]

use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use grinder_core::mocks::{MemoryRateStore, RecordingDisplay, ScriptedTouch, SharedInput};
use grinder_core::{Platform, TouchCfg};
use grinder_traits::{BoxError, DigitalInput, MotorEnable, TestClock};

/// Motor that records each write together with the virtual time it happened.
#[derive(Clone)]
pub struct TimedMotor {
    clock: TestClock,
    pub log: Arc<Mutex<Vec<(Duration, bool)>>>,
}

impl TimedMotor {
    pub fn new(clock: &TestClock) -> Self {
        Self {
            clock: clock.clone(),
            log: Arc::default(),
        }
    }

    pub fn writes(&self) -> Vec<(Duration, bool)> {
        self.log.lock().unwrap().clone()
    }

    pub fn levels(&self) -> Vec<bool> {
        self.writes().into_iter().map(|(_, on)| on).collect()
    }
}

impl MotorEnable for TimedMotor {
    fn set_enabled(&mut self, on: bool) -> Result<(), BoxError> {
        self.log.lock().unwrap().push((self.clock.elapsed(), on));
        Ok(())
    }
}

pub struct Rig {
    pub clock: TestClock,
    pub motor: TimedMotor,
    pub display: RecordingDisplay,
    pub button: SharedInput,
    pub store: MemoryRateStore,
    pub shutdown: Arc<AtomicBool>,
}

impl Rig {
    pub fn new(store: MemoryRateStore) -> Self {
        let clock = TestClock::new();
        Self {
            motor: TimedMotor::new(&clock),
            clock,
            display: RecordingDisplay::new(),
            button: SharedInput::new(false),
            store,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Platform over `touch`; shutdown is raised when the touch script ends.
    pub fn platform(&self, touch: ScriptedTouch) -> Platform {
        self.platform_with_button(touch, self.button.clone())
    }

    pub fn platform_with_button(
        &self,
        touch: ScriptedTouch,
        button: impl DigitalInput + 'static,
    ) -> Platform {
        Platform::builder()
            .with_touch(touch.shutdown_when_done(self.shutdown.clone()))
            .with_button(button)
            .with_motor(self.motor.clone())
            .with_display(self.display.clone())
            .with_store(self.store.clone())
            .with_clock(Arc::new(self.clock.clone()))
            .with_touch_cfg(TouchCfg {
                pressure_threshold: 100,
                poll_interval_ms: 5,
            })
            .with_shutdown(self.shutdown.clone())
            .try_build()
            .expect("all devices provided")
    }
}
