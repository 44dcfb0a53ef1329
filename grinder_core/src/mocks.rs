//! In-memory platform doubles for tests and headless runs.
//!
//! All of them share their state through `Arc`s so a test can keep a handle
//! after moving the device into a `Platform`.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use grinder_traits::{
    BoxError, DigitalInput, Display, MotorEnable, RateStore, TouchPanel, TouchSample, ViewId,
};

use crate::error::StorageError;
use crate::store::{check_rate, format_rate, parse_rate};

/// Rate store holding the same text a rate file would.
#[derive(Debug, Clone, Default)]
pub struct MemoryRateStore {
    text: Arc<Mutex<Option<String>>>,
    fail_saves: Arc<AtomicBool>,
}

impl MemoryRateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text: Arc::new(Mutex::new(Some(text.into()))),
            fail_saves: Arc::default(),
        }
    }

    pub fn text(&self) -> Option<String> {
        self.text.lock().ok().and_then(|t| t.clone())
    }

    /// Make subsequent saves fail as if the medium were full.
    pub fn set_failing(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::Relaxed);
    }
}

impl RateStore for MemoryRateStore {
    fn load(&mut self) -> Result<f32, BoxError> {
        let text = self.text().ok_or(StorageError::Missing)?;
        Ok(parse_rate(&text)?)
    }

    fn save(&mut self, rate_s_per_g: f32) -> Result<(), BoxError> {
        check_rate(rate_s_per_g)?;
        if self.fail_saves.load(Ordering::Relaxed) {
            return Err(Box::new(StorageError::Io("disk full".into())));
        }
        let mut t = self
            .text
            .lock()
            .map_err(|_| StorageError::Io("store poisoned".into()))?;
        *t = Some(format_rate(rate_s_per_g));
        Ok(())
    }
}

/// Touch panel that replays one scripted sample per `sample()` call.
///
/// After the script runs out it reports no touch; if a shutdown flag was
/// attached it is raised at that point.
#[derive(Debug, Default)]
pub struct ScriptedTouch {
    samples: VecDeque<Option<TouchSample>>,
    shutdown: Option<Arc<AtomicBool>>,
}

impl ScriptedTouch {
    pub fn new(samples: impl IntoIterator<Item = Option<TouchSample>>) -> Self {
        Self {
            samples: samples.into_iter().collect(),
            shutdown: None,
        }
    }

    /// `ticks` samples pressing at (x, y), then `gap` samples of no touch.
    pub fn press(mut self, x: i32, y: i32, pressure: u32, ticks: usize, gap: usize) -> Self {
        let s = TouchSample::new(x, y, pressure);
        self.samples.extend(std::iter::repeat_n(Some(s), ticks));
        self.samples.extend(std::iter::repeat_n(None, gap));
        self
    }

    pub fn idle(mut self, ticks: usize) -> Self {
        self.samples.extend(std::iter::repeat_n(None, ticks));
        self
    }

    pub fn shutdown_when_done(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown = Some(flag);
        self
    }
}

impl TouchPanel for ScriptedTouch {
    fn sample(&mut self) -> Result<Option<TouchSample>, BoxError> {
        match self.samples.pop_front() {
            Some(s) => Ok(s),
            None => {
                if let Some(flag) = &self.shutdown {
                    flag.store(true, Ordering::Relaxed);
                }
                Ok(None)
            }
        }
    }
}

/// Digital input whose level is set from outside.
#[derive(Debug, Clone, Default)]
pub struct SharedInput {
    level: Arc<AtomicBool>,
}

impl SharedInput {
    pub fn new(level: bool) -> Self {
        Self {
            level: Arc::new(AtomicBool::new(level)),
        }
    }

    pub fn set(&self, level: bool) {
        self.level.store(level, Ordering::Relaxed);
    }
}

impl DigitalInput for SharedInput {
    fn is_high(&mut self) -> Result<bool, BoxError> {
        Ok(self.level.load(Ordering::Relaxed))
    }
}

/// Digital input that replays one level per read, then holds the last one.
#[derive(Debug, Default)]
pub struct ScriptedInput {
    levels: VecDeque<bool>,
    last: bool,
}

impl ScriptedInput {
    pub fn new(levels: impl IntoIterator<Item = bool>) -> Self {
        Self {
            levels: levels.into_iter().collect(),
            last: false,
        }
    }
}

impl DigitalInput for ScriptedInput {
    fn is_high(&mut self) -> Result<bool, BoxError> {
        if let Some(l) = self.levels.pop_front() {
            self.last = l;
        }
        Ok(self.last)
    }
}

/// Motor output recording every level written to it.
#[derive(Debug, Clone, Default)]
pub struct SpyMotor {
    writes: Arc<Mutex<Vec<bool>>>,
    fail: Arc<AtomicBool>,
}

impl SpyMotor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn writes(&self) -> Vec<bool> {
        self.writes.lock().map(|w| w.clone()).unwrap_or_default()
    }

    /// Last level written; `false` if never written.
    pub fn is_on(&self) -> bool {
        self.writes().last().copied().unwrap_or(false)
    }

    /// Make subsequent writes fail.
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::Relaxed);
    }
}

impl MotorEnable for SpyMotor {
    fn set_enabled(&mut self, on: bool) -> Result<(), BoxError> {
        if self.fail.load(Ordering::Relaxed) {
            return Err(Box::new(std::io::Error::other("motor line stuck")));
        }
        if let Ok(mut w) = self.writes.lock() {
            w.push(on);
        }
        Ok(())
    }
}

/// Display root that records every mount.
#[derive(Debug, Clone, Default)]
pub struct RecordingDisplay {
    state: Arc<Mutex<(Option<ViewId>, Vec<Option<ViewId>>)>>,
}

impl RecordingDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<ViewId> {
        self.state.lock().ok().and_then(|s| s.0)
    }

    pub fn history(&self) -> Vec<Option<ViewId>> {
        self.state.lock().map(|s| s.1.clone()).unwrap_or_default()
    }
}

impl Display for RecordingDisplay {
    fn mounted(&self) -> Option<ViewId> {
        self.current()
    }

    fn mount(&mut self, view: Option<ViewId>) {
        if let Ok(mut s) = self.state.lock() {
            s.0 = view;
            s.1.push(view);
        }
    }
}
