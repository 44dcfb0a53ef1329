//! Timed replay of touch and button input for the simulator.
//!
//! Events are applied when the replay clock passes their `at_ms` offset,
//! measured from the moment the replay was created. Once the last event is
//! `grace` in the past the optional shutdown flag is raised, so a scripted
//! session ends on its own.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use grinder_traits::{BoxError, Clock, DigitalInput, TouchPanel, TouchSample};

use crate::error::HwError;

/// Pressure used for scripted touches that do not give one.
pub const DEFAULT_PRESSURE: u32 = 40_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayKind {
    Touch { x: i32, y: i32, pressure: u32 },
    Release,
    ButtonDown,
    ButtonUp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayEvent {
    pub at_ms: u64,
    pub kind: ReplayKind,
}

#[derive(Debug)]
struct State {
    events: Vec<ReplayEvent>,
    next: usize,
    touch: Option<TouchSample>,
    button: bool,
}

/// Shared replay state; split into a touch panel and a button.
pub struct InputReplay {
    state: Arc<Mutex<State>>,
    clock: Arc<dyn Clock + Send + Sync>,
    epoch: Instant,
    grace: Duration,
    shutdown: Option<Arc<AtomicBool>>,
}

impl InputReplay {
    /// Events must be ordered by `at_ms`; out-of-order events are sorted.
    pub fn new(mut events: Vec<ReplayEvent>, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        events.sort_by_key(|e| e.at_ms);
        let epoch = clock.now();
        Self {
            state: Arc::new(Mutex::new(State {
                events,
                next: 0,
                touch: None,
                button: false,
            })),
            clock,
            epoch,
            grace: Duration::from_millis(500),
            shutdown: None,
        }
    }

    /// Time to keep running after the last event before raising `flag`.
    pub fn shutdown_after(mut self, grace: Duration, flag: Arc<AtomicBool>) -> Self {
        self.grace = grace;
        self.shutdown = Some(flag);
        self
    }

    pub fn split(self) -> (ReplayTouch, ReplayButton) {
        let shared = Arc::new(self);
        (
            ReplayTouch {
                replay: shared.clone(),
            },
            ReplayButton { replay: shared },
        )
    }

    fn advance(&self) -> Result<(Option<TouchSample>, bool), HwError> {
        let elapsed = self.clock.now().saturating_duration_since(self.epoch);
        let now_ms = elapsed.as_millis() as u64;
        let mut s = self
            .state
            .lock()
            .map_err(|_| HwError::Replay("state poisoned".into()))?;
        while let Some(ev) = s.events.get(s.next).copied() {
            if ev.at_ms > now_ms {
                break;
            }
            match ev.kind {
                ReplayKind::Touch { x, y, pressure } => {
                    s.touch = Some(TouchSample::new(x, y, pressure));
                }
                ReplayKind::Release => s.touch = None,
                ReplayKind::ButtonDown => s.button = true,
                ReplayKind::ButtonUp => s.button = false,
            }
            tracing::trace!(at_ms = ev.at_ms, kind = ?ev.kind, "replay event");
            s.next += 1;
        }
        if s.next == s.events.len()
            && let Some(flag) = &self.shutdown
        {
            let last = s.events.last().map_or(0, |e| e.at_ms);
            if now_ms >= last.saturating_add(self.grace.as_millis() as u64)
                && !flag.swap(true, Ordering::Relaxed)
            {
                tracing::info!(events = s.events.len(), "input replay finished");
            }
        }
        Ok((s.touch, s.button))
    }
}

pub struct ReplayTouch {
    replay: Arc<InputReplay>,
}

impl TouchPanel for ReplayTouch {
    fn sample(&mut self) -> Result<Option<TouchSample>, BoxError> {
        Ok(self.replay.advance()?.0)
    }
}

pub struct ReplayButton {
    replay: Arc<InputReplay>,
}

impl DigitalInput for ReplayButton {
    fn is_high(&mut self) -> Result<bool, BoxError> {
        Ok(self.replay.advance()?.1)
    }
}
