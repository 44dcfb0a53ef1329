//! Platform assembly for the CLI: picks the clock, devices and rate store.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use eyre::WrapErr;
use grinder_config::{Config, ScriptKind, ScriptRow};
use grinder_core::{FileRateStore, Platform, PlatformBuilder, TouchCfg};
use grinder_hardware::replay::DEFAULT_PRESSURE;
use grinder_hardware::{HeadlessDisplay, IdleTouch, InputReplay, ReplayEvent, ReplayKind};
use grinder_traits::{Clock, MonotonicClock, TestClock};

/// Set to `1` to run on virtual time: every sleep returns immediately.
pub const SIM_FAST_ENV: &str = "GRINDER_SIM_FAST";

/// Keep polling this long after the last scripted event.
const REPLAY_GRACE: Duration = Duration::from_millis(500);

pub fn sim_fast() -> bool {
    std::env::var(SIM_FAST_ENV).is_ok_and(|v| v == "1")
}

pub fn make_clock() -> Arc<dyn Clock + Send + Sync> {
    if sim_fast() {
        tracing::debug!("virtual clock");
        Arc::new(TestClock::new())
    } else {
        Arc::new(MonotonicClock::new())
    }
}

/// Human name of the compiled device backend.
pub fn backend_name() -> &'static str {
    if cfg!(all(feature = "hardware", target_os = "linux")) {
        "gpio"
    } else {
        "simulated"
    }
}

fn to_event(row: &ScriptRow) -> ReplayEvent {
    let kind = match row.kind {
        ScriptKind::Touch => ReplayKind::Touch {
            x: row.x.unwrap_or_default(),
            y: row.y.unwrap_or_default(),
            pressure: row.pressure.unwrap_or(DEFAULT_PRESSURE),
        },
        ScriptKind::Release => ReplayKind::Release,
        ScriptKind::ButtonDown => ReplayKind::ButtonDown,
        ScriptKind::ButtonUp => ReplayKind::ButtonUp,
    };
    ReplayEvent {
        at_ms: row.at_ms,
        kind,
    }
}

pub fn load_replay(path: &Path) -> eyre::Result<Vec<ReplayEvent>> {
    let rows = grinder_config::load_input_script(path)?;
    tracing::info!(events = rows.len(), script = %path.display(), "input script loaded");
    Ok(rows.iter().map(to_event).collect())
}

fn base_builder(cfg: &Config, clock: Arc<dyn Clock + Send + Sync>, shutdown: Arc<AtomicBool>) -> PlatformBuilder {
    Platform::builder()
        .with_display(HeadlessDisplay::new())
        .with_store(FileRateStore::new(&cfg.storage.rate_file))
        .with_clock(clock)
        .with_touch_cfg(TouchCfg::from(&cfg.touch))
        .with_shutdown(shutdown)
}

/// Build the platform. With `script`, touch and button input are replayed
/// from the CSV and `shutdown` is raised once the script has played out.
pub fn build_platform(
    cfg: &Config,
    script: Option<&Path>,
    shutdown: Arc<AtomicBool>,
) -> eyre::Result<Platform> {
    let clock = make_clock();
    let builder = base_builder(cfg, clock.clone(), shutdown.clone());
    let builder = attach_motor(builder, cfg)?;

    let builder = match script {
        Some(path) => {
            let events = load_replay(path).wrap_err("load input script")?;
            let (touch, button) = InputReplay::new(events, clock)
                .shutdown_after(REPLAY_GRACE, shutdown)
                .split();
            builder.with_touch(touch).with_button(button)
        }
        None => attach_button(builder.with_touch(IdleTouch), cfg)?,
    };
    builder.try_build().wrap_err("assemble platform")
}

#[cfg(all(feature = "hardware", target_os = "linux"))]
fn hw_fault(e: grinder_hardware::error::HwError) -> eyre::Report {
    eyre::Report::new(grinder_core::GrinderError::HardwareFault(e.to_string()))
}

#[cfg(all(feature = "hardware", target_os = "linux"))]
fn attach_motor(builder: PlatformBuilder, cfg: &Config) -> eyre::Result<PlatformBuilder> {
    use grinder_hardware::gpio;
    let gpio = gpio::open().map_err(hw_fault)?;
    let motor = gpio::GpioMotor::new(&gpio, cfg.pins.motor_enable).map_err(hw_fault)?;
    tracing::info!(pin = cfg.pins.motor_enable, "motor enable on gpio");
    Ok(builder.with_motor(motor))
}

#[cfg(all(feature = "hardware", target_os = "linux"))]
fn attach_button(builder: PlatformBuilder, cfg: &Config) -> eyre::Result<PlatformBuilder> {
    use grinder_hardware::gpio;
    let gpio = gpio::open().map_err(hw_fault)?;
    let button = gpio::GpioButton::new(&gpio, cfg.pins.grind_button).map_err(hw_fault)?;
    Ok(builder.with_button(button))
}

#[cfg(not(all(feature = "hardware", target_os = "linux")))]
fn attach_motor(builder: PlatformBuilder, _cfg: &Config) -> eyre::Result<PlatformBuilder> {
    Ok(builder.with_motor(grinder_hardware::SimulatedMotor::new()))
}

#[cfg(not(all(feature = "hardware", target_os = "linux")))]
fn attach_button(builder: PlatformBuilder, _cfg: &Config) -> eyre::Result<PlatformBuilder> {
    Ok(builder.with_button(grinder_hardware::SimulatedButton::new()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touch_rows_default_pressure() {
        let row = ScriptRow {
            at_ms: 10,
            kind: ScriptKind::Touch,
            x: Some(5),
            y: Some(6),
            pressure: None,
        };
        assert_eq!(
            to_event(&row).kind,
            ReplayKind::Touch {
                x: 5,
                y: 6,
                pressure: DEFAULT_PRESSURE
            }
        );
    }

    #[test]
    fn button_rows_map_directly() {
        let row = ScriptRow {
            at_ms: 300,
            kind: ScriptKind::ButtonDown,
            x: None,
            y: None,
            pressure: None,
        };
        let ev = to_event(&row);
        assert_eq!(ev.at_ms, 300);
        assert_eq!(ev.kind, ReplayKind::ButtonDown);
    }
}
