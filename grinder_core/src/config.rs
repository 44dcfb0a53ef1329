//! Runtime configuration for the controller.
//!
//! These are the structs screens and the poll loop read at runtime. They are
//! separate from the TOML-deserialized config in `grinder_config`.

use std::time::Duration;

/// Touch sampling and poll cadence.
#[derive(Debug, Clone)]
pub struct TouchCfg {
    /// A sample counts as a press only when its pressure is strictly above this.
    pub pressure_threshold: u32,
    /// Sleep between poll iterations (ms).
    pub poll_interval_ms: u64,
}

impl Default for TouchCfg {
    fn default() -> Self {
        Self {
            pressure_threshold: 30_000,
            poll_interval_ms: 5,
        }
    }
}

impl TouchCfg {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

/// Grind timing.
#[derive(Debug, Clone)]
pub struct TimingCfg {
    /// Motor-on time appended to every grind (ms). Must be >= 1.
    pub settle_delay_ms: u64,
    /// Longest grind the timer will accept (ms); longer requests are clamped.
    pub max_grind_ms: u64,
}

impl Default for TimingCfg {
    fn default() -> Self {
        Self {
            settle_delay_ms: 400,
            max_grind_ms: 60_000,
        }
    }
}

impl TimingCfg {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms.max(1))
    }

    pub fn max_grind(&self) -> Duration {
        Duration::from_millis(self.max_grind_ms)
    }
}

/// The two canned grind settings.
#[derive(Debug, Clone)]
pub struct ProfileCfg {
    pub single_g: u8,
    pub double_g: u8,
    pub max_g: u8,
    pub single_label: String,
    pub double_label: String,
    /// Select "single" at power-up instead of "double".
    pub start_single: bool,
}

impl Default for ProfileCfg {
    fn default() -> Self {
        Self {
            single_g: 9,
            double_g: 19,
            max_g: 30,
            single_label: "Single".to_string(),
            double_label: "Double".to_string(),
            start_single: false,
        }
    }
}

/// Two-stage calibration parameters. Weights are in grams.
#[derive(Debug, Clone)]
pub struct CalibrationCfg {
    pub reference_grind_s: f32,
    pub target_g: f32,
    pub default_measured_g: f32,
    pub min_measured_g: f32,
    pub max_measured_g: f32,
}

impl Default for CalibrationCfg {
    fn default() -> Self {
        Self {
            reference_grind_s: 6.0,
            target_g: 19.0,
            default_measured_g: 10.0,
            min_measured_g: 0.1,
            max_measured_g: 50.0,
        }
    }
}

impl CalibrationCfg {
    /// Measured-weight bounds in tenths of a gram.
    pub fn measured_bounds_tenths(&self) -> (i32, i32) {
        let lo = grams_to_tenths(self.min_measured_g).max(1);
        let hi = grams_to_tenths(self.max_measured_g).max(lo);
        (lo, hi)
    }

    pub fn default_measured_tenths(&self) -> i32 {
        let (lo, hi) = self.measured_bounds_tenths();
        grams_to_tenths(self.default_measured_g).clamp(lo, hi)
    }
}

/// Round grams to the nearest tenth of a gram. Non-finite input maps to 0.
#[inline]
pub fn grams_to_tenths(g: f32) -> i32 {
    if !g.is_finite() {
        return 0;
    }
    (g * 10.0).round().clamp(i32::MIN as f32, i32::MAX as f32) as i32
}

#[inline]
pub fn tenths_to_grams(t: i32) -> f32 {
    t as f32 / 10.0
}
