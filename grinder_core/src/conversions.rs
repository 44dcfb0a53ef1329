//! `From` implementations bridging `grinder_config` types to `grinder_core` types.

use grinder_config::DefaultProfile;

use crate::config::{CalibrationCfg, ProfileCfg, TimingCfg, TouchCfg};

// ── TouchCfg ─────────────────────────────────────────────────────────────────

impl From<&grinder_config::TouchCfg> for TouchCfg {
    fn from(c: &grinder_config::TouchCfg) -> Self {
        Self {
            pressure_threshold: c.pressure_threshold,
            poll_interval_ms: c.poll_interval_ms,
        }
    }
}

// ── TimingCfg ────────────────────────────────────────────────────────────────

impl From<&grinder_config::TimingCfg> for TimingCfg {
    fn from(c: &grinder_config::TimingCfg) -> Self {
        Self {
            settle_delay_ms: c.settle_delay_ms,
            max_grind_ms: c.max_grind_ms,
        }
    }
}

// ── ProfileCfg ───────────────────────────────────────────────────────────────

impl From<&grinder_config::ProfilesCfg> for ProfileCfg {
    fn from(c: &grinder_config::ProfilesCfg) -> Self {
        Self {
            single_g: c.single_g,
            double_g: c.double_g,
            max_g: c.max_g,
            single_label: c.single_label.clone(),
            double_label: c.double_label.clone(),
            start_single: c.default == DefaultProfile::Single,
        }
    }
}

// ── CalibrationCfg ───────────────────────────────────────────────────────────

impl From<&grinder_config::CalibrationCfg> for CalibrationCfg {
    fn from(c: &grinder_config::CalibrationCfg) -> Self {
        Self {
            reference_grind_s: c.reference_grind_s,
            target_g: c.target_g,
            default_measured_g: c.default_measured_g,
            min_measured_g: c.min_measured_g,
            max_measured_g: c.max_measured_g,
        }
    }
}
