#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema and simulator input scripts for the grinder controller.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - The input script loader enforces headers and ordering so a replayed
//!   touch/button session behaves the same on every run.
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Pins {
    /// Output line that enables the grinder motor
    pub motor_enable: u8,
    /// Momentary grind button (pulled down, high when pressed)
    pub grind_button: u8,
}

impl Default for Pins {
    fn default() -> Self {
        Self {
            motor_enable: 3,
            grind_button: 4,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TouchCfg {
    /// Samples at or below this raw pressure count as "not touching"
    pub pressure_threshold: u32,
    /// Sleep between poll iterations (ms)
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

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TimingCfg {
    /// Extra motor-on time appended to every grind (ms)
    pub settle_delay_ms: u64,
    /// Upper bound on any single grind (ms); longer requests are clamped
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

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DefaultProfile {
    Single,
    #[default]
    Double,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ProfilesCfg {
    pub single_g: u8,
    pub double_g: u8,
    /// Upper clamp for both profiles
    pub max_g: u8,
    pub single_label: String,
    pub double_label: String,
    /// Profile selected at power-up
    pub default: DefaultProfile,
}

impl Default for ProfilesCfg {
    fn default() -> Self {
        Self {
            single_g: 9,
            double_g: 19,
            max_g: 30,
            single_label: "Single".to_string(),
            double_label: "Double".to_string(),
            default: DefaultProfile::Double,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CalibrationCfg {
    /// Fixed duration of the stage-0 reference grind (s)
    pub reference_grind_s: f32,
    /// Weight the corrective stage tops up to (g)
    pub target_g: f32,
    /// Measured-weight value shown when stage 1 opens (g)
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

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Storage {
    /// Text file holding the persisted rate (seconds per gram)
    pub rate_file: String,
}

impl Default for Storage {
    fn default() -> Self {
        Self {
            rate_file: "/rate.txt".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub pins: Pins,
    #[serde(default)]
    pub touch: TouchCfg,
    #[serde(default)]
    pub timing: TimingCfg,
    #[serde(default)]
    pub profiles: ProfilesCfg,
    #[serde(default)]
    pub calibration: CalibrationCfg,
    #[serde(default)]
    pub storage: Storage,
    #[serde(default)]
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Pins
        if self.pins.motor_enable == self.pins.grind_button {
            eyre::bail!("pins.motor_enable and pins.grind_button must differ");
        }

        // Touch
        if self.touch.pressure_threshold == 0 {
            eyre::bail!("touch.pressure_threshold must be > 0");
        }
        if self.touch.poll_interval_ms == 0 {
            eyre::bail!("touch.poll_interval_ms must be >= 1");
        }
        if self.touch.poll_interval_ms > 1000 {
            eyre::bail!("touch.poll_interval_ms is unreasonably large (>1s)");
        }

        // Timing
        if self.timing.settle_delay_ms == 0 {
            eyre::bail!("timing.settle_delay_ms must be >= 1");
        }
        if self.timing.settle_delay_ms > 10_000 {
            eyre::bail!("timing.settle_delay_ms is unreasonably large (>10s)");
        }
        if self.timing.max_grind_ms == 0 {
            eyre::bail!("timing.max_grind_ms must be >= 1");
        }
        if self.timing.max_grind_ms > 10 * 60 * 1000 {
            eyre::bail!("timing.max_grind_ms is unreasonably large (>10min)");
        }

        // Profiles
        if self.profiles.max_g == 0 {
            eyre::bail!("profiles.max_g must be >= 1");
        }
        if self.profiles.single_g > self.profiles.max_g {
            eyre::bail!("profiles.single_g must be <= profiles.max_g");
        }
        if self.profiles.double_g > self.profiles.max_g {
            eyre::bail!("profiles.double_g must be <= profiles.max_g");
        }
        if self.profiles.single_label.trim().is_empty()
            || self.profiles.double_label.trim().is_empty()
        {
            eyre::bail!("profiles labels must not be empty");
        }

        // Calibration
        let c = &self.calibration;
        if !(c.reference_grind_s.is_finite() && c.reference_grind_s > 0.0) {
            eyre::bail!("calibration.reference_grind_s must be > 0.0");
        }
        if c.reference_grind_s > 60.0 {
            eyre::bail!("calibration.reference_grind_s is unreasonably large (>60s)");
        }
        if !(c.target_g.is_finite() && c.target_g > 0.0) {
            eyre::bail!("calibration.target_g must be > 0.0");
        }
        if !(c.min_measured_g.is_finite() && c.min_measured_g >= 0.1) {
            eyre::bail!("calibration.min_measured_g must be >= 0.1");
        }
        if !(c.max_measured_g.is_finite() && c.max_measured_g > c.min_measured_g) {
            eyre::bail!("calibration.max_measured_g must be > calibration.min_measured_g");
        }
        if !(c.min_measured_g..=c.max_measured_g).contains(&c.default_measured_g) {
            eyre::bail!(
                "calibration.default_measured_g must be within [min_measured_g, max_measured_g]"
            );
        }

        // Storage
        if self.storage.rate_file.trim().is_empty() {
            eyre::bail!("storage.rate_file must not be empty");
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly");
        }

        Ok(())
    }
}

/// Kind of a scripted input event replayed by the simulator.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScriptKind {
    /// Finger down (or moved) at (x, y)
    Touch,
    /// Finger lifted
    Release,
    ButtonDown,
    ButtonUp,
}

/// Input script CSV schema.
///
/// Expected headers:
/// at_ms,kind,x,y,pressure
///
/// Example:
/// at_ms,kind,x,y,pressure
/// 100,touch,230,210,40000
/// 150,release,,,
/// 300,button_down,,,
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct ScriptRow {
    pub at_ms: u64,
    pub kind: ScriptKind,
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub pressure: Option<u32>,
}

pub fn load_input_script(path: &std::path::Path) -> eyre::Result<Vec<ScriptRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| eyre::eyre!("open input script {:?}: {}", path, e))?;

    // Enforce exact headers
    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read CSV headers {:?}: {}", path, e))?
        .clone();
    let expected = ["at_ms", "kind", "x", "y", "pressure"];
    let actual: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
    if actual != expected {
        eyre::bail!(
            "input script must have headers 'at_ms,kind,x,y,pressure', got: {}",
            actual.join(",")
        );
    }

    let mut rows: Vec<ScriptRow> = Vec::new();
    for (idx, rec) in rdr.deserialize::<ScriptRow>().enumerate() {
        let line = idx + 2;
        let row = rec.map_err(|e| eyre::eyre!("invalid script row {}: {}", line, e))?;
        if row.kind == ScriptKind::Touch && (row.x.is_none() || row.y.is_none()) {
            eyre::bail!("script row {} is a touch without x/y", line);
        }
        if let Some(prev) = rows.last()
            && row.at_ms < prev.at_ms
        {
            eyre::bail!(
                "script rows must be ordered by at_ms (row {} goes back in time)",
                line
            );
        }
        rows.push(row);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let cfg = load_toml("").expect("empty TOML parses");
        assert_eq!(cfg.touch.pressure_threshold, 30_000);
        assert_eq!(cfg.timing.settle_delay_ms, 400);
        assert_eq!(cfg.profiles.default, DefaultProfile::Double);
        cfg.validate().expect("defaults are valid");
    }

    #[test]
    fn rejects_unknown_default_profile() {
        let res = load_toml("[profiles]\ndefault = \"triple\"\n");
        assert!(res.is_err());
    }
}
