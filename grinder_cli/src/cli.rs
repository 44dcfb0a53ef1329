//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "grinder", version, about = "Grinder controller CLI")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/grinder.toml")]
    pub config: PathBuf,

    /// Replay touch/button input from a CSV script (simulator only)
    #[arg(long = "sim-script", value_name = "CSV")]
    pub sim_script: Option<PathBuf>,

    /// Log as JSON lines instead of pretty; command output becomes JSON too
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); overrides [logging].level
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the appliance UI until Ctrl-C (or until the input script ends)
    Run,
    /// Grind a given weight using the persisted rate
    Grind {
        /// Grams to grind
        #[arg(long)]
        grams: f32,
    },
    /// Run the two-stage calibration unattended
    Calibrate {
        /// Weight of the reference grind as measured on a scale (grams)
        #[arg(long, value_name = "GRAMS")]
        measured: f32,
    },
    /// Print the persisted rate
    Rate,
    /// Quick health check (config, platform, stored rate)
    SelfCheck,
}
