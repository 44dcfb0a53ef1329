mod cli;
mod devices;
mod error_fmt;

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use eyre::WrapErr;
use grinder_config::Config;
use grinder_core::{
    CalibrationCfg, GrindPlan, GrindScreen, GrinderError, MainScreen, Platform, ProfileCfg,
    SetupScreen, Splash, TimingCfg, run_appliance, run_headless,
};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

use crate::cli::{Cli, Commands, FILE_GUARD, JSON_MODE};
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);
    if let Err(e) = color_eyre::install() {
        eprintln!("warning: could not install error report handler: {e}");
    }

    if let Err(err) = run(cli) {
        if JSON_MODE.get().copied().unwrap_or(false) {
            eprintln!("{}", format_error_json(&err));
        } else {
            eprintln!("{}", humanize(&err));
        }
        tracing::debug!(error = ?err, "command failed");
        std::process::exit(exit_code_for_error(&err));
    }
}

fn load_config(path: &Path) -> eyre::Result<Config> {
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("read config {}", path.display()))?;
    let cfg = grinder_config::load_toml(&text)
        .map_err(|e| eyre::Report::new(GrinderError::Config(e.to_string())))
        .wrap_err("parse config")?;
    cfg.validate()
        .map_err(|e| eyre::Report::new(GrinderError::Config(e.to_string())))
        .wrap_err("invalid configuration")?;
    Ok(cfg)
}

fn init_tracing(cfg: &Config, cli_level: Option<&str>, json: bool) -> eyre::Result<()> {
    let level = cli_level
        .or(cfg.logging.level.as_deref())
        .unwrap_or("info");
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .wrap_err_with(|| format!("invalid log level {level:?}"))?;

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();
    if json {
        layers.push(fmt::layer().json().with_writer(std::io::stderr).boxed());
    } else {
        layers.push(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .boxed(),
        );
    }

    if let Some(file) = cfg.logging.file.as_deref() {
        let path = Path::new(file);
        let dir = path
            .parent()
            .filter(|d| !d.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let name = path
            .file_name()
            .ok_or_else(|| eyre::eyre!("logging.file has no file name: {file}"))?;
        let appender = match cfg.logging.rotation.as_deref() {
            Some("daily") => tracing_appender::rolling::daily(dir, name),
            Some("hourly") => tracing_appender::rolling::hourly(dir, name),
            _ => tracing_appender::rolling::never(dir, name),
        };
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = FILE_GUARD.set(guard);
        layers.push(
            fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(writer)
                .boxed(),
        );
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()
        .map_err(|e| eyre::eyre!("init tracing: {e}"))
}

fn run(cli: Cli) -> eyre::Result<()> {
    let cfg = load_config(&cli.config)?;
    init_tracing(&cfg, cli.log_level.as_deref(), cli.json)?;
    tracing::debug!(config = %cli.config.display(), backend = devices::backend_name(), "config loaded");

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let flag = shutdown.clone();
        ctrlc::set_handler(move || {
            flag.store(true, Ordering::Relaxed);
        })
        .wrap_err("install Ctrl-C handler")?;
    }

    let mut p = devices::build_platform(&cfg, cli.sim_script.as_deref(), shutdown)?;
    let timing = TimingCfg::from(&cfg.timing);
    let calibration = CalibrationCfg::from(&cfg.calibration);

    match cli.cmd {
        Commands::Run => {
            let mut main = MainScreen::new(&ProfileCfg::from(&cfg.profiles), &calibration, &timing);
            let splash = Splash::new();
            run_appliance(&mut main, &splash, &mut p)?;
            tracing::info!("appliance stopped");
            Ok(())
        }
        Commands::Grind { grams } => grind(&mut p, &timing, grams, cli.json),
        Commands::Calibrate { measured } => {
            calibrate(&mut p, &calibration, &timing, measured, cli.json)
        }
        Commands::Rate => {
            let rate = p.load_rate().map_err(GrinderError::from)?;
            if cli.json {
                println!("{}", serde_json::json!({ "rate_s_per_g": rate }));
            } else {
                println!("{rate:.6} s/g");
            }
            Ok(())
        }
        Commands::SelfCheck => self_check(&mut p, &cfg, cli.json),
    }
}

fn grind(p: &mut Platform, timing: &TimingCfg, grams: f32, json: bool) -> eyre::Result<()> {
    if !grams.is_finite() || grams < 0.0 {
        eyre::bail!("--grams must be a non-negative number, got {grams}");
    }
    let mut screen = GrindScreen::new(timing);
    match screen.grind_grams(grams, p)? {
        GrindPlan::Started {
            rate_s_per_g,
            duration_s,
        } => {
            run_headless(&mut screen, p)?;
            if !screen.completed() {
                eyre::bail!("grind interrupted");
            }
            if json {
                println!(
                    "{}",
                    serde_json::json!({
                        "grams": grams,
                        "rate_s_per_g": rate_s_per_g,
                        "duration_s": duration_s,
                        "completed": true,
                    })
                );
            } else {
                println!("Ground {grams} g in {duration_s:.2} s (rate {rate_s_per_g:.6} s/g)");
            }
            Ok(())
        }
        GrindPlan::Nothing => {
            if json {
                println!("{}", serde_json::json!({ "grams": grams, "completed": false }));
            } else {
                println!("Nothing to grind");
            }
            Ok(())
        }
        GrindPlan::RateUnavailable(e) => Err(eyre::Report::new(GrinderError::Storage(e))),
    }
}

fn calibrate(
    p: &mut Platform,
    cfg: &CalibrationCfg,
    timing: &TimingCfg,
    measured: f32,
    json: bool,
) -> eyre::Result<()> {
    if !measured.is_finite() || measured <= 0.0 {
        eyre::bail!("--measured must be a positive weight in grams, got {measured}");
    }
    let mut screen = SetupScreen::new(cfg, timing).with_autorun(measured);
    run_headless(&mut screen, p)?;
    if let Some(e) = screen.last_error() {
        return Err(eyre::Report::new(GrinderError::Storage(e.clone())));
    }
    let Some(rate) = screen.last_rate() else {
        eyre::bail!("calibration interrupted before the rate was saved");
    };
    if json {
        println!(
            "{}",
            serde_json::json!({ "measured_g": screen.measured_g(), "rate_s_per_g": rate })
        );
    } else {
        println!("Calibration complete: rate {rate:.6} s/g");
    }
    Ok(())
}

fn self_check(p: &mut Platform, cfg: &Config, json: bool) -> eyre::Result<()> {
    let rate = p.load_rate();
    if json {
        println!(
            "{}",
            serde_json::json!({
                "config": "ok",
                "backend": devices::backend_name(),
                "rate_file": cfg.storage.rate_file,
                "rate_s_per_g": rate.as_ref().ok(),
                "rate_error": rate.as_ref().err().map(ToString::to_string),
            })
        );
    } else {
        println!("config: OK");
        println!("backend: {}", devices::backend_name());
        match rate {
            Ok(r) => println!("rate: {r:.6} s/g ({})", cfg.storage.rate_file),
            Err(e) => println!("rate: {e} ({})", cfg.storage.rate_file),
        }
    }
    Ok(())
}
