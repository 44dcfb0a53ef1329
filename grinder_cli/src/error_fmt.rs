//! Human-readable error descriptions and structured JSON error formatting.

use grinder_core::error::{BuildError, GrinderError, StorageError};

fn storage_error(err: &eyre::Report) -> Option<&StorageError> {
    if let Some(GrinderError::Storage(se)) = err.downcast_ref::<GrinderError>() {
        return Some(se);
    }
    err.downcast_ref::<StorageError>()
}

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    if let Some(se) = storage_error(err) {
        return match se {
            StorageError::Missing => {
                "What happened: No calibrated rate is stored yet.\nLikely causes: Calibration has never completed on this unit, or storage.rate_file points somewhere else.\nHow to fix: Run `grinder calibrate --measured <grams>` (or the Setup screen), then grind again.".to_string()
            }
            StorageError::Corrupt(msg) => format!(
                "What happened: No calibrated rate could be used ({msg}).\nLikely causes: The rate file was edited by hand or truncated.\nHow to fix: Recalibrate to rewrite the rate file."
            ),
            StorageError::Io(msg) => format!(
                "What happened: The rate file could not be accessed ({msg}).\nLikely causes: Missing directory or insufficient permissions for storage.rate_file.\nHow to fix: Check the path in [storage] and its permissions."
            ),
        };
    }

    if let Some(be) = err.downcast_ref::<BuildError>() {
        return format!(
            "What happened: The platform could not be assembled ({be}).\nLikely causes: A device failed to initialize and was not wired into the builder.\nHow to fix: Check the [pins] section and the device wiring."
        );
    }

    if let Some(ge) = err.downcast_ref::<GrinderError>() {
        return match ge {
            GrinderError::Hardware(msg) | GrinderError::HardwareFault(msg) => format!(
                "What happened: A device stopped responding ({msg}).\nLikely causes: Loose wiring, wrong pin numbers, or missing GPIO permissions.\nHow to fix: Check [pins] in the config and the wiring; the motor line was driven low."
            ),
            GrinderError::Config(msg) => format!(
                "What happened: Configuration is invalid ({msg}).\nLikely causes: A typo or an out-of-range value in the TOML.\nHow to fix: Edit the config file and try again."
            ),
            GrinderError::ScreenStackFull => {
                "What happened: A screen tried to open on top of an overlay.\nLikely causes: Only one screen may be shown over the main screen.\nHow to fix: This is a bug; re-run with --log-level=debug and report the log.".to_string()
            }
            other => format!(
                "What happened: {other}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    let msg = err.to_string();
    let lower = err
        .chain()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(": ")
        .to_ascii_lowercase();

    if lower.contains("input script must have headers") {
        return "Invalid headers in input script. Expected 'at_ms,kind,x,y,pressure'.".to_string();
    }

    if lower.contains("read config") {
        let cause = err.root_cause().to_string();
        return format!(
            "What happened: The config file could not be read ({cause}).\nLikely causes: Wrong --config path.\nHow to fix: Pass --config <FILE> pointing at a grinder TOML."
        );
    }

    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes per error kind.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if storage_error(err).is_some() {
        return 3;
    }
    if err.downcast_ref::<BuildError>().is_some() {
        return 4;
    }
    match err.downcast_ref::<GrinderError>() {
        Some(GrinderError::Hardware(_) | GrinderError::HardwareFault(_)) => 4,
        Some(GrinderError::ScreenStackFull) => 5,
        _ => 1,
    }
}

fn reason_name(err: &eyre::Report) -> &'static str {
    if let Some(se) = storage_error(err) {
        return match se {
            StorageError::Missing => "RateMissing",
            StorageError::Corrupt(_) => "RateCorrupt",
            StorageError::Io(_) => "RateIo",
        };
    }
    if err.downcast_ref::<BuildError>().is_some() {
        return "Build";
    }
    match err.downcast_ref::<GrinderError>() {
        Some(GrinderError::Hardware(_) | GrinderError::HardwareFault(_)) => "Hardware",
        Some(GrinderError::ScreenStackFull) => "ScreenStackFull",
        Some(GrinderError::Config(_)) => "Config",
        _ => "Error",
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    serde_json::json!({
        "reason": reason_name(err),
        "exit_code": exit_code_for_error(err),
        "message": humanize(err),
    })
    .to_string()
}
