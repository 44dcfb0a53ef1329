//! Persisted rate: one seconds-per-gram value, newline-terminated, no versioning.

use std::path::{Path, PathBuf};

use grinder_traits::{BoxError, RateStore};

use crate::atomic::write_atomic;
use crate::error::StorageError;

/// Render a rate the way it is stored on disk.
pub fn format_rate(rate_s_per_g: f32) -> String {
    format!("{rate_s_per_g:.6}\n")
}

/// Parse the first line of a rate file. The value must be finite and > 0.
pub fn parse_rate(text: &str) -> Result<f32, StorageError> {
    let line = text.lines().next().unwrap_or("").trim();
    if line.is_empty() {
        return Err(StorageError::Corrupt("empty rate file".to_string()));
    }
    let rate: f32 = line
        .parse()
        .map_err(|e| StorageError::Corrupt(format!("{line:?}: {e}")))?;
    check_rate(rate)
}

/// Reject rates that would turn into a nonsensical grind duration.
pub fn check_rate(rate: f32) -> Result<f32, StorageError> {
    if !rate.is_finite() || rate <= 0.0 {
        return Err(StorageError::Corrupt(format!(
            "rate must be a positive number of seconds per gram, got {rate}"
        )));
    }
    Ok(rate)
}

/// Rate stored in a text file, replaced atomically on save.
#[derive(Debug, Clone)]
pub struct FileRateStore {
    path: PathBuf,
}

impl FileRateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RateStore for FileRateStore {
    fn load(&mut self) -> Result<f32, BoxError> {
        let text = std::fs::read_to_string(&self.path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::Missing
            } else {
                StorageError::Io(format!("read {}: {e}", self.path.display()))
            }
        })?;
        let rate = parse_rate(&text)?;
        tracing::debug!(rate, path = %self.path.display(), "rate loaded");
        Ok(rate)
    }

    fn save(&mut self, rate_s_per_g: f32) -> Result<(), BoxError> {
        check_rate(rate_s_per_g)?;
        write_atomic(&self.path, format_rate(rate_s_per_g).as_bytes())
            .map_err(|e| StorageError::Io(format!("write {}: {e}", self.path.display())))?;
        Ok(())
    }
}
