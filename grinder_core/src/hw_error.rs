//! Maps `Box<dyn Error>` from trait boundaries to typed errors.
//!
//! The traits in `grinder_traits` use `Box<dyn Error + Send + Sync>`; this
//! module converts those to `GrinderError`/`StorageError`, with an optional
//! feature-gated path for `grinder_hardware::HwError` downcasting.

use crate::error::{GrinderError, StorageError};

/// Map a device-boundary error (touch, button, motor) to a typed `GrinderError`.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> GrinderError {
    #[cfg(feature = "hardware-errors")]
    {
        if let Some(hw) = e.downcast_ref::<grinder_hardware::error::HwError>() {
            return GrinderError::HardwareFault(hw.to_string());
        }
    }
    GrinderError::Hardware(e.to_string())
}

/// Map a rate-store error to a `StorageError`.
///
/// Stores may already speak `StorageError`; otherwise a missing file is
/// `Missing` and anything else is an I/O failure.
pub fn map_storage_error(e: &(dyn std::error::Error + 'static)) -> StorageError {
    if let Some(se) = e.downcast_ref::<StorageError>() {
        return se.clone();
    }
    if let Some(io) = e.downcast_ref::<std::io::Error>() {
        if io.kind() == std::io::ErrorKind::NotFound {
            return StorageError::Missing;
        }
        return StorageError::Io(io.to_string());
    }
    StorageError::Io(e.to_string())
}
