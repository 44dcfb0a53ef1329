use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GrinderError {
    #[error("hardware error: {0}")]
    Hardware(String),
    #[error("hardware fault: {0}")]
    HardwareFault(String),
    #[error("rate storage: {0}")]
    Storage(#[from] StorageError),
    #[error("screen stack full: only one screen may be shown over the base screen")]
    ScreenStackFull,
    #[error("configuration error: {0}")]
    Config(String),
}

/// Why the persisted rate could not be used.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StorageError {
    #[error("no calibrated rate stored yet")]
    Missing,
    #[error("stored rate is unreadable: {0}")]
    Corrupt(String),
    #[error("rate storage i/o failed: {0}")]
    Io(String),
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing touch panel")]
    MissingTouch,
    #[error("missing grind button input")]
    MissingButton,
    #[error("missing motor enable output")]
    MissingMotor,
    #[error("missing display")]
    MissingDisplay,
    #[error("missing rate store")]
    MissingStore,
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
