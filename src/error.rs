use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("A config named '{0}' already exists")]
    DuplicateName(String),

    #[error("Config name must not be empty")]
    EmptyName,

    #[error("No config named '{0}'")]
    UnknownConfig(String),

    #[error("Step index {index} out of range ({len} steps)")]
    StepIndex { index: usize, len: usize },

    #[error("Corrupt configuration store {}: {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PlaybackError {
    #[error("No target window selected")]
    NoTargetWindow,

    #[error("Target window not found: {0}")]
    WindowNotFound(String),

    #[error("A run is already in progress")]
    AlreadyRunning,

    #[error("Playback of '{0}' ended unexpectedly")]
    Aborted(String),
}
