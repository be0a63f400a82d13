//! Launch-subsystem error type.

use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

/// Errors produced by `parsim-launch`.  All of them are fatal at startup.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error(transparent)]
    Core(#[from] parsim_core::CoreError),

    #[error("environment variable {0} is not set; it must point at the SUMO installation root")]
    MissingEnv(&'static str),

    #[error("{path}: {detail}")]
    Config { path: PathBuf, detail: String },

    #[error("XML error in {path}: {detail}")]
    Xml { path: PathBuf, detail: String },

    #[error("failed to start {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} failed with {status}")]
    Tool { tool: String, status: ExitStatus },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type LaunchResult<T> = Result<T, LaunchError>;
