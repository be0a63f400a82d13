//! Network-subsystem error type.

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by `parsim-net`.
#[derive(Debug, Error)]
pub enum NetError {
    #[error("XML error: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("{path}: missing <{element}> element")]
    MissingElement { path: PathBuf, element: &'static str },

    #[error("{path}: <{element}> is missing attribute '{attribute}'")]
    MissingAttribute {
        path: PathBuf,
        element: &'static str,
        attribute: &'static str,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type NetResult<T> = Result<T, NetError>;
