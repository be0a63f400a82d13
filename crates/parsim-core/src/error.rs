//! Common error base.
//!
//! Sub-crates define their own error enums (`NetError`, `LaunchError`,
//! `CoordError`, …) and either convert into `CoreError` via `From` impls or
//! keep them separate.  Both patterns are acceptable; prefer whichever keeps
//! error sites clean.

use thiserror::Error;

/// The top-level error type for `parsim-core`.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shorthand result type for `parsim-core`.
pub type CoreResult<T> = Result<T, CoreError>;
