//! Coordination-subsystem error type.

use parsim_core::PartitionId;
use parsim_traci::TraciError;
use thiserror::Error;

/// Errors produced by `parsim-coord`.
///
/// Transient vehicle-state errors never surface here — the border handlers
/// swallow them (see [`TraciError::is_transient`]); everything below is fatal
/// to the run.
#[derive(Debug, Error)]
pub enum CoordError {
    #[error("coordinator configuration error: {0}")]
    Config(String),

    #[error("partition {0} has no connected client")]
    NotConnected(PartitionId),

    #[error("partition {id}: simulator never became reachable: {source}")]
    Connect {
        id: PartitionId,
        #[source]
        source: TraciError,
    },

    #[error("simulator client error: {0}")]
    Client(#[from] TraciError),

    #[error("simulator endpoint error: {0}")]
    Endpoint(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("failed to spawn worker thread: {0}")]
    Io(#[from] std::io::Error),

    #[error("partition {0} worker panicked")]
    WorkerPanicked(PartitionId),
}

impl CoordError {
    /// Wrap an endpoint implementation's own error type.
    pub fn endpoint(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        CoordError::Endpoint(Box::new(error))
    }
}

pub type CoordResult<T> = Result<T, CoordError>;
