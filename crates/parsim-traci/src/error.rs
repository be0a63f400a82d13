//! TraCI error taxonomy.

use thiserror::Error;

/// Errors produced by a [`TraciClient`](crate::TraciClient) implementation.
///
/// The three vehicle/route-addressed variants form the *transient* class
/// ([`is_transient`](Self::is_transient)): they mean the addressed object was
/// gone (or already there) by the time the command arrived, which is an
/// expected race between partitions, not a fault.
#[derive(Debug, Error)]
pub enum TraciError {
    /// The addressed vehicle has left the simulation or was never inserted.
    #[error("vehicle '{0}' is not known to the simulator")]
    VehicleMissing(String),

    /// Insertion failed because the vehicle already exists.
    #[error("vehicle '{0}' already exists in the simulator")]
    VehicleExists(String),

    /// The addressed route is not defined in this simulator.
    #[error("route '{0}' is not known to the simulator")]
    RouteMissing(String),

    /// The simulator is not (yet) accepting connections.
    #[error("cannot connect to simulator at {host}:{port}: {source}")]
    Connect {
        host: String,
        port: u16,
        source: std::io::Error,
    },

    /// The connection dropped mid-command.
    #[error("I/O error on simulator connection: {0}")]
    Io(#[from] std::io::Error),

    /// The simulator rejected a command for any other reason.
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl TraciError {
    /// Whether this error belongs to the transient vehicle-state class the
    /// coordination layer swallows (per-vehicle, expected to race).
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            TraciError::VehicleMissing(_)
                | TraciError::VehicleExists(_)
                | TraciError::RouteMissing(_)
        )
    }
}

/// Shorthand result type for TraCI operations.
pub type TraciResult<T> = Result<T, TraciError>;
