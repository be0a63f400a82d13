//! The external-collaborator seam: how a partition's simulator is started
//! and connected to.

use parsim_core::PartitionId;
use parsim_traci::{TraciClient, TraciResult};

use crate::error::CoordResult;

/// Supplies each partition with a running simulator and a connected client.
///
/// Production implementations spawn a SUMO process per partition
/// (`parsim-launch` provides the spawn helper) and open a TraCI TCP
/// connection with the external client library; tests and demos hand out
/// pre-configured [`MockSimulator`](parsim_traci::MockSimulator)s.
pub trait SimulatorEndpoint: Sync {
    type Client: TraciClient;

    /// Start the partition's simulator process.
    ///
    /// Called once per partition before any connection attempt.  The default
    /// is a no-op for endpoints whose simulators need no launching.
    fn launch(&self, _id: PartitionId) -> CoordResult<()> {
        Ok(())
    }

    /// Open a connection to the partition's simulator.
    ///
    /// A [`TraciError::Connect`](parsim_traci::TraciError::Connect) result is
    /// retried with backoff while the simulator is still starting up; any
    /// other error aborts the worker.
    fn connect(&self, id: PartitionId) -> TraciResult<Self::Client>;
}
