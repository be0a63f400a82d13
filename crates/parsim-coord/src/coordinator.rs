//! The coordinator: builds the partition set and runs the worker threads.

use std::thread;

use parsim_core::{PartitionId, SimTime};
use parsim_net::{BorderEdge, PartitionBorders};

use crate::endpoint::SimulatorEndpoint;
use crate::error::{CoordError, CoordResult};
use crate::observer::{NoopObserver, RunObserver};
use crate::partition::Partition;
use crate::set::PartitionSet;
use crate::worker::run_partition;

/// Owns the partitions and drives a complete run.
///
/// Construction distributes the border-edge index over the partitions; `run`
/// spawns one OS thread per partition, each talking to its own simulator,
/// and joins them all.  The calling thread is idle for the duration.
pub struct Coordinator<E: SimulatorEndpoint> {
    set: PartitionSet<E::Client>,
    endpoint: E,
}

impl<E: SimulatorEndpoint> Coordinator<E> {
    /// Build a coordinator for `partitions` partitions ending at `end_time`.
    ///
    /// Fails fast when a border edge references a partition that does not
    /// exist or has both sides in the same partition.
    pub fn new(
        partitions: usize,
        end_time: SimTime,
        borders: &[BorderEdge],
        endpoint: E,
    ) -> CoordResult<Self> {
        if partitions == 0 {
            return Err(CoordError::Config("at least one partition required".into()));
        }
        for edge in borders {
            if edge.from == edge.to {
                return Err(CoordError::Config(format!(
                    "border edge '{}' has both sides in {}",
                    edge.id, edge.from
                )));
            }
            for side in [edge.from, edge.to] {
                if side.index() >= partitions {
                    return Err(CoordError::Config(format!(
                        "border edge '{}' references {side}, but only {partitions} \
                         partitions exist",
                        edge.id
                    )));
                }
            }
        }

        let per_partition = PartitionBorders::assign(partitions, borders);
        Ok(Coordinator {
            set: PartitionSet::new(end_time, per_partition),
            endpoint,
        })
    }

    /// Number of partitions under coordination.
    pub fn partition_count(&self) -> usize {
        self.set.len()
    }

    /// Access a partition (peer references resolve through this table).
    pub fn partition(&self, id: PartitionId) -> &Partition {
        self.set.partition(id)
    }

    pub fn partitions(&self) -> &[Partition] {
        self.set.partitions()
    }

    /// Run to the end time with no observer.
    pub fn run(self) -> CoordResult<()> {
        self.run_with(&NoopObserver)
    }

    /// Run to the end time, reporting cross-partition events to `observer`.
    ///
    /// Returns the first worker error encountered in partition order.  A
    /// worker that fails before the start-up rendezvous leaves its peers
    /// blocked (the accepted no-cancellation limitation), so a returned
    /// error here means every worker has already exited.
    pub fn run_with<O: RunObserver>(self, observer: &O) -> CoordResult<()> {
        let Coordinator { set, endpoint } = self;

        thread::scope(|scope| {
            let mut workers = Vec::with_capacity(set.len());
            for partition in set.partitions() {
                let id = partition.id();
                let set = &set;
                let endpoint = &endpoint;
                let handle = thread::Builder::new()
                    .name(format!("partition-{}", id.0))
                    .spawn_scoped(scope, move || {
                        run_partition(set, endpoint, id, observer)
                    })?;
                workers.push((id, handle));
            }

            for (id, handle) in workers {
                match handle.join() {
                    Ok(result) => result?,
                    Err(_) => return Err(CoordError::WorkerPanicked(id)),
                }
            }
            Ok(())
        })
    }
}
