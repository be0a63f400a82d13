//! The flat partition table shared by all workers.

use parsim_core::{PartitionId, SimTime};
use parsim_net::PartitionBorders;
use parsim_traci::TraciClient;

use crate::partition::Partition;
use crate::synch::SharedSynch;

/// All partitions plus the shared synchronization state.
///
/// Border edges refer to peer partitions by [`PartitionId`]; workers resolve
/// those references through [`partition`](Self::partition).  The set is
/// created before any worker starts and outlives them all, so id-based
/// references are always valid during a run.
pub struct PartitionSet<C> {
    synch: SharedSynch<C>,
    partitions: Vec<Partition>,
}

impl<C: TraciClient> PartitionSet<C> {
    /// Build `borders.len()` partitions sharing one end time, each taking its
    /// slice of the border-edge index.
    pub(crate) fn new(end_time: SimTime, borders: Vec<PartitionBorders>) -> Self {
        let synch = SharedSynch::new(borders.len());
        let partitions = borders
            .into_iter()
            .enumerate()
            .map(|(i, b)| Partition::new(PartitionId(i as u32), end_time, b))
            .collect();
        PartitionSet { synch, partitions }
    }

    pub fn len(&self) -> usize {
        self.partitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty()
    }

    /// Resolve a partition by id.  Ids are validated against the partition
    /// count when the coordinator is built, so in-run lookups cannot miss.
    pub fn partition(&self, id: PartitionId) -> &Partition {
        &self.partitions[id.index()]
    }

    pub fn partitions(&self) -> &[Partition] {
        &self.partitions
    }

    pub fn synch(&self) -> &SharedSynch<C> {
        &self.synch
    }
}
