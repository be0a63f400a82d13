//! The run's shared synchronization primitives and the client table.

use std::sync::{Barrier, Condvar, Mutex, MutexGuard};

use parsim_core::{PartitionId, SimTime};
use parsim_traci::TraciClient;

use crate::error::{CoordError, CoordResult};
use crate::partition::Partition;

/// The coordinator-owned mutex / barrier / condition-variable triple.
///
/// The mutex guards one slot per partition holding its connected client.
/// It is deliberately *global*: a border handler reads from its own client
/// and writes to a peer's client inside the same critical section, and the
/// external client library's reentrancy is unknown.  Lock and barrier
/// failures are treated as invariant violations, not runtime errors.
pub struct SharedSynch<C> {
    table: Mutex<ClientTable<C>>,
    resumed: Condvar,
    barrier: Barrier,
}

struct ClientTable<C> {
    slots: Vec<Option<C>>,
}

impl<C: TraciClient> SharedSynch<C> {
    /// Create primitives for `n` partitions; the barrier is sized to `n`
    /// worker threads (the coordinator thread never enters it).
    pub fn new(n: usize) -> Self {
        SharedSynch {
            table: Mutex::new(ClientTable {
                slots: (0..n).map(|_| None).collect(),
            }),
            resumed: Condvar::new(),
            barrier: Barrier::new(n),
        }
    }

    /// Acquire the global lock, yielding the client table view.
    pub fn clients(&self) -> Clients<'_, C> {
        Clients {
            table: self.table.lock().expect("client table mutex poisoned"),
        }
    }

    /// Rendezvous with every other partition at the tick boundary.
    pub fn barrier_wait(&self) {
        self.barrier.wait();
    }

    /// Wake peers blocked in [`wait_for_synch`](Self::wait_for_synch).
    pub fn notify_peers(&self) {
        self.resumed.notify_all();
    }

    /// Park `partition` until its `synching` flag clears.
    ///
    /// Sets `waiting` while parked, so the peer that raised the flag can see
    /// the partition is safe to operate on.
    pub fn wait_for_synch(&self, partition: &Partition) {
        let mut table = self.table.lock().expect("client table mutex poisoned");
        partition.set_waiting(true);
        while partition.is_synching() {
            table = self
                .resumed
                .wait(table)
                .expect("client table mutex poisoned");
        }
        partition.set_waiting(false);
        drop(table);
    }
}

/// The locked client table.
///
/// Holding a `Clients` value *is* holding the global lock; every simulator
/// operation below addresses a partition's client by id, so one critical
/// section can combine reads on one partition with writes on another.
pub struct Clients<'a, C> {
    table: MutexGuard<'a, ClientTable<C>>,
}

impl<C: TraciClient> Clients<'_, C> {
    /// Put a freshly connected client into its partition's slot.
    pub fn install(&mut self, id: PartitionId, client: C) {
        self.table.slots[id.index()] = Some(client);
    }

    /// Remove a partition's client (for closing at teardown).
    pub fn take(&mut self, id: PartitionId) -> Option<C> {
        self.table.slots[id.index()].take()
    }

    fn client(&mut self, id: PartitionId) -> CoordResult<&mut C> {
        self.table.slots[id.index()]
            .as_mut()
            .ok_or(CoordError::NotConnected(id))
    }

    // ── Delegated simulator operations ────────────────────────────────────

    pub fn current_time(&mut self, id: PartitionId) -> CoordResult<SimTime> {
        Ok(self.client(id)?.current_time()?)
    }

    pub fn step(&mut self, id: PartitionId) -> CoordResult<()> {
        Ok(self.client(id)?.step()?)
    }

    pub fn vehicles_on_edge(&mut self, id: PartitionId, edge: &str) -> CoordResult<Vec<String>> {
        Ok(self.client(id)?.vehicles_on_edge(edge)?)
    }

    pub fn route_edges(&mut self, id: PartitionId, route: &str) -> CoordResult<Vec<String>> {
        Ok(self.client(id)?.route_edges(route)?)
    }

    pub fn vehicle_type(&mut self, id: PartitionId, vehicle: &str) -> CoordResult<String> {
        Ok(self.client(id)?.vehicle_type(vehicle)?)
    }

    pub fn route_id(&mut self, id: PartitionId, vehicle: &str) -> CoordResult<String> {
        Ok(self.client(id)?.route_id(vehicle)?)
    }

    pub fn lane_index(&mut self, id: PartitionId, vehicle: &str) -> CoordResult<i32> {
        Ok(self.client(id)?.lane_index(vehicle)?)
    }

    pub fn lane_id(&mut self, id: PartitionId, vehicle: &str) -> CoordResult<String> {
        Ok(self.client(id)?.lane_id(vehicle)?)
    }

    pub fn lane_position(&mut self, id: PartitionId, vehicle: &str) -> CoordResult<f64> {
        Ok(self.client(id)?.lane_position(vehicle)?)
    }

    pub fn speed(&mut self, id: PartitionId, vehicle: &str) -> CoordResult<f64> {
        Ok(self.client(id)?.speed(vehicle)?)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn add_vehicle(
        &mut self,
        id: PartitionId,
        vehicle: &str,
        route: &str,
        vehicle_type: &str,
        lane_index: i32,
        depart_pos: f64,
        speed: f64,
    ) -> CoordResult<()> {
        Ok(self
            .client(id)?
            .add_vehicle(vehicle, route, vehicle_type, lane_index, depart_pos, speed)?)
    }

    pub fn move_to(
        &mut self,
        id: PartitionId,
        vehicle: &str,
        lane: &str,
        pos: f64,
    ) -> CoordResult<()> {
        Ok(self.client(id)?.move_to(vehicle, lane, pos)?)
    }

    /// Clamp a vehicle's speed on partition `id` over one of *that*
    /// simulator's ticks.
    pub fn slow_down(&mut self, id: PartitionId, vehicle: &str, speed: f64) -> CoordResult<()> {
        let client = self.client(id)?;
        let delta_t = client.delta_t()?;
        Ok(client.slow_down(vehicle, speed, delta_t)?)
    }
}
