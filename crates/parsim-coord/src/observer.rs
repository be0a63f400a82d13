//! Run observer trait for telemetry and test instrumentation.

use std::sync::atomic::{AtomicU64, Ordering};

use parsim_core::{PartitionId, SimTime};

/// Callbacks invoked by the partition workers at key points in the run.
///
/// All methods have default no-op implementations so implementors only need
/// to override what they care about.  Workers call these concurrently from
/// their own threads, hence `&self` and the `Sync` bound; implementations
/// aggregate with atomics or their own locks.
pub trait RunObserver: Sync {
    /// A partition's client is connected and past the start-up rendezvous.
    fn on_partition_connected(&self, _partition: PartitionId) {}

    /// A partition finished one tick; `start` is the simulated time at which
    /// the tick began.
    fn on_tick(&self, _partition: PartitionId, _start: SimTime) {}

    /// A vehicle was mirrored across a border edge.
    fn on_vehicle_transferred(
        &self,
        _from: PartitionId,
        _to: PartitionId,
        _edge: &str,
        _vehicle: &str,
    ) {
    }

    /// A downstream speed measurement was pushed back upstream.
    fn on_speed_propagated(
        &self,
        _observer_side: PartitionId,
        _upstream: PartitionId,
        _edge: &str,
        _vehicle: &str,
        _speed: f64,
    ) {
    }

    /// A handshake was abandoned because a peer wants to update us.
    fn on_handshake_abort(&self, _partition: PartitionId, _peer: PartitionId) {}

    /// A transient vehicle-state error was swallowed.
    fn on_transient_miss(&self, _partition: PartitionId) {}
}

/// A [`RunObserver`] that does nothing.
pub struct NoopObserver;

impl RunObserver for NoopObserver {}

/// Counts cross-partition events over a whole run.
///
/// The observability surface for the errors the handlers swallow silently:
/// attach one to [`Coordinator::run_with`](crate::Coordinator::run_with) and
/// read the totals after the run.
#[derive(Default)]
pub struct TransferStats {
    transfers: AtomicU64,
    slowdowns: AtomicU64,
    handshake_aborts: AtomicU64,
    transient_misses: AtomicU64,
}

impl TransferStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Vehicles mirrored across a border.
    pub fn transfers(&self) -> u64 {
        self.transfers.load(Ordering::Relaxed)
    }

    /// Speed propagations pushed upstream.
    pub fn slowdowns(&self) -> u64 {
        self.slowdowns.load(Ordering::Relaxed)
    }

    /// Handshakes abandoned to avoid mutual-update deadlock.
    pub fn handshake_aborts(&self) -> u64 {
        self.handshake_aborts.load(Ordering::Relaxed)
    }

    /// Transient vehicle-state errors swallowed.
    pub fn transient_misses(&self) -> u64 {
        self.transient_misses.load(Ordering::Relaxed)
    }
}

impl RunObserver for TransferStats {
    fn on_vehicle_transferred(
        &self,
        _from: PartitionId,
        _to: PartitionId,
        _edge: &str,
        _vehicle: &str,
    ) {
        self.transfers.fetch_add(1, Ordering::Relaxed);
    }

    fn on_speed_propagated(
        &self,
        _observer_side: PartitionId,
        _upstream: PartitionId,
        _edge: &str,
        _vehicle: &str,
        _speed: f64,
    ) {
        self.slowdowns.fetch_add(1, Ordering::Relaxed);
    }

    fn on_handshake_abort(&self, _partition: PartitionId, _peer: PartitionId) {
        self.handshake_aborts.fetch_add(1, Ordering::Relaxed);
    }

    fn on_transient_miss(&self, _partition: PartitionId) {
        self.transient_misses.fetch_add(1, Ordering::Relaxed);
    }
}
