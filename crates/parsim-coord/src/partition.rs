//! One partition: its border edges and coordination flags.

use std::sync::atomic::{AtomicBool, Ordering};

use parsim_core::{PartitionId, SimTime};
use parsim_net::{BorderEdge, PartitionBorders};

/// Per-partition coordination state.
///
/// The two flags are the peer-visible half of the handshake protocol:
///
/// - `synching` — a peer has announced it is about to mutate this partition's
///   simulator; the partition must not start mutating others.
/// - `waiting` — this partition is parked (at the tick barrier or inside
///   [`wait_for_synch`](crate::SharedSynch::wait_for_synch)) and is safe to
///   be mutated.
///
/// Flag reads outside the global lock are advisory by design: transitions are
/// monotone within one handshake window, and the protocol's correctness
/// rests on the barrier and the mutex, not on the flags alone.
pub struct Partition {
    id: PartitionId,
    end_time: SimTime,
    to_edges: Vec<BorderEdge>,
    from_edges: Vec<BorderEdge>,
    synching: AtomicBool,
    waiting: AtomicBool,
}

impl Partition {
    pub(crate) fn new(id: PartitionId, end_time: SimTime, borders: PartitionBorders) -> Self {
        Partition {
            id,
            end_time,
            to_edges: borders.to_edges,
            from_edges: borders.from_edges,
            synching: AtomicBool::new(false),
            waiting: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> PartitionId {
        self.id
    }

    /// Simulated time at which this partition's worker stops ticking.
    pub fn end_time(&self) -> SimTime {
        self.end_time
    }

    /// Border edges whose traffic flows into this partition.
    pub fn to_edges(&self) -> &[BorderEdge] {
        &self.to_edges
    }

    /// Border edges whose traffic leaves this partition.
    pub fn from_edges(&self) -> &[BorderEdge] {
        &self.from_edges
    }

    // ── Handshake flags ───────────────────────────────────────────────────

    /// Announce (or withdraw) a peer's intent to mutate this partition.
    pub fn set_synching(&self, on: bool) {
        self.synching.store(on, Ordering::SeqCst);
    }

    /// Whether a peer currently intends to mutate this partition.
    pub fn is_synching(&self) -> bool {
        self.synching.load(Ordering::SeqCst)
    }

    /// Whether this partition is parked and safe to be mutated.
    pub fn is_waiting(&self) -> bool {
        self.waiting.load(Ordering::SeqCst)
    }

    pub(crate) fn set_waiting(&self, on: bool) {
        self.waiting.store(on, Ordering::SeqCst);
    }
}
