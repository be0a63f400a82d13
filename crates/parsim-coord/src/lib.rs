//! `parsim-coord` — lock-step coordination of partitioned simulators.
//!
//! One worker thread drives each partition's external simulator through a
//! blocking TraCI connection.  Every tick, each worker:
//!
//! ```text
//! ① step      — advance its own simulator one delta-t (global lock held)
//! ② to-edges  — for vehicles seen twice on an incoming border edge, push
//!               this side's measured speed back to the upstream partition
//! ③ from-edges— for vehicles newly arrived on an outgoing border edge,
//!               insert a mirrored copy into the downstream partition
//! ④ barrier   — rendezvous with every other partition before tick k+1
//! ```
//!
//! # Shared synchronization state
//!
//! [`SharedSynch`] owns the run's one mutex, one barrier and one condition
//! variable.  The mutex guards the *client table*: holding it is holding the
//! right to speak to any simulator, which lets a handler read from its own
//! client and write to a peer's inside a single critical section.
//!
//! # The handshake
//!
//! Steps ② and ③ mutate a peer's simulator.  To keep two mutually-updating
//! partitions (a two-way border road) out of deadlock, every remote mutation
//! is bracketed by the `synching`/`waiting` flag handshake: announce intent
//! on the peer, spin until the peer is parked at its barrier or in
//! [`SharedSynch::wait_for_synch`], and abandon the attempt for this tick if
//! a peer announces intent on *us* first.  Aborted transfers are retried the
//! next tick because the per-edge vehicle memory is left untouched.
//!
//! | Module        | Contents                                             |
//! |---------------|------------------------------------------------------|
//! | [`synch`]     | `SharedSynch`, `Clients` (locked client table view)  |
//! | [`partition`] | `Partition` (flags + border-edge lists)              |
//! | [`set`]       | `PartitionSet` (the flat partition table)            |
//! | [`endpoint`]  | `SimulatorEndpoint` (launch/connect seam)            |
//! | `worker`      | per-partition tick loop and border handlers          |
//! | [`coordinator`]| `Coordinator` (thread lifecycle)                    |
//! | [`observer`]  | `RunObserver`, `NoopObserver`, `TransferStats`       |
//! | [`error`]     | `CoordError`, `CoordResult`                          |

pub mod coordinator;
pub mod endpoint;
pub mod error;
pub mod observer;
pub mod partition;
pub mod set;
pub mod synch;
mod worker;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use coordinator::Coordinator;
pub use endpoint::SimulatorEndpoint;
pub use error::{CoordError, CoordResult};
pub use observer::{NoopObserver, RunObserver, TransferStats};
pub use partition::Partition;
pub use set::PartitionSet;
pub use synch::{Clients, SharedSynch};
