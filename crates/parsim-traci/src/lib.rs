//! `parsim-traci` — the simulator client contract.
//!
//! Each partition's SUMO process is a black box reachable over a TraCI TCP
//! connection.  This crate defines the slice of that surface the coordinator
//! relies on as the [`TraciClient`] trait, together with its error taxonomy
//! ([`TraciError`], with a *transient* vehicle-state class the coordination
//! layer swallows) and [`MockSimulator`], a deterministic in-memory simulator
//! used by tests and demos.
//!
//! The production TCP client is an external library; applications implement
//! [`TraciClient`] over it and hand connected clients to the coordinator.
//!
//! | Module     | Contents                                |
//! |------------|-----------------------------------------|
//! | [`client`] | `TraciClient`                           |
//! | [`error`]  | `TraciError`, `TraciResult`             |
//! | [`mock`]   | `MockSimulator`, `VehicleSpec`          |

pub mod client;
pub mod error;
pub mod mock;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use client::TraciClient;
pub use error::{TraciError, TraciResult};
pub use mock::{MockSimulator, VehicleSpec};
