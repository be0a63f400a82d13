//! `parsim-net` — network scanning and the border-edge index.
//!
//! After the external partitioning step has produced one `.net.xml` per
//! partition, the same road edge can appear in two of those files: that edge
//! is a *border edge*, the point where vehicles hand over from one simulator
//! to another.  This crate finds them.
//!
//! | Module      | Contents                                             |
//! |-------------|------------------------------------------------------|
//! | [`netfile`] | `NetFile` — the minimal `.net.xml` model             |
//! | [`border`]  | `BorderEdge`, `find_border_edges`, `PartitionBorders`|
//! | [`error`]   | `NetError`, `NetResult`                              |
//!
//! # Direction rule
//!
//! A border edge has a `from` partition (where its traffic originates) and a
//! `to` partition (where it flows).  The tie-breaker is the edge's origin
//! junction in the first partition that lists it: a `dead_end` junction means
//! the road *enters* that partition from outside, so traffic originates in
//! the other one.

pub mod border;
pub mod error;
pub mod netfile;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use border::{find_border_edges, BorderEdge, PartitionBorders};
pub use error::{NetError, NetResult};
pub use netfile::{NetEdge, NetFile};
