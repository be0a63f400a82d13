//! `parsim-core` — foundational types for the parsim coordinator.
//!
//! This crate is a dependency of every other `parsim-*` crate.  It
//! intentionally has no `parsim-*` dependencies and minimal external ones
//! (only `thiserror`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module     | Contents                                  |
//! |------------|-------------------------------------------|
//! | [`ids`]    | `PartitionId`                             |
//! | [`time`]   | `SimTime`                                 |
//! | [`config`] | `RunConfig`                               |
//! | [`error`]  | `CoreError`, `CoreResult`                 |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                              |
//! |---------|-----------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types. |

pub mod config;
pub mod error;
pub mod ids;
pub mod time;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::RunConfig;
pub use error::{CoreError, CoreResult};
pub use ids::PartitionId;
pub use time::SimTime;
