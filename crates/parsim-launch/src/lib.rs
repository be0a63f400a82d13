//! `parsim-launch` — everything that happens before the first tick.
//!
//! The coordinator's pre-run pipeline, in order:
//!
//! 1. Resolve the SUMO installation from `$SUMO_HOME` ([`install`]).
//! 2. Parse the operator's `.sumocfg` ([`config`]).
//! 3. Hoist inline vehicle routes into named routes so the route cutter can
//!    split them ([`routes`]).
//! 4. Cut the network into per-partition files with the external tools —
//!    netconvert plus either a grid cut or a METIS graph partitioning —
//!    and write one rewritten `.sumocfg` per partition ([`partition`]).
//! 5. Spawn one simulator process per partition ([`spawn`]).
//!
//! Every failure in this crate is fatal to the run: the coordinator prints
//! the diagnostic and exits non-zero before any simulator is left running.
//!
//! | Module        | Contents                                              |
//! |---------------|-------------------------------------------------------|
//! | [`install`]   | `SumoInstall` (`$SUMO_HOME`, binary paths)            |
//! | [`config`]    | `SumoConfig`, `write_partition_config`                |
//! | [`routes`]    | `preprocess_routes`                                   |
//! | [`partition`] | `PartitionScheme`, `NetPartitioner`                   |
//! | [`spawn`]     | `spawn_simulator`                                     |
//! | [`pipeline`]  | `prepare_run`, `PreparedRun` (the steps above, wired) |
//! | [`error`]     | `LaunchError`, `LaunchResult`                         |

pub mod config;
pub mod error;
pub mod install;
pub mod partition;
pub mod pipeline;
pub mod routes;
pub mod spawn;


use parsim_core::PartitionId;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::{write_partition_config, SumoConfig, DEFAULT_END_TIME_SECS};
pub use error::{LaunchError, LaunchResult};
pub use install::{SumoInstall, SUMO_HOME};
pub use partition::{NetPartitioner, PartitionScheme};
pub use pipeline::{prepare_run, PreparedRun};
pub use routes::preprocess_routes;
pub use spawn::spawn_simulator;

// ── Per-partition file names ──────────────────────────────────────────────────

/// `part<i>.net.xml`
pub fn net_file_name(id: PartitionId) -> String {
    format!("part{}.net.xml", id.0)
}

/// `part<i>.rou.xml`
pub fn route_file_name(id: PartitionId) -> String {
    format!("part{}.rou.xml", id.0)
}

/// `part<i>.sumocfg`
pub fn config_file_name(id: PartitionId) -> String {
    format!("part{}.sumocfg", id.0)
}
