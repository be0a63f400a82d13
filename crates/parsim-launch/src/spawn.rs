//! Spawning the per-partition simulator processes.

use std::path::Path;
use std::process::{Child, Command};

use log::info;

use crate::error::{LaunchError, LaunchResult};
use crate::install::SumoInstall;

/// Start one simulator process for a partition.
///
/// The process is told to listen for a TraCI client on `port` and to begin
/// simulating as soon as that client connects (`--start`).  The returned
/// [`Child`] is not waited on: the simulator runs until its client closes the
/// connection, and the coordinator deliberately leaves failed runs' processes
/// as orphans rather than attempting peer teardown.
pub fn spawn_simulator(
    install: &SumoInstall,
    gui: bool,
    config: &Path,
    port: u16,
) -> LaunchResult<Child> {
    let binary = install.sumo_binary(gui);
    info!(
        "launching {} -c {} --remote-port {port}",
        binary.display(),
        config.display()
    );
    Command::new(&binary)
        .arg("-c")
        .arg(config)
        .arg("--remote-port")
        .arg(port.to_string())
        .arg("--start")
        .spawn()
        .map_err(|e| LaunchError::Spawn {
            tool: binary.display().to_string(),
            source: e,
        })
}
