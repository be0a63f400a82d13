//! The pre-run pipeline, end to end.

use std::path::{Path, PathBuf};
use std::process::Child;

use parsim_core::{PartitionId, RunConfig};

use crate::config::SumoConfig;
use crate::config_file_name;
use crate::error::LaunchResult;
use crate::install::SumoInstall;
use crate::partition::{NetPartitioner, PartitionScheme};
use crate::spawn::spawn_simulator;

/// Validate the operator's configuration, locate SUMO, and cut the network:
/// everything that must succeed before any simulator process exists.
///
/// On success the working directory contains `part<i>.net.xml`,
/// `part<i>.rou.xml` and `part<i>.sumocfg` for every partition; feed the
/// network files to the border-edge scan and spawn simulators via
/// [`PreparedRun::spawn_partition`].
pub fn prepare_run(
    run: &RunConfig,
    scheme: PartitionScheme,
    work_dir: &Path,
) -> LaunchResult<PreparedRun> {
    run.validate()?;
    let install = SumoInstall::from_env()?;
    let config = SumoConfig::load(&run.config_path)?;
    let net_files =
        NetPartitioner::new(&install, &config, scheme, run.partitions, work_dir).run()?;
    Ok(PreparedRun {
        install,
        config,
        net_files,
        work_dir: work_dir.to_path_buf(),
    })
}

/// Everything [`prepare_run`] produced.
pub struct PreparedRun {
    pub install: SumoInstall,
    pub config: SumoConfig,
    /// Per-partition network files, indexed by partition id — the input to
    /// the border-edge scan.
    pub net_files: Vec<PathBuf>,
    work_dir: PathBuf,
}

impl PreparedRun {
    /// Spawn partition `id`'s simulator on its configured TCP port.
    pub fn spawn_partition(&self, run: &RunConfig, id: PartitionId) -> LaunchResult<Child> {
        let config = self.work_dir.join(config_file_name(id));
        spawn_simulator(&self.install, run.gui, &config, run.port_for(id))
    }
}
