//! Top-level run configuration.

use std::path::PathBuf;

use crate::{CoreError, CoreResult, PartitionId};

/// Everything the operator supplies to start a partitioned run.
///
/// Typically built by the application binary from its command line and passed
/// to the launch and coordination layers.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RunConfig {
    /// Host the simulator processes listen on (usually `localhost`).
    pub host: String,

    /// TCP port of partition 0; partition `i` listens on `base_port + i`.
    pub base_port: u16,

    /// Path to the top-level simulator configuration (`.sumocfg`).
    pub config_path: PathBuf,

    /// Launch graphical simulator binaries instead of headless ones.
    pub gui: bool,

    /// Number of partitions (and worker threads, and simulator processes).
    pub partitions: usize,
}

impl RunConfig {
    /// Check the configuration for values the run cannot proceed with.
    pub fn validate(&self) -> CoreResult<()> {
        if self.partitions < 2 {
            return Err(CoreError::Config(format!(
                "at least 2 partitions required, got {}",
                self.partitions
            )));
        }
        // The last partition's port must still fit a u16.
        if u16::try_from(self.partitions - 1)
            .ok()
            .and_then(|n| self.base_port.checked_add(n))
            .is_none()
        {
            return Err(CoreError::Config(format!(
                "base port {} leaves no room for {} partitions",
                self.base_port, self.partitions
            )));
        }
        Ok(())
    }

    /// The TCP port partition `id`'s simulator listens on.
    #[inline]
    pub fn port_for(&self, id: PartitionId) -> u16 {
        self.base_port + id.0 as u16
    }
}
