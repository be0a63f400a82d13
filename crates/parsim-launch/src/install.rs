//! Locating the SUMO installation.

use std::path::{Path, PathBuf};

use crate::{LaunchError, LaunchResult};

/// Environment variable pointing at the SUMO installation root.
pub const SUMO_HOME: &str = "SUMO_HOME";

/// A resolved SUMO installation; composes binary paths under `<root>/bin`.
#[derive(Clone, Debug)]
pub struct SumoInstall {
    root: PathBuf,
}

impl SumoInstall {
    /// Resolve from `$SUMO_HOME`, failing fast if it is unset.
    pub fn from_env() -> LaunchResult<Self> {
        Self::from_env_var(SUMO_HOME)
    }

    /// Resolve from an arbitrary environment variable (tests use this to
    /// avoid touching the process environment).
    pub fn from_env_var(var: &'static str) -> LaunchResult<Self> {
        match std::env::var_os(var) {
            Some(root) => Ok(SumoInstall { root: PathBuf::from(root) }),
            None => Err(LaunchError::MissingEnv(var)),
        }
    }

    /// Use an explicit installation root.
    pub fn at(root: impl Into<PathBuf>) -> Self {
        SumoInstall { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The simulator binary: `bin/sumo-gui` when `gui`, else `bin/sumo`.
    pub fn sumo_binary(&self, gui: bool) -> PathBuf {
        self.root.join("bin").join(if gui { "sumo-gui" } else { "sumo" })
    }

    /// The network conversion binary, `bin/netconvert`.
    pub fn netconvert_binary(&self) -> PathBuf {
        self.root.join("bin").join("netconvert")
    }
}
