//! Simulation time model.
//!
//! The external simulators own the clock: each reports its current simulated
//! time in seconds and advances it by its own delta-t per
//! step.  The coordinator never does tick arithmetic of its own — it only
//! compares reported times against the configured end time — so simulated
//! time is kept as the `f64` seconds the wire protocol speaks, wrapped in
//! [`SimTime`] for type safety at API boundaries.

use std::fmt;

/// A point in simulated time, in seconds since simulation start.
///
/// Monotone non-decreasing within one simulator connection.  Comparisons are
/// the only arithmetic the coordinator performs on these values.
#[derive(Copy, Clone, PartialEq, PartialOrd, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimTime(pub f64);

impl SimTime {
    pub const ZERO: SimTime = SimTime(0.0);

    /// Construct from a seconds count.
    #[inline]
    pub fn at(secs: f64) -> SimTime {
        SimTime(secs)
    }

    /// The raw seconds value.
    #[inline]
    pub fn secs(self) -> f64 {
        self.0
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}
