//! The partition identifier.
//!
//! Partitions are the only entity the coordinator numbers itself; vehicle,
//! route, edge and lane identifiers are opaque strings assigned by the
//! external simulators and are passed around as `&str`/`String`.

use std::fmt;

/// Index of a sub-network partition.  Dense, assigned from 0 at construction.
///
/// `PartitionId` is `Copy + Ord + Hash` so it can be used as a map key and a
/// direct `Vec` index (via [`index`](Self::index)) without ceremony.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PartitionId(pub u32);

impl PartitionId {
    /// Cast to `usize` for direct use as a `Vec` index.
    #[inline(always)]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for PartitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

impl From<PartitionId> for usize {
    #[inline(always)]
    fn from(id: PartitionId) -> usize {
        id.0 as usize
    }
}

impl TryFrom<usize> for PartitionId {
    type Error = std::num::TryFromIntError;
    fn try_from(n: usize) -> Result<PartitionId, Self::Error> {
        u32::try_from(n).map(PartitionId)
    }
}
