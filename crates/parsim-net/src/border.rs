//! Border-edge discovery and per-partition assignment.

use std::collections::BTreeMap;

use log::warn;

use parsim_core::PartitionId;

use crate::NetFile;

/// A road edge shared by exactly two partitions.
///
/// `from` and `to` are non-owning references by partition id; the coordinator
/// resolves them through its partition table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BorderEdge {
    pub id: String,
    /// Lane identifiers of the edge, identical on both sides of the border.
    pub lanes: Vec<String>,
    /// Partition the edge's traffic originates in.
    pub from: PartitionId,
    /// Partition the edge's traffic flows into.
    pub to: PartitionId,
}

/// Find every edge shared by exactly two partition networks.
///
/// `nets[i]` is partition `i`'s network.  For each shared edge the direction
/// is decided in the first partition that lists it: if the edge's origin
/// junction is a dead end there, the cut severed the edge's upstream side, so
/// traffic originates in the *other* partition.
///
/// Edges appearing in three or more partitions are unsupported (partition
/// corners) and dropped with a warning.  Output is ordered by edge id, so a
/// given partitioning always yields the same index.
pub fn find_border_edges(nets: &[NetFile]) -> Vec<BorderEdge> {
    // Multimap edge id → owning partitions, over all non-internal edges.
    let mut owners: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (partition, net) in nets.iter().enumerate() {
        for edge in net.edges.iter().filter(|e| !e.is_internal()) {
            let entry = owners.entry(&edge.id).or_default();
            // A file declaring the same edge twice still counts one owner.
            if entry.last() != Some(&partition) {
                entry.push(partition);
            }
        }
    }

    let mut borders = Vec::new();
    for (id, partitions) in owners {
        let (p1, p2) = match partitions[..] {
            [_] => continue,
            [p1, p2] => (p1, p2),
            _ => {
                warn!(
                    "edge '{id}' appears in {} partitions; only two-partition \
                     border edges are supported, dropping it",
                    partitions.len()
                );
                continue;
            }
        };

        // The edge is known to exist in p1's net; read its lanes and origin.
        let Some(edge) = nets[p1].edge(id) else { continue };
        let dead_end = edge
            .from_junction
            .as_deref()
            .is_some_and(|junction| nets[p1].is_dead_end(junction));

        let (from, to) = if dead_end { (p2, p1) } else { (p1, p2) };
        borders.push(BorderEdge {
            id: id.to_owned(),
            lanes: edge.lanes.clone(),
            from: PartitionId(from as u32),
            to: PartitionId(to as u32),
        });
    }
    borders
}

/// One partition's share of the border-edge index.
#[derive(Clone, Debug, Default)]
pub struct PartitionBorders {
    /// Border edges whose traffic flows *into* this partition.
    pub to_edges: Vec<BorderEdge>,
    /// Border edges whose traffic *leaves* this partition.
    pub from_edges: Vec<BorderEdge>,
}

impl PartitionBorders {
    /// Distribute border edges over `n` partitions.  Each edge lands in the
    /// `to_edges` of its `to` partition and the `from_edges` of its `from`
    /// partition.
    pub fn assign(n: usize, edges: &[BorderEdge]) -> Vec<PartitionBorders> {
        let mut per_partition = vec![PartitionBorders::default(); n];
        for edge in edges {
            if let Some(side) = per_partition.get_mut(edge.to.index()) {
                side.to_edges.push(edge.clone());
            }
            if let Some(side) = per_partition.get_mut(edge.from.index()) {
                side.from_edges.push(edge.clone());
            }
        }
        per_partition
    }
}
