//! The minimal `.net.xml` model.
//!
//! A SUMO network file carries far more than the border scan needs; this
//! module extracts only edge identifiers, the optional `function` attribute,
//! the origin junction, lane identifiers, and junction types.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::{NetError, NetResult};

/// One `<edge>` element of a network file.
#[derive(Clone, Debug)]
pub struct NetEdge {
    pub id: String,
    /// SUMO marks junction-internal connector edges with `function="internal"`.
    pub function: Option<String>,
    /// Identifier of the junction this edge leaves from, if declared.
    pub from_junction: Option<String>,
    /// Lane identifiers in declaration order.
    pub lanes: Vec<String>,
}

impl NetEdge {
    /// Junction-internal edges never cross partitions and are skipped by the
    /// border scan.
    pub fn is_internal(&self) -> bool {
        self.function.as_deref() == Some("internal")
    }
}

/// The parts of one partition's network file the border scan reads.
#[derive(Debug)]
pub struct NetFile {
    pub edges: Vec<NetEdge>,
    /// Junction id → junction type (e.g. `"dead_end"`, `"priority"`).
    junction_types: HashMap<String, String>,
    /// Edge id → index into `edges`.
    edge_index: HashMap<String, usize>,
}

impl NetFile {
    /// Read and parse a network file from disk.
    pub fn load(path: &Path) -> NetResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text, path)
    }

    /// Parse network XML; `path` is only used in error messages.
    pub fn parse(xml: &str, path: &Path) -> NetResult<Self> {
        let doc = roxmltree::Document::parse(xml)?;
        let net = doc
            .root()
            .children()
            .find(|n| n.has_tag_name("net"))
            .ok_or_else(|| NetError::MissingElement {
                path: path.to_path_buf(),
                element: "net",
            })?;

        let mut edges = Vec::new();
        let mut junction_types = HashMap::new();

        for node in net.children() {
            if node.has_tag_name("edge") {
                let id = require_attr(node, path, "edge", "id")?;
                let lanes = node
                    .children()
                    .filter(|n| n.has_tag_name("lane"))
                    .filter_map(|n| n.attribute("id"))
                    .map(str::to_owned)
                    .collect();
                edges.push(NetEdge {
                    id,
                    function: node.attribute("function").map(str::to_owned),
                    from_junction: node.attribute("from").map(str::to_owned),
                    lanes,
                });
            } else if node.has_tag_name("junction") {
                let id = require_attr(node, path, "junction", "id")?;
                let kind = node.attribute("type").unwrap_or_default().to_owned();
                junction_types.insert(id, kind);
            }
        }

        let edge_index = edges
            .iter()
            .enumerate()
            .map(|(i, e)| (e.id.clone(), i))
            .collect();

        Ok(NetFile { edges, junction_types, edge_index })
    }

    /// Look an edge up by identifier.
    pub fn edge(&self, id: &str) -> Option<&NetEdge> {
        self.edge_index.get(id).map(|&i| &self.edges[i])
    }

    /// The declared type of a junction, if the junction exists.
    pub fn junction_type(&self, id: &str) -> Option<&str> {
        self.junction_types.get(id).map(String::as_str)
    }

    /// Whether `junction` is a dead end (a network boundary cut).
    pub fn is_dead_end(&self, junction: &str) -> bool {
        self.junction_type(junction) == Some("dead_end")
    }
}

fn require_attr(
    node: roxmltree::Node<'_, '_>,
    path: &Path,
    element: &'static str,
    attribute: &'static str,
) -> NetResult<String> {
    node.attribute(attribute)
        .map(str::to_owned)
        .ok_or_else(|| NetError::MissingAttribute {
            path: PathBuf::from(path),
            element,
            attribute,
        })
}
