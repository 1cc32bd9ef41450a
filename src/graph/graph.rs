use std::fs;
use std::path::Path;

use ahash::AHashMap;
use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::AnalysisError;
use crate::graph::unit::UnitId;

/// An undirected adjacency graph over opaque geographic units, stored in
/// compressed sparse row form.
///
/// Invariant: internal indices are a contiguous permutation of `[0, V)`; the
/// `UnitId -> index` map is total and injective over `unit_ids()`.
#[derive(Debug, Default)]
pub struct Graph {
    unit_ids: Vec<UnitId>,
    index_of: AHashMap<UnitId, usize>,
    offsets: Vec<u32>,
    edges: Vec<u32>,
}

/// On-disk shape for a [`Graph`]: the `index_of` lookup map is rebuilt on
/// load rather than serialized, since it's fully determined by `unit_ids`.
#[derive(Serialize, Deserialize)]
struct GraphWire {
    unit_ids: Vec<UnitId>,
    offsets: Vec<u32>,
    edges: Vec<u32>,
}

impl Serialize for Graph {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        GraphWire {
            unit_ids: self.unit_ids.clone(),
            offsets: self.offsets.clone(),
            edges: self.edges.clone(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Graph {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = GraphWire::deserialize(deserializer)?;
        let index_of = wire.unit_ids.iter().cloned().enumerate().map(|(i, id)| (id, i)).collect();
        Ok(Self { unit_ids: wire.unit_ids, index_of, offsets: wire.offsets, edges: wire.edges })
    }
}

impl Graph {
    /// Construct a graph directly from per-node adjacency lists. `unit_ids[i]`
    /// and `edges[i]` both describe node `i`; `edges[i]` holds the internal
    /// indices of `i`'s neighbors (assumed already symmetric).
    pub fn from_adjacency(unit_ids: Vec<UnitId>, edges: Vec<Vec<u32>>) -> Self {
        assert_eq!(unit_ids.len(), edges.len(), "unit_ids.len() must equal edges.len()");

        let index_of = unit_ids
            .iter()
            .cloned()
            .enumerate()
            .map(|(i, id)| (id, i))
            .collect::<AHashMap<_, _>>();
        assert_eq!(index_of.len(), unit_ids.len(), "unit_ids must be pairwise distinct");

        let offsets = std::iter::once(0u32)
            .chain(
                edges
                    .iter()
                    .map(|v| v.len() as u32)
                    .scan(0u32, |acc, len| {
                        *acc += len;
                        Some(*acc)
                    }),
            )
            .collect::<Vec<u32>>();
        let edges = edges.into_iter().flatten().collect();

        Self { unit_ids, index_of, offsets, edges }
    }

    /// Load a graph from a node-link JSON adjacency document (§6): an object
    /// with a `nodes` array (one entry per vertex, carrying `id_attribute` as
    /// its external identifier) and an `adjacency` array (per-vertex lists of
    /// `{"id": <neighbor index>}` entries). The loader assigns each node an
    /// internal index equal to its position in `nodes`.
    pub fn load(path: &Path, id_attribute: &str) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading adjacency file {}", path.display()))?;
        let doc: Value = serde_json::from_str(&text)
            .map_err(|e| AnalysisError::InputFormat(format!("malformed adjacency JSON: {e}")))?;

        let nodes = doc
            .get("nodes")
            .and_then(Value::as_array)
            .ok_or_else(|| AnalysisError::InputFormat("adjacency document missing `nodes` array".into()))?;
        let adjacency = doc
            .get("adjacency")
            .and_then(Value::as_array)
            .ok_or_else(|| AnalysisError::InputFormat("adjacency document missing `adjacency` array".into()))?;
        if nodes.len() != adjacency.len() {
            return Err(AnalysisError::InputFormat(format!(
                "nodes ({}) and adjacency ({}) length mismatch",
                nodes.len(),
                adjacency.len()
            ))
            .into());
        }

        let mut unit_ids = Vec::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            let value = node.get(id_attribute).ok_or_else(|| {
                AnalysisError::SchemaMismatch(format!("node {i} is missing id attribute '{id_attribute}'"))
            })?;
            let id_str = match value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                other => {
                    return Err(AnalysisError::InputFormat(format!(
                        "node {i} id attribute '{id_attribute}' is not a string or number: {other}"
                    ))
                    .into())
                }
            };
            unit_ids.push(UnitId::from(id_str));
        }

        let mut edges = Vec::with_capacity(nodes.len());
        for (i, neighbors) in adjacency.iter().enumerate() {
            let neighbors = neighbors
                .as_array()
                .ok_or_else(|| AnalysisError::InputFormat(format!("adjacency entry {i} is not an array")))?;
            let mut row = Vec::with_capacity(neighbors.len());
            for neighbor in neighbors {
                let target = neighbor.get("id").and_then(Value::as_u64).ok_or_else(|| {
                    AnalysisError::InputFormat(format!("adjacency entry {i} has a neighbor without an integer 'id'"))
                })?;
                row.push(target as u32);
            }
            edges.push(row);
        }

        Ok(Self::from_adjacency(unit_ids, edges))
    }

    /// Number of vertices in the graph.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.unit_ids.len()
    }

    /// Number of directed edge entries (each undirected edge counts twice).
    #[inline]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    #[inline]
    fn range(&self, node: usize) -> std::ops::Range<usize> {
        self.offsets[node] as usize..self.offsets[node + 1] as usize
    }

    #[inline]
    pub fn degree(&self, node: usize) -> usize {
        self.range(node).len()
    }

    #[inline]
    pub fn neighbors(&self, node: usize) -> impl Iterator<Item = usize> + '_ {
        self.range(node).map(move |v| self.edges[v] as usize)
    }

    pub fn unit_id(&self, index: usize) -> &UnitId {
        &self.unit_ids[index]
    }

    pub fn index_of(&self, id: &UnitId) -> Option<usize> {
        self.index_of.get(id).copied()
    }

    pub fn unit_ids(&self) -> &[UnitId] {
        &self.unit_ids
    }
}
