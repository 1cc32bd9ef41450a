use std::collections::VecDeque;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;
use crate::graph::graph::Graph;

/// Dense `V x V` matrix of pairwise graph distances (§4.1). Immutable after
/// construction. Unreachable pairs hold the sentinel `V + 1`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistanceOracle {
    distances: Array2<u32>,
    size: usize,
}

impl DistanceOracle {
    /// The "infinity stand-in" for a graph of `size` vertices.
    #[inline]
    pub fn sentinel_for(size: usize) -> u32 {
        size as u32 + 1
    }

    #[inline]
    pub fn sentinel(&self) -> u32 {
        Self::sentinel_for(self.size)
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Run breadth-first search from every vertex and fill the dense
    /// distance matrix. `O(V * (V + E))` time, `O(V^2)` space.
    pub fn build(graph: &Graph) -> Self {
        let size = graph.node_count();
        let sentinel = Self::sentinel_for(size);
        let mut distances = Array2::<u32>::from_elem((size, size), sentinel);
        let mut queue = VecDeque::with_capacity(size);

        for source in 0..size {
            distances[[source, source]] = 0;
            queue.clear();
            queue.push_back(source);
            while let Some(u) = queue.pop_front() {
                let du = distances[[source, u]];
                for v in graph.neighbors(u) {
                    if distances[[source, v]] == sentinel {
                        distances[[source, v]] = du + 1;
                        queue.push_back(v);
                    }
                }
            }
        }

        Self { distances, size }
    }

    #[inline]
    pub fn get(&self, a: usize, b: usize) -> u32 {
        self.distances[[a, b]]
    }

    /// The full distance row for unit `a`, used to slice out a submission's
    /// rows without re-querying the matrix one pair at a time.
    pub fn row(&self, a: usize) -> ArrayView1<u32> {
        self.distances.row(a)
    }

    pub fn as_array(&self) -> &Array2<u32> {
        &self.distances
    }

    /// Serialize as a comma-delimited textual integer matrix, one row per
    /// line, with no scientific notation (§4.1 caching, §6 cache format).
    pub fn save_cache(&self, path: &Path) -> Result<()> {
        let mut text = String::with_capacity(self.size * self.size * 4);
        for row in self.distances.rows() {
            let line = row.iter().map(u32::to_string).collect::<Vec<_>>().join(",");
            text.push_str(&line);
            text.push('\n');
        }
        fs::write(path, text).with_context(|| format!("writing distance cache {}", path.display()))?;
        Ok(())
    }

    /// Load a previously-cached matrix. Fails (does not panic) if the
    /// dimensions don't match `expected_size`; per §4.1 the caller is
    /// expected to fall back to [`DistanceOracle::build`] on an `Err`.
    pub fn load_cache(path: &Path, expected_size: usize) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading distance cache {}", path.display()))?;

        let mut flat = Vec::with_capacity(expected_size * expected_size);
        let mut rows = 0usize;
        for line in text.lines() {
            if line.is_empty() {
                continue;
            }
            let mut cols = 0usize;
            for cell in line.split(',') {
                let value: u32 = cell.trim().parse().map_err(|_| {
                    AnalysisError::InputFormat(format!("distance cache cell '{cell}' is not a non-negative integer"))
                })?;
                flat.push(value);
                cols += 1;
            }
            if cols != expected_size {
                return Err(AnalysisError::SchemaMismatch(format!(
                    "distance cache row {rows} has {cols} columns, expected {expected_size}"
                ))
                .into());
            }
            rows += 1;
        }
        if rows != expected_size {
            return Err(AnalysisError::SchemaMismatch(format!(
                "distance cache has {rows} rows, expected {expected_size}"
            ))
            .into());
        }

        let distances = Array2::from_shape_vec((expected_size, expected_size), flat)
            .map_err(|e| AnalysisError::SchemaMismatch(format!("distance cache shape error: {e}")))?;
        Ok(Self { distances, size: expected_size })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::unit::UnitId;

    fn path_graph(n: usize) -> Graph {
        let unit_ids = (0..n).map(|i| UnitId::from(i.to_string())).collect();
        let edges = (0..n)
            .map(|i| {
                let mut row = Vec::new();
                if i > 0 {
                    row.push((i - 1) as u32);
                }
                if i + 1 < n {
                    row.push((i + 1) as u32);
                }
                row
            })
            .collect();
        Graph::from_adjacency(unit_ids, edges)
    }

    #[test]
    fn path_graph_distances_are_hop_counts() {
        let graph = path_graph(4);
        let oracle = DistanceOracle::build(&graph);
        assert_eq!(oracle.get(0, 0), 0);
        assert_eq!(oracle.get(0, 1), 1);
        assert_eq!(oracle.get(0, 2), 2);
        assert_eq!(oracle.get(0, 3), 3);
        assert_eq!(oracle.get(3, 0), 3);
    }

    #[test]
    fn symmetric_and_zero_diagonal() {
        let graph = path_graph(5);
        let oracle = DistanceOracle::build(&graph);
        for a in 0..5 {
            assert_eq!(oracle.get(a, a), 0);
            for b in 0..5 {
                assert_eq!(oracle.get(a, b), oracle.get(b, a));
            }
        }
    }

    #[test]
    fn disconnected_components_get_sentinel() {
        // Two disjoint edges: 0-1 and 2-3.
        let unit_ids = (0..4).map(|i| UnitId::from(i.to_string())).collect();
        let edges = vec![vec![1u32], vec![0u32], vec![3u32], vec![2u32]];
        let graph = Graph::from_adjacency(unit_ids, edges);
        let oracle = DistanceOracle::build(&graph);

        assert_eq!(oracle.get(0, 1), 1);
        assert_eq!(oracle.get(0, 2), oracle.sentinel());
        assert_eq!(oracle.sentinel(), 5);
    }

    #[test]
    fn cache_round_trips() {
        let graph = path_graph(6);
        let oracle = DistanceOracle::build(&graph);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dist.csv");
        oracle.save_cache(&path).unwrap();

        let loaded = DistanceOracle::load_cache(&path, oracle.size()).unwrap();
        assert_eq!(loaded.as_array(), oracle.as_array());
    }

    #[test]
    fn cache_load_rejects_dimension_mismatch() {
        let graph = path_graph(4);
        let oracle = DistanceOracle::build(&graph);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dist.csv");
        oracle.save_cache(&path).unwrap();

        assert!(DistanceOracle::load_cache(&path, 5).is_err());
    }
}
