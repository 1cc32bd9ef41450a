use ndarray::Array2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::graph::DistanceOracle;
use crate::submissions::SubmissionTable;

/// Directed average distance from every tile in `from` to its nearest tile
/// in `to`. An empty `to` has no nearest tile for anything in `from`, so the
/// oracle's sentinel stands in for "unmatched" (§4.3).
fn directed_average(from: &[usize], to: &[usize], oracle: &DistanceOracle) -> f64 {
    if to.is_empty() {
        return oracle.sentinel() as f64;
    }
    let total: u64 = from
        .iter()
        .map(|&x| to.iter().map(|&y| oracle.get(x, y)).min().unwrap_or(oracle.sentinel()) as u64)
        .sum();
    total as f64 / from.len() as f64
}

/// Symmetrized average-Hausdorff distance between two tile sets (§4.3): the
/// *maximum* of the two directed averages, not their mean. Two empty maps
/// are identical (distance 0); an empty map compared against a non-empty one
/// is maximally dissimilar (the sentinel).
pub fn avg_hausdorff(a: &[usize], b: &[usize], oracle: &DistanceOracle) -> f64 {
    match (a.is_empty(), b.is_empty()) {
        (true, true) => 0.0,
        (true, false) | (false, true) => oracle.sentinel() as f64,
        (false, false) => directed_average(a, b, oracle).max(directed_average(b, a, oracle)),
    }
}

/// Dense symmetric matrix of pairwise average-Hausdorff distances over a
/// submission table's tile sets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dissimilarity {
    matrix: Array2<f64>,
}

impl Dissimilarity {
    /// Computes the full `N x N` dissimilarity matrix on a single worker
    /// thread. Equivalent to [`Dissimilarity::compute_with_threads`] with
    /// `num_threads = 1`, the scheduling default from §5.
    pub fn compute(table: &SubmissionTable, oracle: &DistanceOracle) -> Self {
        Self::compute_with_threads(table, oracle, 1)
    }

    /// Computes the full `N x N` dissimilarity matrix, fanning the `O(N^2)`
    /// pairwise comparisons out across `num_threads` workers (§5, §9). Each
    /// worker reads the shared-immutable distance oracle and tile-index
    /// slices and writes only into its own result entries; the master
    /// assembles the symmetric matrix afterward, so the result is
    /// deterministic regardless of completion order.
    pub fn compute_with_threads(table: &SubmissionTable, oracle: &DistanceOracle, num_threads: usize) -> Self {
        let n = table.len();
        let tile_sets: Vec<Vec<usize>> = (0..n).map(|i| table.tile_indices(i)).collect();

        let mut pairs = Vec::with_capacity(n * n.saturating_sub(1) / 2);
        for i in 0..n {
            for j in (i + 1)..n {
                pairs.push((i, j));
            }
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads.max(1))
            .build()
            .expect("building a bounded rayon thread pool for the dissimilarity sweep");

        let entries: Vec<(usize, usize, f64)> = pool.install(|| {
            pairs
                .into_par_iter()
                .map(|(i, j)| (i, j, avg_hausdorff(&tile_sets[i], &tile_sets[j], oracle)))
                .collect()
        });

        let mut matrix = Array2::<f64>::zeros((n, n));
        for (i, j, distance) in entries {
            matrix[[i, j]] = distance;
            matrix[[j, i]] = distance;
        }

        Self { matrix }
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.matrix[[i, j]]
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.matrix.nrows()
    }

    pub fn as_array(&self) -> &Array2<f64> {
        &self.matrix
    }

    /// Upper-triangle condensed form, row-major over `i < j`, the layout the
    /// hierarchical clusterer consumes (§4.4).
    pub fn condensed(&self) -> Vec<f64> {
        let n = self.size();
        let mut out = Vec::with_capacity(n * n.saturating_sub(1) / 2);
        for i in 0..n {
            for j in (i + 1)..n {
                out.push(self.matrix[[i, j]]);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Graph, UnitId};

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
    fn identical_sets_have_zero_distance() {
        let graph = path_graph(5);
        let oracle = DistanceOracle::build(&graph);
        assert_eq!(avg_hausdorff(&[0, 2, 4], &[0, 2, 4], &oracle), 0.0);
    }

    #[test]
    fn two_empty_maps_are_identical() {
        let graph = path_graph(5);
        let oracle = DistanceOracle::build(&graph);
        assert_eq!(avg_hausdorff(&[], &[], &oracle), 0.0);
    }

    #[test]
    fn empty_against_nonempty_is_sentinel() {
        let graph = path_graph(5);
        let oracle = DistanceOracle::build(&graph);
        assert_eq!(avg_hausdorff(&[], &[1], &oracle), oracle.sentinel() as f64);
    }

    #[test]
    fn symmetrization_takes_the_max_not_the_mean() {
        // directed_average(A->B) = 0 (tile 0 matches itself in B).
        // directed_average(B->A) = mean(d(0,0), d(4,0)) = mean(0, 4) = 2.
        // The maximum (2) must win; the mean of the two directions (1.0)
        // would be wrong.
        let graph = path_graph(5);
        let oracle = DistanceOracle::build(&graph);
        assert_eq!(avg_hausdorff(&[0], &[0, 4], &oracle), 2.0);
    }

    #[test]
    fn distance_is_symmetric() {
        let graph = path_graph(6);
        let oracle = DistanceOracle::build(&graph);
        let a = [0, 1];
        let b = [4, 5];
        assert_eq!(avg_hausdorff(&a, &b, &oracle), avg_hausdorff(&b, &a, &oracle));
    }

    #[test]
    fn condensed_matches_dense_upper_triangle() {
        let graph = path_graph(4);
        let oracle = DistanceOracle::build(&graph);
        let dir = tempfile::tempdir().unwrap();
        let table = crate::submissions::SubmissionTable::ingest_wide(&write_wide_csv(dir.path()), &graph).unwrap();

        let dissimilarity = Dissimilarity::compute(&table, &oracle);
        let condensed = dissimilarity.condensed();
        let mut k = 0;
        for i in 0..table.len() {
            for j in (i + 1)..table.len() {
                assert_eq!(condensed[k], dissimilarity.get(i, j));
                k += 1;
            }
        }
    }

    #[test]
    fn thread_count_does_not_affect_the_result() {
        let graph = path_graph(4);
        let oracle = DistanceOracle::build(&graph);
        let dir = tempfile::tempdir().unwrap();
        let table = crate::submissions::SubmissionTable::ingest_wide(&write_wide_csv(dir.path()), &graph).unwrap();

        let single = Dissimilarity::compute_with_threads(&table, &oracle, 1);
        let parallel = Dissimilarity::compute_with_threads(&table, &oracle, 4);
        assert_eq!(single.as_array(), parallel.as_array());
    }

    fn write_wide_csv(dir: &std::path::Path) -> std::path::PathBuf {
        use std::io::Write;
        let path = dir.join("wide.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "id,submission_id,datetime,0,1,2,3").unwrap();
        writeln!(file, "a,s1,2020-01-01,1,0,0,1").unwrap();
        writeln!(file, "b,s2,2020-01-02,0,1,1,0").unwrap();
        writeln!(file, "c,s3,2020-01-03,1,1,0,0").unwrap();
        path
    }
}
