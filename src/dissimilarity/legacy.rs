use ndarray::Array2;

use crate::graph::DistanceOracle;

/// Solves a square minimum-cost assignment problem with the Hungarian
/// algorithm (Kuhn-Munkres, potentials formulation). `cost` is `n x n`.
/// Returns the column matched to each row and the total matched cost.
fn hungarian(cost: &Array2<f64>) -> (Vec<usize>, f64) {
    let n = cost.nrows();
    assert_eq!(n, cost.ncols(), "hungarian() requires a square cost matrix");

    const INF: f64 = f64::INFINITY;
    let mut u = vec![0.0; n + 1];
    let mut v = vec![0.0; n + 1];
    let mut p = vec![0usize; n + 1]; // p[j] = row matched to column j, 1-indexed; 0 = unmatched
    let mut way = vec![0usize; n + 1];

    for i in 1..=n {
        p[0] = i;
        let mut j0 = 0usize;
        let mut minv = vec![INF; n + 1];
        let mut used = vec![false; n + 1];

        loop {
            used[j0] = true;
            let i0 = p[j0];
            let mut delta = INF;
            let mut j1 = 0usize;
            for j in 1..=n {
                if used[j] {
                    continue;
                }
                let cur = cost[[i0 - 1, j - 1]] - u[i0] - v[j];
                if cur < minv[j] {
                    minv[j] = cur;
                    way[j] = j0;
                }
                if minv[j] < delta {
                    delta = minv[j];
                    j1 = j;
                }
            }
            for j in 0..=n {
                if used[j] {
                    u[p[j]] += delta;
                    v[j] -= delta;
                } else {
                    minv[j] -= delta;
                }
            }
            j0 = j1;
            if p[j0] == 0 {
                break;
            }
        }

        loop {
            let j1 = way[j0];
            p[j0] = p[j1];
            j0 = j1;
            if j0 == 0 {
                break;
            }
        }
    }

    let mut assignment = vec![0usize; n];
    for j in 1..=n {
        if p[j] != 0 {
            assignment[p[j] - 1] = j - 1;
        }
    }
    let total: f64 = (0..n).map(|i| cost[[i, assignment[i]]]).sum();
    (assignment, total)
}

/// The legacy matching-based map distance (§4.3, §9 Open Question 2): strips
/// units common to both maps, solves a one-to-one minimum-cost assignment
/// between what's left under the graph distance, adds the mean distance to
/// the other map for every unit the assignment couldn't match, and
/// normalizes by `|A| + |A ∩ B|` where `A` is the larger of the two maps.
///
/// The cost matrix is square at the size of the larger reduced map; columns
/// beyond the smaller map's size are padding, priced at `big_max` (the sum
/// of each row's real-entry maximum) so the solver only resorts to a padding
/// match once every real counterpart tile is spoken for.
pub fn matching_distance(a: &[usize], b: &[usize], oracle: &DistanceOracle) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    if a.is_empty() || b.is_empty() {
        return oracle.sentinel() as f64;
    }

    // `larger` holds at least as many tiles as `smaller`.
    let (larger, smaller) = if a.len() >= b.len() { (a, b) } else { (b, a) };

    let common: std::collections::HashSet<usize> =
        larger.iter().copied().filter(|u| smaller.contains(u)).collect();
    let reduced_larger: Vec<usize> = larger.iter().copied().filter(|u| !common.contains(u)).collect();
    let reduced_smaller: Vec<usize> = smaller.iter().copied().filter(|u| !common.contains(u)).collect();

    if reduced_larger.is_empty() {
        // The maps are equal as sets once duplicates drop out.
        return 0.0;
    }

    let num_rows = reduced_larger.len();
    let num_cols = reduced_smaller.len();

    let mut cost = Array2::<f64>::zeros((num_rows, num_rows));
    for (i, &x) in reduced_larger.iter().enumerate() {
        for (j, &y) in reduced_smaller.iter().enumerate() {
            cost[[i, j]] = oracle.get(x, y) as f64;
        }
    }
    let row_maxes: Vec<f64> = (0..num_rows)
        .map(|i| (0..num_cols).map(|j| cost[[i, j]]).fold(0.0_f64, f64::max))
        .collect();
    let big_max: f64 = row_maxes.iter().sum();
    for i in 0..num_rows {
        for j in num_cols..num_rows {
            cost[[i, j]] = big_max;
        }
    }

    let (assignment, _) = hungarian(&cost);
    let mut match_cost = 0.0;
    let mut unmatched_rows = Vec::new();
    for (i, &j) in assignment.iter().enumerate() {
        if j < num_cols {
            match_cost += cost[[i, j]];
        } else {
            unmatched_rows.push(i);
        }
    }

    let infinity_standin = oracle.sentinel() as f64;
    if match_cost >= infinity_standin {
        return infinity_standin;
    }

    for &i in &unmatched_rows {
        let x = reduced_larger[i];
        let mean_distance =
            smaller.iter().map(|&y| oracle.get(x, y) as f64).sum::<f64>() / smaller.len() as f64;
        match_cost += mean_distance;
    }

    match_cost / (num_rows as f64 + common.len() as f64)
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
    fn hungarian_solves_identity_matrix() {
        let cost = Array2::from_shape_vec((3, 3), vec![0.0, 5.0, 5.0, 5.0, 0.0, 5.0, 5.0, 5.0, 0.0]).unwrap();
        let (assignment, total) = hungarian(&cost);
        assert_eq!(assignment, vec![0, 1, 2]);
        assert_eq!(total, 0.0);
    }

    #[test]
    fn identical_tile_sets_have_zero_matching_distance() {
        let graph = path_graph(5);
        let oracle = DistanceOracle::build(&graph);
        assert_eq!(matching_distance(&[0, 2, 4], &[0, 2, 4], &oracle), 0.0);
    }

    #[test]
    fn matching_distance_is_symmetric() {
        let graph = path_graph(6);
        let oracle = DistanceOracle::build(&graph);
        let a = [0, 1, 2];
        let b = [3, 4];
        assert_eq!(matching_distance(&a, &b, &oracle), matching_distance(&b, &a, &oracle));
    }

    #[test]
    fn strips_common_units_and_adds_mean_distance_for_unmatched() {
        // A = {0, 1, 2}, B = {0, 3}; common = {0}, reduced A = {1, 2},
        // reduced B = {3}. One of {1, 2} matches tile 3 directly; the other
        // is priced at its mean distance to all of B (not just reduced B).
        // Divisor is |reduced A| + |common| = 2 + 1 = 3.
        let graph = path_graph(6);
        let oracle = DistanceOracle::build(&graph);
        let distance = matching_distance(&[0, 1, 2], &[0, 3], &oracle);
        assert!((distance - 2.5 / 3.0).abs() < 1e-9, "got {distance}");
    }

    #[test]
    fn common_units_make_equal_sets_distance_zero() {
        let graph = path_graph(4);
        let oracle = DistanceOracle::build(&graph);
        assert_eq!(matching_distance(&[0, 1], &[1, 0], &oracle), 0.0);
    }
}
