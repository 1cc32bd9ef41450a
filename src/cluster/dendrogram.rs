use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A single merge step in a dendrogram: by convention the smaller label is
/// always `cluster1`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub cluster1: usize,
    pub cluster2: usize,
    pub height: f64,
    pub size: usize,
}

impl Step {
    fn new(mut cluster1: usize, mut cluster2: usize, height: f64, size: usize) -> Self {
        if cluster2 < cluster1 {
            std::mem::swap(&mut cluster1, &mut cluster2);
        }
        Self { cluster1, cluster2, height, size }
    }
}

/// A complete-linkage agglomerative clustering of `N` observations, encoded
/// as `N - 1` merge steps. A cluster that merges one or more observations is
/// labeled `N + i`, where `i` is the step that created it (§4.4).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dendrogram {
    steps: Vec<Step>,
    observations: usize,
}

impl Dendrogram {
    pub fn observations(&self) -> usize {
        self.observations
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Number of observations folded into the cluster labeled `label`.
    pub fn cluster_size(&self, label: usize) -> usize {
        if label < self.observations {
            1
        } else {
            self.steps[label - self.observations].size
        }
    }

    /// Build a dendrogram from a condensed pairwise distance matrix
    /// (row-major over `i < j`, as produced by
    /// [`crate::dissimilarity::Dissimilarity::condensed`]) using complete
    /// linkage: the distance between two clusters is the maximum distance
    /// between any pair of their members.
    ///
    /// Ties in minimum distance are broken by the lexicographically smallest
    /// `(cluster1, cluster2)` pair, so the result is reproducible across
    /// runs and platforms regardless of floating-point merge order.
    pub fn complete_linkage(observations: usize, condensed: &[f64]) -> Self {
        assert_eq!(
            condensed.len(),
            observations * observations.saturating_sub(1) / 2,
            "condensed matrix length does not match observation count"
        );

        if observations <= 1 {
            return Self { steps: Vec::new(), observations };
        }

        let index = |i: usize, j: usize, n: usize| -> usize {
            let (i, j) = if i < j { (i, j) } else { (j, i) };
            n * i - i * (i + 1) / 2 + (j - i - 1)
        };

        // Active clusters keyed by their current label, each holding its
        // original member indices (for distance lookups) and pairwise
        // distances to every other active cluster.
        let mut members: BTreeMap<usize, Vec<usize>> =
            (0..observations).map(|i| (i, vec![i])).collect();
        let mut distances: BTreeMap<(usize, usize), f64> = BTreeMap::new();
        for i in 0..observations {
            for j in (i + 1)..observations {
                distances.insert((i, j), condensed[index(i, j, observations)]);
            }
        }

        let mut steps = Vec::with_capacity(observations - 1);
        let mut next_label = observations;

        while members.len() > 1 {
            let mut best: Option<(usize, usize, f64)> = None;
            for (&(a, b), &d) in distances.iter() {
                let better = match best {
                    None => true,
                    Some((_, _, bd)) => d < bd,
                };
                if better {
                    best = Some((a, b, d));
                }
            }
            let (a, b, height) = best.expect("at least two active clusters remain");

            let size = members[&a].len() + members[&b].len();
            steps.push(Step::new(a, b, height, size));

            let mut merged = members.remove(&a).unwrap();
            merged.extend(members.remove(&b).unwrap());

            distances.retain(|&(x, y), _| x != a && y != a && x != b && y != b);

            let new_label = next_label;
            next_label += 1;
            for (&other_label, other_members) in members.iter() {
                let complete = merged
                    .iter()
                    .flat_map(|&oi| other_members.iter().map(move |&oj| condensed[index(oi, oj, observations)]))
                    .fold(f64::NEG_INFINITY, f64::max);
                let key = if new_label < other_label { (new_label, other_label) } else { (other_label, new_label) };
                distances.insert(key, complete);
            }

            members.insert(new_label, merged);
        }

        Self { steps, observations }
    }
}
