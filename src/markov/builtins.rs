use ndarray::Array2;
use rand::{Rng, RngCore};

use super::capability::{Accept, Constraint, Proposal, Score};
use super::state::ChainState;

/// Moves a single randomly-chosen observation to a different randomly-chosen
/// cluster.
pub struct SingleFlipProposal;

impl Proposal for SingleFlipProposal {
    fn propose(&self, current: &ChainState, score_fns: &[Box<dyn Score>], rng: &mut dyn RngCore) -> ChainState {
        assert!(current.num_clusters() > 1, "single-flip proposal needs at least two clusters");
        let doc = rng.random_range(0..current.num_docs());
        let current_cluster = current.assignment()[doc];
        let mut next_cluster = rng.random_range(0..current.num_clusters());
        while next_cluster == current_cluster {
            next_cluster = rng.random_range(0..current.num_clusters());
        }
        current.flip(&[(doc, next_cluster)], score_fns)
    }
}

/// Average pairwise matrix entry over every pair of observations within the
/// same cluster (including an observation with itself), summed across all
/// clusters and averaged over the total pair count.
pub struct IntraclusterScore {
    name: String,
    matrix: Array2<f64>,
}

impl IntraclusterScore {
    pub fn new(name: impl Into<String>, matrix: Array2<f64>) -> Self {
        Self { name: name.into(), matrix }
    }
}

impl Score for IntraclusterScore {
    fn name(&self) -> &str {
        &self.name
    }

    fn score(&self, state: &ChainState) -> f64 {
        let mut total = 0.0;
        let mut pairs = 0usize;
        for indices in state.partitions() {
            for &outer in indices {
                for &inner in indices {
                    total += self.matrix[[outer, inner]];
                    pairs += 1;
                }
            }
        }
        total / pairs.max(1) as f64
    }
}

/// Accepts based on a single named score. The improvement ratio `m` is
/// `proposed / current` when `flipped`, else `current / proposed`; an `m`
/// at or above 1 always accepts, otherwise accepts with probability
/// `exp(-beta * m)` when minimizing or `exp(-beta / m)` when maximizing
/// (§9 Open Question 1 — the asymmetry is the original's actual rule, not
/// a bug, so both branches are preserved rather than unified).
pub struct Accept1d {
    pub score: String,
    pub beta: f64,
    pub flipped: bool,
}

impl Accept for Accept1d {
    fn acceptance(&self, current: &ChainState, proposed: &ChainState) -> f64 {
        let m = if self.flipped {
            proposed.score(&self.score) / current.score(&self.score)
        } else {
            current.score(&self.score) / proposed.score(&self.score)
        };
        if m >= 1.0 {
            1.0
        } else if self.flipped {
            (-self.beta / m).exp()
        } else {
            (-self.beta * m).exp()
        }
    }
}

/// Accepts based on several named scores. Accepts unconditionally only if
/// every score's improvement ratio is at or above 1; otherwise accepts with
/// probability `exp(-beta / m)`, where `m` is the smallest improvement
/// ratio across all scores.
pub struct AcceptNd {
    pub scores: Vec<(String, bool)>,
    pub beta: f64,
}

impl Accept for AcceptNd {
    fn acceptance(&self, current: &ChainState, proposed: &ChainState) -> f64 {
        let min_ratio = self
            .scores
            .iter()
            .map(|(name, flipped)| {
                if *flipped {
                    proposed.score(name) / current.score(name)
                } else {
                    current.score(name) / proposed.score(name)
                }
            })
            .fold(f64::INFINITY, f64::min);
        if min_ratio >= 1.0 {
            1.0
        } else {
            (-self.beta / min_ratio).exp()
        }
    }
}

/// Biases the chain toward keeping every cluster at or above
/// `ideal_cluster_size`; below that, the acceptance probability scales
/// linearly with how far the smallest cluster falls short.
pub struct ClusterSizeSoftConstraint {
    pub ideal_cluster_size: f64,
}

impl Constraint for ClusterSizeSoftConstraint {
    fn acceptance(&self, proposed: &ChainState) -> f64 {
        let min_size = proposed.partitions().iter().map(|p| p.len()).min().unwrap_or(0) as f64;
        if min_size >= self.ideal_cluster_size {
            1.0
        } else {
            min_size / self.ideal_cluster_size
        }
    }
}
