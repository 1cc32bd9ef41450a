use std::collections::HashSet;

use ahash::AHashMap;
use rand::Rng;

use super::capability::Score;

/// A state of a clustering Markov chain: which cluster each observation
/// belongs to, plus every registered score evaluated against that
/// assignment (§4.5).
#[derive(Debug, Clone)]
pub struct ChainState {
    partitions: Vec<HashSet<usize>>,
    assignment: Vec<usize>,
    scores: AHashMap<String, f64>,
}

impl ChainState {
    pub fn partitions(&self) -> &[HashSet<usize>] {
        &self.partitions
    }

    pub fn assignment(&self) -> &[usize] {
        &self.assignment
    }

    pub fn num_docs(&self) -> usize {
        self.assignment.len()
    }

    pub fn num_clusters(&self) -> usize {
        self.partitions.len()
    }

    /// The value of the named score as last evaluated for this state.
    ///
    /// # Panics
    ///
    /// Panics if `name` was not among the score functions the state was
    /// built with.
    pub fn score(&self, name: &str) -> f64 {
        self.scores[name]
    }

    fn with_scores(partitions: Vec<HashSet<usize>>, assignment: Vec<usize>, score_fns: &[Box<dyn Score>]) -> Self {
        let base = Self { partitions, assignment, scores: AHashMap::new() };
        let mut scores = AHashMap::new();
        for score_fn in score_fns {
            scores.insert(score_fn.name().to_string(), score_fn.score(&base));
        }
        Self { scores, ..base }
    }

    /// Generates a uniformly random assignment of `num_docs` observations
    /// into `num_clusters` clusters.
    pub fn random<R: Rng + ?Sized>(
        num_docs: usize,
        num_clusters: usize,
        score_fns: &[Box<dyn Score>],
        rng: &mut R,
    ) -> Self {
        assert!(num_clusters > 0, "num_clusters must be positive");
        let assignment: Vec<usize> = (0..num_docs).map(|_| rng.random_range(0..num_clusters)).collect();
        let mut partitions = vec![HashSet::new(); num_clusters];
        for (doc, &cluster) in assignment.iter().enumerate() {
            partitions[cluster].insert(doc);
        }
        Self::with_scores(partitions, assignment, score_fns)
    }

    /// Returns a new state with every `(doc, new_cluster)` move in `moves`
    /// applied: each index's old label loses it, its new label gains it, and
    /// every registered score is recomputed against the result (§4.5).
    pub fn flip(&self, moves: &[(usize, usize)], score_fns: &[Box<dyn Score>]) -> Self {
        let mut partitions = self.partitions.clone();
        let mut assignment = self.assignment.clone();
        for &(doc, new_cluster) in moves {
            let old_cluster = assignment[doc];
            partitions[old_cluster].remove(&doc);
            partitions[new_cluster].insert(doc);
            assignment[doc] = new_cluster;
        }
        Self::with_scores(partitions, assignment, score_fns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn no_scores() -> Vec<Box<dyn Score>> {
        Vec::new()
    }

    #[test]
    fn random_assigns_every_doc_to_some_cluster() {
        let mut rng = StdRng::seed_from_u64(7);
        let state = ChainState::random(10, 3, &no_scores(), &mut rng);
        assert_eq!(state.assignment().len(), 10);
        let total: usize = state.partitions().iter().map(HashSet::len).sum();
        assert_eq!(total, 10);
    }

    #[test]
    fn flip_moves_doc_between_partitions() {
        let mut rng = StdRng::seed_from_u64(1);
        let state = ChainState::random(5, 2, &no_scores(), &mut rng);
        let old_cluster = state.assignment()[0];
        let new_cluster = 1 - old_cluster;
        let flipped = state.flip(&[(0, new_cluster)], &no_scores());
        assert_eq!(flipped.assignment()[0], new_cluster);
        assert!(!flipped.partitions()[old_cluster].contains(&0));
        assert!(flipped.partitions()[new_cluster].contains(&0));
    }

    #[test]
    fn flip_applies_multiple_moves_atomically() {
        let mut rng = StdRng::seed_from_u64(2);
        let state = ChainState::random(6, 3, &no_scores(), &mut rng);
        let moves: Vec<(usize, usize)> =
            (0..6).map(|doc| (doc, (state.assignment()[doc] + 1) % 3)).collect();
        let flipped = state.flip(&moves, &no_scores());
        for &(doc, new_cluster) in &moves {
            assert_eq!(flipped.assignment()[doc], new_cluster);
        }
        let total: usize = flipped.partitions().iter().map(HashSet::len).sum();
        assert_eq!(total, 6);
    }
}
