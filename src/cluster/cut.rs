use ahash::AHashMap;

use super::dendrogram::Dendrogram;

/// Union-find over dendrogram labels, used to flatten a set of "keep below
/// this merge" steps into a partition of the original observations.
struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(n: usize) -> Self {
        Self { parent: (0..n).collect() }
    }

    fn find(&mut self, x: usize) -> usize {
        if self.parent[x] != x {
            self.parent[x] = self.find(self.parent[x]);
        }
        self.parent[x]
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            self.parent[ra] = rb;
        }
    }
}

/// Flattens a dendrogram into observation labels by applying every merge
/// step whose `include` predicate holds, then assigning each observation a
/// dense `0..k` cluster id ordered by first appearance.
fn flatten(dendrogram: &Dendrogram, include: impl Fn(&super::dendrogram::Step) -> bool) -> Vec<usize> {
    let n = dendrogram.observations();
    let mut sets = DisjointSet::new(n);

    for step in dendrogram.steps() {
        if !include(step) {
            continue;
        }
        // cluster1/cluster2 may themselves be merged clusters; find a
        // representative leaf for each so the union acts on real observations.
        let rep1 = representative(dendrogram, step.cluster1);
        let rep2 = representative(dendrogram, step.cluster2);
        sets.union(rep1, rep2);
    }

    let mut label_of: AHashMap<usize, usize> = AHashMap::new();
    let mut labels = Vec::with_capacity(n);
    for i in 0..n {
        let root = sets.find(i);
        let next = label_of.len();
        let label = *label_of.entry(root).or_insert(next);
        labels.push(label);
    }
    labels
}

/// Any observation index folded into dendrogram label `label`, used to pick
/// a union-find representative for a merged cluster.
fn representative(dendrogram: &Dendrogram, label: usize) -> usize {
    let n = dendrogram.observations();
    let mut current = label;
    while current >= n {
        current = dendrogram.steps()[current - n].cluster1;
    }
    current
}

/// Cuts the dendrogram at a given height threshold: items are in the same
/// label iff they are joined by merges at height strictly less than `h`
/// (§4.4). A merge at exactly `h` is left uncut.
pub fn cut_by_height(dendrogram: &Dendrogram, max_height: f64) -> Vec<usize> {
    flatten(dendrogram, |step| step.height < max_height)
}

/// Cuts the dendrogram at the smallest height that yields at most
/// `target_count` clusters (clamped to `[1, N]`). Per §4.4, when the
/// dendrogram can't achieve exactly `target_count` because several merges
/// happen at the same height, this returns the first cut with no more than
/// `target_count` clusters rather than splitting a tied group to hit the
/// count exactly.
pub fn cut_by_count(dendrogram: &Dendrogram, target_count: usize) -> Vec<usize> {
    let n = dendrogram.observations();
    let target = target_count.clamp(1, n.max(1));
    let merges_to_apply = n.saturating_sub(target);

    if merges_to_apply == 0 {
        return flatten(dendrogram, |_| false);
    }

    // `dendrogram.steps()` is already in non-decreasing height order because
    // complete linkage only ever merges the globally closest pair remaining.
    // Cutting by the height of the `merges_to_apply`-th merge (rather than by
    // its position) keeps every merge tied with it on the same side of the
    // cut, so simultaneous merges at one height are never split apart.
    let threshold = dendrogram.steps()[merges_to_apply - 1].height;
    flatten(dendrogram, |step| step.height <= threshold)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn condensed_from_dense(dense: &[Vec<f64>]) -> Vec<f64> {
        let n = dense.len();
        let mut out = Vec::new();
        for i in 0..n {
            for j in (i + 1)..n {
                out.push(dense[i][j]);
            }
        }
        out
    }

    fn two_pairs() -> Dendrogram {
        let dense = vec![
            vec![0.0, 1.0, 9.0, 9.0],
            vec![1.0, 0.0, 9.0, 9.0],
            vec![9.0, 9.0, 0.0, 2.0],
            vec![9.0, 9.0, 2.0, 0.0],
        ];
        Dendrogram::complete_linkage(4, &condensed_from_dense(&dense))
    }

    #[test]
    fn cut_by_height_below_first_merge_leaves_singletons() {
        let dendrogram = two_pairs();
        let labels = cut_by_height(&dendrogram, 0.5);
        assert_eq!(labels.iter().collect::<std::collections::HashSet<_>>().len(), 4);
    }

    #[test]
    fn cut_by_height_between_merges_groups_the_close_pairs() {
        let dendrogram = two_pairs();
        let labels = cut_by_height(&dendrogram, 1.5);
        assert_eq!(labels[0], labels[1]);
        assert_ne!(labels[0], labels[2]);
        assert_ne!(labels[2], labels[3]);
    }

    #[test]
    fn cut_by_height_above_last_merge_is_one_cluster() {
        let dendrogram = two_pairs();
        let labels = cut_by_height(&dendrogram, 100.0);
        assert_eq!(labels.iter().collect::<std::collections::HashSet<_>>().len(), 1);
    }

    #[test]
    fn cut_by_count_one_is_everything_together() {
        let dendrogram = two_pairs();
        let labels = cut_by_count(&dendrogram, 1);
        assert_eq!(labels.iter().collect::<std::collections::HashSet<_>>().len(), 1);
    }

    #[test]
    fn cut_by_count_n_is_all_singletons() {
        let dendrogram = two_pairs();
        let labels = cut_by_count(&dendrogram, 4);
        assert_eq!(labels.iter().collect::<std::collections::HashSet<_>>().len(), 4);
    }

    #[test]
    fn cut_by_count_clamps_out_of_range_targets() {
        let dendrogram = two_pairs();
        assert_eq!(cut_by_count(&dendrogram, 0), cut_by_count(&dendrogram, 1));
        assert_eq!(cut_by_count(&dendrogram, 100), cut_by_count(&dendrogram, 4));
    }

    #[test]
    fn cut_by_count_does_not_split_a_tied_merge_height() {
        // {0,1} and {2,3} both merge at height 1.0, then those two clusters
        // merge at height 9.0. Asking for k=3 can't be hit exactly: the
        // threshold cut must include both height-1.0 merges together,
        // leaving 2 clusters rather than splitting the tie to land on 3.
        let dense = vec![
            vec![0.0, 1.0, 9.0, 9.0],
            vec![1.0, 0.0, 9.0, 9.0],
            vec![9.0, 9.0, 0.0, 1.0],
            vec![9.0, 9.0, 1.0, 0.0],
        ];
        let dendrogram = Dendrogram::complete_linkage(4, &condensed_from_dense(&dense));
        assert_eq!(dendrogram.steps()[0].height, 1.0);
        assert_eq!(dendrogram.steps()[1].height, 1.0);

        let labels = cut_by_count(&dendrogram, 3);
        assert_eq!(labels[0], labels[1]);
        assert_eq!(labels[2], labels[3]);
        assert_ne!(labels[0], labels[2]);
        assert_eq!(labels.iter().collect::<std::collections::HashSet<_>>().len(), 2);
    }
}
