//! Compatibility graph clustering and per-cluster cost matrices.
//!
//! # Algorithm pipeline
//! 1. Every feasible (reference, candidate) pair is an edge of a bipartite
//!    graph. Dummy pairs add no edge.
//! 2. Connected components are found with union-find. Each component is an
//!    independent assignment sub-problem.
//! 3. Each component gets a dense cost matrix: one row per reference, one
//!    column per real candidate, then one private dummy column per
//!    reference. Cells without a stored pair cost more than any stored pair.

use crate::{
    error::{MatchError, Result},
    pair::TrackPair,
    types::SegmentId,
};
use nalgebra::DMatrix;

// ---------------------------------------------------------------------------
// Union-Find (path halving + union by rank)
// ---------------------------------------------------------------------------

struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, x: usize, y: usize) {
        let rx = self.find(x);
        let ry = self.find(y);
        if rx == ry {
            return;
        }
        match self.rank[rx].cmp(&self.rank[ry]) {
            std::cmp::Ordering::Less => self.parent[rx] = ry,
            std::cmp::Ordering::Greater => self.parent[ry] = rx,
            std::cmp::Ordering::Equal => {
                self.parent[ry] = rx;
                self.rank[rx] += 1;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Clusters
// ---------------------------------------------------------------------------

/// One connected component of the reference/candidate graph.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Cluster {
    /// Reference indices, ascending. Row `r` of the cost matrix.
    pub references: Vec<usize>,
    /// Real candidate indices, ascending. Column `c` of the cost matrix.
    pub candidates: Vec<usize>,
}

impl Cluster {
    /// Number of cost-matrix columns: real candidates plus one dummy per
    /// reference.
    pub fn num_columns(&self) -> usize {
        self.candidates.len() + self.references.len()
    }

    /// Column of `candidate` for the reference at `row`.
    pub fn column(&self, row: usize, candidate: Option<SegmentId>) -> Option<usize> {
        match candidate {
            Some(id) => self.candidates.binary_search(&id.0).ok(),
            None => (row < self.references.len()).then(|| self.candidates.len() + row),
        }
    }

    /// Candidate stored at `column` for the reference at `row`; `Some(None)`
    /// is that reference's dummy column.
    pub fn candidate_at(&self, row: usize, column: usize) -> Option<Option<SegmentId>> {
        if let Some(&j) = self.candidates.get(column) {
            return Some(Some(SegmentId(j)));
        }
        (column == self.candidates.len() + row).then_some(None)
    }

    /// Dense cost matrix over `feasible[reference]` for this cluster.
    pub fn cost_matrix(&self, feasible: &[Vec<TrackPair>]) -> DMatrix<f64> {
        let max_cost = self
            .references
            .iter()
            .flat_map(|&i| feasible[i].iter())
            .map(TrackPair::cost)
            .fold(0.0, f64::max);

        // Strictly above every stored cost, even where `max + 1` rounds to `max`.
        let filler = (max_cost + max_cost.max(1.0)).min(f64::MAX);
        let mut costs =
            DMatrix::from_element(self.references.len(), self.num_columns(), filler);
        for (row, &i) in self.references.iter().enumerate() {
            for pair in &feasible[i] {
                if let Some(col) = self.column(row, pair.candidate) {
                    costs[(row, col)] = pair.cost();
                }
            }
        }
        costs
    }
}

/// Partition references and candidates into independent clusters.
///
/// `feasible[i]` holds the feasible pairs of reference `i`, its dummy pair
/// included. Clusters are ordered by their first reference.
pub fn partition_clusters(
    n_candidates: usize,
    feasible: &[Vec<TrackPair>],
) -> Result<Vec<Cluster>> {
    let n_refs = feasible.len();
    let mut uf = UnionFind::new(n_refs + n_candidates);

    for (i, pairs) in feasible.iter().enumerate() {
        if pairs.is_empty() {
            return Err(MatchError::EmptyFeasibleSet(SegmentId(i)));
        }
        for cand in pairs.iter().filter_map(|p| p.candidate) {
            uf.union(i, n_refs + cand.0);
        }
    }

    let mut cluster_of_root: Vec<Option<usize>> = vec![None; n_refs + n_candidates];
    let mut clusters: Vec<Cluster> = Vec::new();

    for i in 0..n_refs {
        let root = uf.find(i);
        let idx = *cluster_of_root[root].get_or_insert_with(|| {
            clusters.push(Cluster::default());
            clusters.len() - 1
        });
        clusters[idx].references.push(i);
    }
    for j in 0..n_candidates {
        let root = uf.find(n_refs + j);
        if let Some(idx) = cluster_of_root[root] {
            clusters[idx].candidates.push(j);
        }
    }

    Ok(clusters)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::TrackDistance;

    fn pair(reference: usize, candidate: Option<usize>, cost: f64) -> TrackPair {
        TrackPair::new(
            SegmentId(reference),
            candidate.map(SegmentId),
            TrackDistance {
                cost,
                is_matching: candidate.is_some(),
                first_matching_time: None,
                last_matching_time: None,
                num_matched: 0,
                num_unmatched: 0,
                num_wrong: 0,
                sum_distance: 0.0,
                sum_sq_distance: 0.0,
                min_distance: None,
                max_distance: None,
            },
        )
    }

    #[test]
    fn partition_two_independent_clusters() {
        let feasible = vec![
            vec![pair(0, Some(0), 1.0), pair(0, None, 9.0)],
            vec![pair(1, Some(2), 2.0), pair(1, None, 9.0)],
        ];
        let clusters = partition_clusters(3, &feasible).unwrap();
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].references, vec![0]);
        assert_eq!(clusters[0].candidates, vec![0]);
        assert_eq!(clusters[1].references, vec![1]);
        assert_eq!(clusters[1].candidates, vec![2]);
    }

    #[test]
    fn shared_candidate_merges_transitively() {
        // 0 -- c1 -- 2 -- c3 -- 1
        let feasible = vec![
            vec![pair(0, Some(1), 1.0), pair(0, None, 5.0)],
            vec![pair(1, Some(3), 1.0), pair(1, None, 5.0)],
            vec![pair(2, Some(1), 1.0), pair(2, Some(3), 1.0), pair(2, None, 5.0)],
        ];
        let clusters = partition_clusters(4, &feasible).unwrap();
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].references, vec![0, 1, 2]);
        assert_eq!(clusters[0].candidates, vec![1, 3]);
    }

    #[test]
    fn dummies_do_not_merge() {
        let feasible = vec![vec![pair(0, None, 3.0)], vec![pair(1, None, 4.0)]];
        let clusters = partition_clusters(0, &feasible).unwrap();
        assert_eq!(clusters.len(), 2);
        assert!(clusters.iter().all(|c| c.candidates.is_empty()));
    }

    #[test]
    fn empty_feasible_set_is_an_error() {
        let feasible = vec![vec![pair(0, None, 3.0)], vec![]];
        let err = partition_clusters(0, &feasible).unwrap_err();
        assert_eq!(err, MatchError::EmptyFeasibleSet(SegmentId(1)));
    }

    #[test]
    fn cost_matrix_layout() {
        let feasible = vec![
            vec![pair(0, Some(4), 1.5), pair(0, None, 6.0)],
            vec![pair(1, Some(4), 2.5), pair(1, None, 8.0)],
        ];
        let clusters = partition_clusters(5, &feasible).unwrap();
        let cluster = &clusters[0];
        let costs = cluster.cost_matrix(&feasible);
        assert_eq!(costs.shape(), (2, 3));
        // columns: candidate 4, dummy of ref 0, dummy of ref 1
        assert_eq!(costs[(0, 0)], 1.5);
        assert_eq!(costs[(0, 1)], 6.0);
        assert_eq!(costs[(0, 2)], 16.0);
        assert_eq!(costs[(1, 0)], 2.5);
        assert_eq!(costs[(1, 1)], 16.0);
        assert_eq!(costs[(1, 2)], 8.0);

        assert_eq!(cluster.candidate_at(0, 0), Some(Some(SegmentId(4))));
        assert_eq!(cluster.candidate_at(1, 2), Some(None));
        assert_eq!(cluster.candidate_at(0, 2), None);
    }

    #[test]
    fn filler_dominates_costs_beyond_integer_precision() {
        // 2^53 + 1 rounds back to 2^53
        let big = 9.007_199_254_740_992e15;
        let feasible = vec![
            vec![pair(0, Some(0), big), pair(0, None, big)],
            vec![pair(1, Some(0), 1.0), pair(1, None, big)],
        ];
        let clusters = partition_clusters(1, &feasible).unwrap();
        let costs = clusters[0].cost_matrix(&feasible);
        assert!(costs[(0, 2)] > big);
        assert!(costs[(1, 1)] > big);
    }
}
