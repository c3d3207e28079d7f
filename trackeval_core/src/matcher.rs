//! Global one-to-one pairing of reference tracks with candidate tracks.
//!
//! # Processing steps per call
//! 1. Validate the config and reject empty reference tracks
//! 2. For each reference × candidate: evaluate the track distance and keep
//!    the pairs that match on at least one frame, plus the dummy pair
//! 3. Partition the feasible pairs into connected clusters (union-find)
//! 4. Solve each cluster with Kuhn-Munkres
//! 5. Map every selected cell back to its stored pair
//!
//! All working state lives inside the call.

use crate::{
    association::{partition_clusters, Cluster},
    distance::{evaluate, DistanceType},
    error::{MatchError, Result},
    hungarian,
    pair::TrackPair,
    types::{SegmentId, TrackSegment},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Configuration for the track matcher.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Maximum distance for two detections to match (exclusive).
    /// Default: 5.0, the pixel gate of the ISBI particle tracking challenge.
    pub gate: f64,
    pub distance_type: DistanceType,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            gate: 5.0,
            distance_type: DistanceType::Euclidean,
        }
    }
}

impl MatcherConfig {
    pub fn new(gate: f64, distance_type: DistanceType) -> Self {
        Self {
            gate,
            distance_type,
        }
    }

    /// The gate must be a positive finite distance.
    pub fn validate(&self) -> Result<()> {
        if self.gate.is_finite() && self.gate > 0.0 {
            Ok(())
        } else {
            Err(MatchError::InvalidGate(self.gate))
        }
    }
}

// ---------------------------------------------------------------------------
// Feasible pairs
// ---------------------------------------------------------------------------

/// Every candidate that matches `reference` on at least one frame, in
/// candidate order, followed by the dummy pair.
pub fn feasible_pairs(
    reference_id: SegmentId,
    reference: &TrackSegment,
    candidates: &[TrackSegment],
    config: &MatcherConfig,
) -> Vec<TrackPair> {
    let mut pairs: Vec<TrackPair> = candidates
        .iter()
        .enumerate()
        .filter_map(|(j, cand)| {
            let distance = evaluate(reference, Some(cand), config.distance_type, config.gate);
            distance
                .is_matching
                .then(|| TrackPair::new(reference_id, Some(SegmentId(j)), distance))
        })
        .collect();

    pairs.push(TrackPair::new(
        reference_id,
        None,
        evaluate(reference, None, config.distance_type, config.gate),
    ));
    pairs
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

/// Pair every reference with at most one candidate so that the total cost
/// is minimal and no real candidate is used twice.
///
/// Returns exactly one pair per reference, ordered by reference index.
pub fn pair_tracks(
    references: &[TrackSegment],
    candidates: &[TrackSegment],
    config: &MatcherConfig,
) -> Result<Vec<TrackPair>> {
    config.validate()?;
    if let Some(i) = references.iter().position(TrackSegment::is_empty) {
        return Err(MatchError::EmptyReference(SegmentId(i)));
    }

    let feasible: Vec<Vec<TrackPair>> = references
        .iter()
        .enumerate()
        .map(|(i, reference)| feasible_pairs(SegmentId(i), reference, candidates, config))
        .collect();

    let clusters = partition_clusters(candidates.len(), &feasible)?;
    debug!(
        references = references.len(),
        candidates = candidates.len(),
        clusters = clusters.len(),
        "partitioned track pairs"
    );

    let mut resolved = Vec::with_capacity(references.len());
    for cluster in &clusters {
        resolved.extend(solve_cluster(cluster, &feasible)?);
    }
    resolved.sort_by_key(|p| p.reference);

    debug_assert_eq!(resolved.len(), references.len());
    Ok(resolved)
}

fn solve_cluster(cluster: &Cluster, feasible: &[Vec<TrackPair>]) -> Result<Vec<TrackPair>> {
    let costs = cluster.cost_matrix(feasible);
    debug!(
        rows = costs.nrows(),
        cols = costs.ncols(),
        "solving cluster"
    );
    let assignment = hungarian::solve(&costs)?;

    assignment
        .iter()
        .enumerate()
        .map(|(row, &column)| {
            let reference = SegmentId(cluster.references[row]);
            let missing = MatchError::MissingPair { reference, column };
            let candidate = cluster.candidate_at(row, column).ok_or(missing.clone())?;
            let pair = feasible[reference.0]
                .iter()
                .find(|p| p.candidate == candidate)
                .cloned()
                .ok_or(missing)?;
            trace!(%reference, ?candidate, cost = pair.cost(), "assigned");
            Ok(pair)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
