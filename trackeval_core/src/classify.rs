//! Recovered / missed / correct / spurious classification of a matching.

use crate::{
    error::Result,
    matcher::{pair_tracks, MatcherConfig},
    pair::TrackPair,
    types::{SegmentId, TrackSegment},
};
use serde::{Deserialize, Serialize};

/// Outcome of matching a candidate track set against a reference set.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    /// References paired with a real candidate
    pub recovered: Vec<SegmentId>,
    /// References paired with the dummy
    pub missed: Vec<SegmentId>,
    /// Candidates selected by some reference
    pub correct: Vec<SegmentId>,
    /// Candidates never selected, ascending
    pub spurious: Vec<SegmentId>,
    /// One resolved pair per reference, by reference index
    pub pairs: Vec<TrackPair>,
}

impl Classification {
    /// Build the four lists from resolved pairs over `n_candidates` candidates.
    pub fn from_pairs(pairs: Vec<TrackPair>, n_candidates: usize) -> Self {
        let mut out = Classification::default();
        let mut selected = vec![false; n_candidates];

        for pair in &pairs {
            match pair.candidate {
                Some(c) => {
                    out.recovered.push(pair.reference);
                    out.correct.push(c);
                    if let Some(flag) = selected.get_mut(c.0) {
                        *flag = true;
                    }
                }
                None => out.missed.push(pair.reference),
            }
        }
        out.spurious = selected
            .iter()
            .enumerate()
            .filter(|(_, &s)| !s)
            .map(|(j, _)| SegmentId(j))
            .collect();
        out.pairs = pairs;
        out
    }

    pub fn num_recovered(&self) -> usize {
        self.recovered.len()
    }

    pub fn num_missed(&self) -> usize {
        self.missed.len()
    }

    pub fn num_spurious(&self) -> usize {
        self.spurious.len()
    }
}

/// Match `candidates` against `references` and classify every track.
pub fn classify(
    references: &[TrackSegment],
    candidates: &[TrackSegment],
    config: &MatcherConfig,
) -> Result<Classification> {
    let pairs = pair_tracks(references, candidates, config)?;
    Ok(Classification::from_pairs(pairs, candidates.len()))
}
