//! Reference/candidate pairing produced by the matcher.

use crate::{distance::TrackDistance, types::SegmentId};
use serde::{Deserialize, Serialize};

/// A reference track associated with a candidate track, or with the dummy
/// "no match" track when `candidate` is `None`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrackPair {
    pub reference: SegmentId,
    pub candidate: Option<SegmentId>,
    pub distance: TrackDistance,
}

impl TrackPair {
    pub fn new(
        reference: SegmentId,
        candidate: Option<SegmentId>,
        distance: TrackDistance,
    ) -> Self {
        Self {
            reference,
            candidate,
            distance,
        }
    }

    pub fn cost(&self) -> f64 {
        self.distance.cost
    }

    /// True if the reference is paired with the dummy track.
    pub fn is_dummy(&self) -> bool {
        self.candidate.is_none()
    }

    pub fn first_matching_time(&self) -> Option<u32> {
        self.distance.first_matching_time
    }

    pub fn last_matching_time(&self) -> Option<u32> {
        self.distance.last_matching_time
    }
}
