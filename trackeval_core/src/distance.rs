//! Track-to-track distance under a spatial gate.
//!
//! # Cost laws
//! With `g` the gate and `dur(s) = last.t - first.t + 1`:
//! - no candidate (dummy), or no temporal overlap:
//!   `g · dur(ref)` (Euclidean) or `dur(ref)` (Matching);
//! - otherwise every frame covered by only one of the two segments costs
//!   `g` (resp. 1), every overlap frame costs its detection distance when
//!   matched (resp. 0) and `g` (resp. 1) when not.
//!
//! A frame matches when the candidate point is `Real` and strictly closer
//! than the gate. The dummy cost is therefore an upper bound on the cost of
//! any candidate that spans the reference exactly.

use crate::types::TrackSegment;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Cost model used to compare two tracks.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum DistanceType {
    /// Gated Euclidean distance: matched frames cost their distance,
    /// everything else costs the gate.
    #[default]
    Euclidean,
    /// Binary penalty: 0 for a matched frame, 1 otherwise.
    Matching,
}

impl DistanceType {
    /// Cost of one frame that is not matched.
    fn frame_penalty(self, gate: f64) -> f64 {
        match self {
            DistanceType::Euclidean => gate,
            DistanceType::Matching => 1.0,
        }
    }
}

impl fmt::Display for DistanceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DistanceType::Euclidean => write!(f, "euclidean"),
            DistanceType::Matching => write!(f, "matching"),
        }
    }
}

impl FromStr for DistanceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "euclidean" | "euclidian" => Ok(DistanceType::Euclidean),
            "matching" => Ok(DistanceType::Matching),
            other => Err(format!("unknown distance type '{other}'")),
        }
    }
}

/// Cost and matching statistics between a reference and a candidate track.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrackDistance {
    /// Total association cost
    pub cost: f64,
    /// True if at least one frame matched
    pub is_matching: bool,
    pub first_matching_time: Option<u32>,
    pub last_matching_time: Option<u32>,
    /// Reference frames paired with a candidate detection
    pub num_matched: u32,
    /// Reference frames left without a candidate detection
    pub num_unmatched: u32,
    /// Real candidate detections not explained by the reference
    pub num_wrong: u32,
    /// Sum of matched detection distances
    pub sum_distance: f64,
    /// Sum of squared matched detection distances
    pub sum_sq_distance: f64,
    pub min_distance: Option<f64>,
    pub max_distance: Option<f64>,
}

impl TrackDistance {
    fn unmatched(cost: f64, num_unmatched: u32, num_wrong: u32) -> Self {
        Self {
            cost,
            is_matching: false,
            first_matching_time: None,
            last_matching_time: None,
            num_matched: 0,
            num_unmatched,
            num_wrong,
            sum_distance: 0.0,
            sum_sq_distance: 0.0,
            min_distance: None,
            max_distance: None,
        }
    }

    fn record_match(&mut self, t: u32, d: f64) {
        if self.first_matching_time.is_none() {
            self.first_matching_time = Some(t);
        }
        self.last_matching_time = Some(t);
        self.is_matching = true;
        self.num_matched += 1;
        self.sum_distance += d;
        self.sum_sq_distance += d * d;
        self.min_distance = Some(self.min_distance.map_or(d, |m| m.min(d)));
        self.max_distance = Some(self.max_distance.map_or(d, |m| m.max(d)));
    }
}

/// Cost of leaving `reference` without a candidate.
pub fn dummy_cost(reference: &TrackSegment, distance_type: DistanceType, gate: f64) -> f64 {
    distance_type.frame_penalty(gate) * reference.duration() as f64
}

/// Compare `reference` with `candidate` (`None` or empty = dummy track).
///
/// Never fails: every combination of overlap and distance yields a finite
/// cost for a finite gate.
pub fn evaluate(
    reference: &TrackSegment,
    candidate: Option<&TrackSegment>,
    distance_type: DistanceType,
    gate: f64,
) -> TrackDistance {
    let ref_duration = reference.duration();
    let no_match_cost = dummy_cost(reference, distance_type, gate);

    let (cand, t0_r, tend_r, t0_c, tend_c) = match (
        candidate.filter(|c| !c.is_empty()),
        reference.start(),
        reference.end(),
    ) {
        (Some(c), Some(t0_r), Some(tend_r)) => match (c.start(), c.end()) {
            (Some(t0_c), Some(tend_c)) => (c, t0_r, tend_r, t0_c, tend_c),
            _ => return TrackDistance::unmatched(no_match_cost, ref_duration, 0),
        },
        _ => return TrackDistance::unmatched(no_match_cost, ref_duration, 0),
    };

    let first_t = t0_r.max(t0_c);
    let end_t = tend_r.min(tend_c);
    if first_t > end_t {
        return TrackDistance::unmatched(no_match_cost, ref_duration, cand.duration());
    }

    let penalty = distance_type.frame_penalty(gate);
    let leading_missed = t0_c.saturating_sub(t0_r);
    let trailing_missed = tend_r.saturating_sub(tend_c);
    let leading_extra = t0_r.saturating_sub(t0_c);
    let trailing_extra = tend_c.saturating_sub(tend_r);

    let uncovered = leading_missed + trailing_missed + leading_extra + trailing_extra;
    let mut out = TrackDistance::unmatched(
        penalty * uncovered as f64,
        leading_missed + trailing_missed,
        leading_extra + trailing_extra,
    );

    for t in first_t..=end_t {
        // Both segments are contiguous, so every overlap frame is present.
        let (Some(dr), Some(dc)) = (reference.at_time(t), cand.at_time(t)) else {
            out.num_unmatched += 1;
            out.cost += penalty;
            continue;
        };
        let d = dr.distance(dc);
        if dc.is_real() && d < gate {
            out.record_match(t, d);
            if distance_type == DistanceType::Euclidean {
                out.cost += d;
            }
        } else {
            if dc.is_real() {
                out.num_wrong += 1;
            }
            out.num_unmatched += 1;
            out.cost += penalty;
        }
    }

    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DetectionPoint;
    use approx::assert_abs_diff_eq;

    fn track_at(t0: u32, t1: u32, x: f64) -> TrackSegment {
        TrackSegment::from_detections((t0..=t1).map(|t| DetectionPoint::new(x, 0.0, 0.0, t)))
            .unwrap()
    }

    #[test]
    fn dummy_cost_law() {
        let reference = track_at(3, 9, 0.0);
        let e = evaluate(&reference, None, DistanceType::Euclidean, 2.5);
        assert_abs_diff_eq!(e.cost, 2.5 * 7.0, epsilon = 1e-12);
        assert!(!e.is_matching);
        assert_eq!(e.num_unmatched, 7);
        assert_eq!(e.num_matched, 0);
        assert_eq!(e.num_wrong, 0);

        let m = evaluate(&reference, Some(&TrackSegment::new()), DistanceType::Matching, 2.5);
        assert_abs_diff_eq!(m.cost, 7.0, epsilon = 1e-12);
        assert!(!m.is_matching);
    }

    #[test]
    fn shifted_track_matches_on_overlap() {
        // Reference t=0..4, candidate t=1..5, identical positions.
        let reference = track_at(0, 4, 0.0);
        let candidate = track_at(1, 5, 0.0);
        let d = evaluate(&reference, Some(&candidate), DistanceType::Euclidean, 1.0);

        assert!(d.is_matching);
        assert_eq!(d.first_matching_time, Some(1));
        assert_eq!(d.last_matching_time, Some(4));
        assert_eq!(d.num_matched, 4);
        // t=0 missed by the candidate, t=5 extra in the candidate
        assert_eq!(d.num_unmatched, 1);
        assert_eq!(d.num_wrong, 1);
        assert_abs_diff_eq!(d.cost, 2.0, epsilon = 1e-12);
        assert_eq!(d.min_distance, Some(0.0));
        assert_eq!(d.max_distance, Some(0.0));
    }

    #[test]
    fn gate_is_strict() {
        let reference = track_at(0, 0, 0.0);
        let at_gate = track_at(0, 0, 1.0);
        let d = evaluate(&reference, Some(&at_gate), DistanceType::Euclidean, 1.0);
        assert!(!d.is_matching);
        assert_eq!(d.num_wrong, 1);
        assert_abs_diff_eq!(d.cost, 1.0, epsilon = 1e-12);

        let inside = track_at(0, 0, 1.0 - 1e-9);
        let d = evaluate(&reference, Some(&inside), DistanceType::Euclidean, 1.0);
        assert!(d.is_matching);
        assert_abs_diff_eq!(d.cost, 1.0 - 1e-9, epsilon = 1e-12);
    }

    #[test]
    fn disjoint_tracks_cost_like_dummy() {
        let reference = track_at(0, 3, 0.0);
        let candidate = track_at(10, 14, 0.0);
        let d = evaluate(&reference, Some(&candidate), DistanceType::Euclidean, 3.0);
        assert!(!d.is_matching);
        assert_abs_diff_eq!(d.cost, 12.0, epsilon = 1e-12);
        assert_eq!(d.num_unmatched, 4);
        assert_eq!(d.num_wrong, 5);
    }

    #[test]
    fn matching_type_counts_frames() {
        let reference = track_at(0, 5, 0.0);
        // frames 0..=2 within gate, 3..=5 far away
        let candidate = TrackSegment::from_detections((0..=5).map(|t| {
            let x = if t < 3 { 0.5 } else { 10.0 };
            DetectionPoint::new(x, 0.0, 0.0, t)
        }))
        .unwrap();
        let d = evaluate(&reference, Some(&candidate), DistanceType::Matching, 1.0);
        assert!(d.is_matching);
        assert_abs_diff_eq!(d.cost, 3.0, epsilon = 1e-12);
        assert_eq!(d.num_matched, 3);
        assert_eq!(d.num_unmatched, 3);
        assert_eq!(d.num_wrong, 3);
        assert_abs_diff_eq!(d.sum_distance, 1.5, epsilon = 1e-12);
        assert_abs_diff_eq!(d.sum_sq_distance, 0.75, epsilon = 1e-12);
        assert_eq!(d.last_matching_time, Some(2));
    }

    #[test]
    fn virtual_points_are_charged_but_not_wrong() {
        let reference = track_at(0, 2, 0.0);
        let candidate = TrackSegment::from_detections([
            DetectionPoint::new(0.1, 0.0, 0.0, 0),
            DetectionPoint::new_virtual(0.1, 0.0, 0.0, 1),
            DetectionPoint::new(0.1, 0.0, 0.0, 2),
        ])
        .unwrap();
        let d = evaluate(&reference, Some(&candidate), DistanceType::Euclidean, 1.0);
        assert_eq!(d.num_matched, 2);
        assert_eq!(d.num_unmatched, 1);
        assert_eq!(d.num_wrong, 0);
        assert_abs_diff_eq!(d.cost, 0.1 + 1.0 + 0.1, epsilon = 1e-12);
    }

    #[test]
    fn statistics_track_min_and_max() {
        let reference = track_at(0, 2, 0.0);
        let candidate = TrackSegment::from_detections([
            DetectionPoint::new(0.3, 0.0, 0.0, 0),
            DetectionPoint::new(0.1, 0.0, 0.0, 1),
            DetectionPoint::new(0.7, 0.0, 0.0, 2),
        ])
        .unwrap();
        let d = evaluate(&reference, Some(&candidate), DistanceType::Euclidean, 1.0);
        assert_abs_diff_eq!(d.min_distance.unwrap(), 0.1, epsilon = 1e-12);
        assert_abs_diff_eq!(d.max_distance.unwrap(), 0.7, epsilon = 1e-12);
    }

    #[test]
    fn distance_type_parses() {
        assert_eq!("Euclidean".parse::<DistanceType>(), Ok(DistanceType::Euclidean));
        assert_eq!("matching".parse::<DistanceType>(), Ok(DistanceType::Matching));
        assert!("manhattan".parse::<DistanceType>().is_err());
    }
}
