//! Track-set scores: alpha/beta association quality, Jaccard similarities,
//! and matched localisation error.

use crate::{
    classify::Classification,
    distance::dummy_cost,
    matcher::MatcherConfig,
    types::TrackSegment,
};
use serde::{Deserialize, Serialize};

/// Scores of a candidate track set against a reference set.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackingScores {
    pub n_reference_tracks: usize,
    pub n_candidate_tracks: usize,
    /// Sum of reference track durations (frames)
    pub n_reference_detections: u64,
    /// Sum of candidate track durations (frames)
    pub n_candidate_detections: u64,

    pub n_paired_tracks: usize,
    pub n_missed_tracks: usize,
    pub n_spurious_tracks: usize,

    /// Reference frames matched by their paired candidate (TP)
    pub n_paired_detections: u64,
    /// Reference frames left unmatched (FN)
    pub n_missed_detections: u64,
    /// Candidate detections not explained by a reference (FP)
    pub n_wrong_detections: u64,

    /// 1 − d(X, Y) / d(X, ∅)
    pub alpha: f64,
    /// (d(X, ∅) − d(X, Y)) / (d(X, ∅) + d(Ȳ, ∅))
    pub beta: f64,
    /// TP / (TP + FN + FP)
    pub detection_jaccard: f64,
    /// correct / (correct + missed + spurious)
    pub track_jaccard: f64,

    pub rmse: f64,
    pub min_distance: f64,
    pub max_distance: f64,
    pub std_distance: f64,
}

fn ratio(num: f64, denom: f64) -> f64 {
    if denom == 0.0 { 0.0 } else { num / denom }
}

impl TrackingScores {
    pub fn compute(
        references: &[TrackSegment],
        candidates: &[TrackSegment],
        classification: &Classification,
        config: &MatcherConfig,
    ) -> Self {
        let dummy = |t: &TrackSegment| dummy_cost(t, config.distance_type, config.gate);

        let mut s = TrackingScores {
            n_reference_tracks: references.len(),
            n_candidate_tracks: candidates.len(),
            n_reference_detections: references.iter().map(|t| t.duration() as u64).sum(),
            n_candidate_detections: candidates.iter().map(|t| t.duration() as u64).sum(),
            n_paired_tracks: classification.correct.len(),
            n_missed_tracks: classification.missed.len(),
            n_spurious_tracks: classification.spurious.len(),
            ..Default::default()
        };

        let mut pair_cost = 0.0;
        let mut sum_d = 0.0;
        let mut sum_sq_d = 0.0;
        let mut min_d: Option<f64> = None;
        let mut max_d: Option<f64> = None;

        for pair in &classification.pairs {
            let d = &pair.distance;
            pair_cost += d.cost;
            s.n_paired_detections += u64::from(d.num_matched);
            s.n_missed_detections += u64::from(d.num_unmatched);
            if !pair.is_dummy() {
                s.n_wrong_detections += u64::from(d.num_wrong);
            }
            sum_d += d.sum_distance;
            sum_sq_d += d.sum_sq_distance;
            if let Some(m) = d.min_distance {
                min_d = Some(min_d.map_or(m, |x| x.min(m)));
            }
            if let Some(m) = d.max_distance {
                max_d = Some(max_d.map_or(m, |x| x.max(m)));
            }
        }

        let spurious: Vec<&TrackSegment> = classification
            .spurious
            .iter()
            .filter_map(|id| candidates.get(id.0))
            .collect();
        s.n_wrong_detections += spurious.iter().map(|t| t.num_real() as u64).sum::<u64>();

        // d(X, ∅) and d(Ȳ, ∅)
        let bound: f64 = references.iter().map(dummy).sum();
        let spurious_bound: f64 = spurious.iter().map(|t| dummy(t)).sum();

        s.alpha = if bound == 0.0 { 0.0 } else { 1.0 - pair_cost / bound };
        s.beta = ratio(bound - pair_cost, bound + spurious_bound);

        let tp = s.n_paired_detections as f64;
        s.detection_jaccard = ratio(tp, tp + (s.n_missed_detections + s.n_wrong_detections) as f64);
        s.track_jaccard = ratio(
            s.n_paired_tracks as f64,
            (s.n_paired_tracks + s.n_missed_tracks + s.n_spurious_tracks) as f64,
        );

        if s.n_paired_detections > 0 {
            let mean = sum_d / tp;
            let mean_sq = sum_sq_d / tp;
            s.rmse = mean_sq.sqrt();
            s.std_distance = (mean_sq - mean * mean).max(0.0).sqrt();
            s.min_distance = min_d.unwrap_or(0.0);
            s.max_distance = max_d.unwrap_or(0.0);
        }

        s
    }
}

/// Ensemble mean square displacement over `tracks`.
///
/// Element `k` is the mean over every track of `|p(t + k + 1) − p(t)|²`.
/// Lags no track spans are omitted.
pub fn mean_square_displacements(tracks: &[TrackSegment]) -> Vec<f64> {
    let max_lag = tracks.iter().map(TrackSegment::len).max().unwrap_or(0).saturating_sub(1);
    let mut sums = vec![0.0; max_lag];
    let mut counts = vec![0u64; max_lag];

    for track in tracks {
        let det = track.detections();
        for lag in 1..det.len() {
            for (a, b) in det.iter().zip(&det[lag..]) {
                sums[lag - 1] += (b.position - a.position).norm_squared();
                counts[lag - 1] += 1;
            }
        }
    }

    sums.iter()
        .zip(&counts)
        .map(|(s, &n)| ratio(*s, n as f64))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{classify::classify, distance::DistanceType, types::DetectionPoint};
    use approx::assert_abs_diff_eq;

    fn track(t0: u32, len: u32, x: f64) -> TrackSegment {
        TrackSegment::from_detections((t0..t0 + len).map(|t| DetectionPoint::new(x, 0.0, 0.0, t)))
            .unwrap()
    }

    fn scores(
        refs: &[TrackSegment],
        cands: &[TrackSegment],
        cfg: &MatcherConfig,
    ) -> TrackingScores {
        let c = classify(refs, cands, cfg).unwrap();
        TrackingScores::compute(refs, cands, &c, cfg)
    }

    #[test]
    fn perfect_tracking_scores_one() {
        let refs = vec![track(0, 5, 0.0), track(0, 5, 10.0)];
        let cfg = MatcherConfig::new(1.0, DistanceType::Euclidean);
        let s = scores(&refs, &refs.clone(), &cfg);
        assert_abs_diff_eq!(s.alpha, 1.0);
        assert_abs_diff_eq!(s.beta, 1.0);
        assert_abs_diff_eq!(s.detection_jaccard, 1.0);
        assert_abs_diff_eq!(s.track_jaccard, 1.0);
        assert_abs_diff_eq!(s.rmse, 0.0);
        assert_eq!(s.n_paired_detections, 10);
        assert_eq!(s.n_wrong_detections, 0);
    }

    #[test]
    fn no_candidates_scores_zero() {
        let refs = vec![track(0, 3, 0.0)];
        let cfg = MatcherConfig::new(2.0, DistanceType::Euclidean);
        let s = scores(&refs, &[], &cfg);
        assert_abs_diff_eq!(s.alpha, 0.0);
        assert_abs_diff_eq!(s.beta, 0.0);
        assert_abs_diff_eq!(s.detection_jaccard, 0.0);
        assert_eq!(s.n_missed_tracks, 1);
        assert_eq!(s.n_missed_detections, 3);
    }

    #[test]
    fn spurious_tracks_lower_beta_only() {
        let refs = vec![track(0, 4, 0.0)];
        let cands = vec![track(0, 4, 0.0), track(0, 4, 20.0)];
        let cfg = MatcherConfig::new(1.0, DistanceType::Euclidean);
        let s = scores(&refs, &cands, &cfg);
        assert_abs_diff_eq!(s.alpha, 1.0);
        // (4 - 0) / (4 + 4)
        assert_abs_diff_eq!(s.beta, 0.5);
        assert_eq!(s.n_spurious_tracks, 1);
        assert_eq!(s.n_wrong_detections, 4);
        assert_abs_diff_eq!(s.track_jaccard, 0.5);
        assert_abs_diff_eq!(s.detection_jaccard, 0.5);
    }

    #[test]
    fn localisation_error_statistics() {
        let refs = vec![track(0, 2, 0.0), track(0, 2, 10.0)];
        let cands = vec![track(0, 2, 0.3), track(0, 2, 10.4)];
        let cfg = MatcherConfig::new(1.0, DistanceType::Euclidean);
        let s = scores(&refs, &cands, &cfg);
        assert_abs_diff_eq!(s.min_distance, 0.3, epsilon = 1e-9);
        assert_abs_diff_eq!(s.max_distance, 0.4, epsilon = 1e-9);
        assert_abs_diff_eq!(s.rmse, (0.125f64).sqrt(), epsilon = 1e-9);
        assert_abs_diff_eq!(s.std_distance, 0.05, epsilon = 1e-9);
    }

    #[test]
    fn empty_sets_do_not_produce_nan() {
        let cfg = MatcherConfig::default();
        let s = scores(&[], &[], &cfg);
        assert!(s.alpha.is_finite() && s.beta.is_finite());
        assert_abs_diff_eq!(s.track_jaccard, 0.0);
    }

    #[test]
    fn msd_of_constant_velocity_grows_quadratically() {
        let t = TrackSegment::from_detections(
            (0..4).map(|i| DetectionPoint::new(2.0 * i as f64, 0.0, 0.0, i)),
        )
        .unwrap();
        let msd = mean_square_displacements(&[t]);
        assert_eq!(msd.len(), 3);
        assert_abs_diff_eq!(msd[0], 4.0);
        assert_abs_diff_eq!(msd[1], 16.0);
        assert_abs_diff_eq!(msd[2], 36.0);
    }

    #[test]
    fn msd_of_no_tracks_is_empty() {
        assert!(mean_square_displacements(&[]).is_empty());
    }
}
