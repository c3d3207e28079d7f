//! Tracker emulator: turns ground-truth tracks into imperfect tracker output.
//!
//! Degradations applied per ground-truth track:
//! - Gaussian localisation noise on every detected frame
//! - missed frames, either bridged with `Virtual` points or cut into fragments
//! - short spurious tracks drawn at random positions (Poisson per frame)

use nalgebra::{Point3, Vector3};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Poisson, StandardNormal};
use serde::{Deserialize, Serialize};
use trackeval_core::{DetectionPoint, TrackError, TrackGroup, TrackSegment};
use tracing::debug;

/// Degradation parameters for [`TrackerEmulator`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerEmulatorConfig {
    /// Per-axis localisation noise std
    pub position_noise: f64,
    /// Probability that a ground-truth frame is not detected
    pub miss_probability: f64,
    /// Longest run of missed frames the tracker bridges with virtual points
    pub max_bridged_gap: u32,
    /// Probability that a bridgeable gap is cut instead
    pub fragmentation_probability: f64,
    /// Mean number of spurious tracks started per frame
    pub spurious_rate: f64,
    /// Longest spurious track (frames)
    pub spurious_max_len: u32,
}

impl Default for TrackerEmulatorConfig {
    fn default() -> Self {
        Self {
            position_noise: 0.5,
            miss_probability: 0.05,
            max_bridged_gap: 2,
            fragmentation_probability: 0.0,
            spurious_rate: 0.05,
            spurious_max_len: 8,
        }
    }
}

impl TrackerEmulatorConfig {
    /// No degradation at all: the output equals the ground truth.
    pub fn perfect() -> Self {
        Self {
            position_noise: 0.0,
            miss_probability: 0.0,
            max_bridged_gap: 0,
            fragmentation_probability: 0.0,
            spurious_rate: 0.0,
            spurious_max_len: 0,
        }
    }
}

/// Produces candidate track groups from a ground-truth group.
pub struct TrackerEmulator {
    pub config: TrackerEmulatorConfig,
    rng: ChaCha8Rng,
}

impl TrackerEmulator {
    pub fn new(config: TrackerEmulatorConfig, seed: u64) -> Self {
        Self {
            config,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Emulate a tracker run over `ground_truth`.
    pub fn run(&mut self, ground_truth: &TrackGroup) -> Result<TrackGroup, TrackError> {
        let mut out = TrackGroup::new(format!("emulated from {}", ground_truth.description));

        for segment in ground_truth.segments() {
            for fragment in self.degrade(segment)? {
                out.push(fragment);
            }
        }
        let n_tracked = out.len();

        for spurious in self.spurious_tracks(ground_truth)? {
            out.push(spurious);
        }

        debug!(
            ground_truth = ground_truth.len(),
            tracked = n_tracked,
            spurious = out.len() - n_tracked,
            "emulated tracker output"
        );
        Ok(out)
    }

    fn noise(&mut self) -> Vector3<f64> {
        let sigma = self.config.position_noise;
        if sigma <= 0.0 {
            return Vector3::zeros();
        }
        let dx: f64 = self.rng.sample(StandardNormal);
        let dy: f64 = self.rng.sample(StandardNormal);
        Vector3::new(dx, dy, 0.0) * sigma
    }

    /// Noisy copy of one ground-truth track, possibly cut into fragments.
    fn degrade(&mut self, segment: &TrackSegment) -> Result<Vec<TrackSegment>, TrackError> {
        let mut fragments = Vec::new();
        let mut current: Vec<DetectionPoint> = Vec::new();
        let mut gap: Vec<u32> = Vec::new();

        for det in segment {
            if self.rng.gen::<f64>() < self.config.miss_probability {
                gap.push(det.t);
                continue;
            }
            let position = det.position + self.noise();

            if !gap.is_empty() {
                let bridge = !current.is_empty()
                    && gap.len() <= self.config.max_bridged_gap as usize
                    && self.rng.gen::<f64>() >= self.config.fragmentation_probability;
                match current.last().map(|d| d.position) {
                    Some(from) if bridge => {
                        let n = gap.len() as f64 + 1.0;
                        for (k, &t) in gap.iter().enumerate() {
                            let p = from + (position - from) * ((k as f64 + 1.0) / n);
                            current.push(DetectionPoint::new_virtual(p.x, p.y, p.z, t));
                        }
                    }
                    _ => {
                        if !current.is_empty() {
                            fragments.push(TrackSegment::from_detections(current.drain(..))?);
                        }
                    }
                }
                gap.clear();
            }

            current.push(DetectionPoint {
                position,
                ..*det
            });
        }

        if !current.is_empty() {
            fragments.push(TrackSegment::from_detections(current)?);
        }
        Ok(fragments)
    }

    /// Short random walks started inside the ground-truth bounding box.
    fn spurious_tracks(
        &mut self,
        ground_truth: &TrackGroup,
    ) -> Result<Vec<TrackSegment>, TrackError> {
        let mut tracks = Vec::new();
        if self.config.spurious_max_len == 0 {
            return Ok(tracks);
        }
        let Ok(poisson) = Poisson::new(self.config.spurious_rate) else {
            return Ok(tracks);
        };
        let Some((lo, hi)) = bounding_box(ground_truth) else {
            return Ok(tracks);
        };
        let (Some(t_start), Some(t_end)) = (
            ground_truth.segments().iter().filter_map(TrackSegment::start).min(),
            ground_truth.segments().iter().filter_map(TrackSegment::end).max(),
        ) else {
            return Ok(tracks);
        };

        let step = self.config.position_noise.max(0.1) * 2.0;
        for t0 in t_start..=t_end {
            let n: f64 = poisson.sample(&mut self.rng);
            for _ in 0..n as usize {
                let len = self.rng.gen_range(1..=self.config.spurious_max_len);
                let mut p = Point3::new(
                    self.rng.gen_range(lo.x..=hi.x),
                    self.rng.gen_range(lo.y..=hi.y),
                    0.0,
                );
                let mut dets = Vec::with_capacity(len as usize);
                for t in t0..t0.saturating_add(len).min(t_end.saturating_add(1)) {
                    dets.push(DetectionPoint::new(p.x, p.y, p.z, t));
                    let dx: f64 = self.rng.sample(StandardNormal);
                    let dy: f64 = self.rng.sample(StandardNormal);
                    p += Vector3::new(dx, dy, 0.0) * step;
                }
                tracks.push(TrackSegment::from_detections(dets)?);
            }
        }
        Ok(tracks)
    }
}

fn bounding_box(group: &TrackGroup) -> Option<(Point3<f64>, Point3<f64>)> {
    let mut points = group.segments().iter().flat_map(|s| s.iter().map(|d| d.position));
    let first = points.next()?;
    Some(points.fold((first, first), |(lo, hi), p| (lo.inf(&p), hi.sup(&p))))
}
