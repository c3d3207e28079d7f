//! Scenario definitions.
//!
//! Each scenario is a named set of particles plus the tracker degradation
//! applied to them. All scenarios are deterministic given the same seed.

use crate::{
    emulator::{TrackerEmulator, TrackerEmulatorConfig},
    target::{MotionSpec, Particle},
};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use trackeval_core::{DetectionPoint, TrackError, TrackGroup, TrackSegment};

/// Which pre-defined scenario to load.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioKind {
    /// 5 particles on smooth paths, mild noise, no clutter
    Simple,
    /// 60 diffusing particles with random lifetimes, clutter
    Dense,
    /// 10 directed particles, frequent misses cut into fragments
    Fragmented,
}

/// A fully configured scenario.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub seed: u64,
    pub n_frames: u32,
    pub particles: Vec<Particle>,
    pub emulator: TrackerEmulatorConfig,
}

impl Scenario {
    /// Build the named scenario. Uses `seed` for repeatability.
    pub fn build(kind: ScenarioKind, seed: u64) -> Self {
        match kind {
            ScenarioKind::Simple => Self::simple(seed),
            ScenarioKind::Dense => Self::dense(seed),
            ScenarioKind::Fragmented => Self::fragmented(seed),
        }
    }

    /// Sample every particle once per frame into one segment per particle.
    pub fn ground_truth(&self) -> Result<TrackGroup, TrackError> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut group = TrackGroup::new(format!("{} ground truth", self.name));

        for particle in &self.particles {
            let mut p = particle.clone();
            let mut dets = Vec::new();
            for t in 0..self.n_frames {
                if p.is_active(t) {
                    dets.push(DetectionPoint::new(p.position.x, p.position.y, p.position.z, t));
                }
                p.step(&mut rng);
            }
            if !dets.is_empty() {
                group.push(TrackSegment::from_detections(dets)?);
            }
        }
        Ok(group)
    }

    /// Ground truth and emulated tracker output for this scenario.
    pub fn generate(&self) -> Result<(TrackGroup, TrackGroup), TrackError> {
        let ground_truth = self.ground_truth()?;
        let mut emulator = TrackerEmulator::new(self.emulator.clone(), self.seed.wrapping_add(1));
        let candidates = emulator.run(&ground_truth)?;
        Ok((ground_truth, candidates))
    }

    // -----------------------------------------------------------------------
    // Scenario 1: Simple
    // -----------------------------------------------------------------------
    fn simple(seed: u64) -> Self {
        let particles = vec![
            Particle::new(0, [0., 0., 0.], MotionSpec::Directed { velocity: [1.0, 0.0, 0.0] }),
            Particle::new(1, [0., 20., 0.], MotionSpec::Directed { velocity: [0.8, -0.3, 0.0] }),
            Particle::new(2, [40., 40., 0.], MotionSpec::Directed { velocity: [-0.5, -0.5, 0.0] }),
            Particle::new(3, [20., -20., 0.], MotionSpec::ConstantTurn { speed: 1.0, omega: 0.05 })
                .with_heading(std::f64::consts::FRAC_PI_2),
            Particle::new(4, [-20., 10., 0.], MotionSpec::Brownian { diffusion: 0.2 }),
        ];

        Scenario {
            name: "simple".into(),
            seed,
            n_frames: 50,
            particles,
            emulator: TrackerEmulatorConfig {
                position_noise: 0.3,
                miss_probability: 0.0,
                spurious_rate: 0.0,
                ..TrackerEmulatorConfig::default()
            },
        }
    }

    // -----------------------------------------------------------------------
    // Scenario 2: Dense
    // -----------------------------------------------------------------------
    fn dense(seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(2));
        let n_frames = 100;

        let particles = (0..60)
            .map(|i| {
                let pos = [rng.gen_range(0.0..100.0), rng.gen_range(0.0..100.0), 0.0];
                let appear = rng.gen_range(0..n_frames / 2);
                let life = rng.gen_range(10..n_frames);
                let diffusion = 0.5 + rng.gen::<f64>();
                Particle::new(i, pos, MotionSpec::Brownian { diffusion })
                    .with_lifetime(appear, Some(appear + life))
            })
            .collect();

        Scenario {
            name: "dense".into(),
            seed,
            n_frames,
            particles,
            emulator: TrackerEmulatorConfig {
                position_noise: 0.8,
                miss_probability: 0.05,
                max_bridged_gap: 2,
                fragmentation_probability: 0.1,
                spurious_rate: 0.2,
                spurious_max_len: 6,
            },
        }
    }

    // -----------------------------------------------------------------------
    // Scenario 3: Fragmented
    // -----------------------------------------------------------------------
    fn fragmented(seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(3));

        let particles = (0..10)
            .map(|i| {
                let angle = i as f64 * std::f64::consts::TAU / 10.0;
                let speed = 0.5 + rng.gen::<f64>();
                Particle::new(
                    i,
                    [50.0 * angle.cos(), 50.0 * angle.sin(), 0.0],
                    MotionSpec::Directed {
                        velocity: [-speed * angle.cos(), -speed * angle.sin(), 0.0],
                    },
                )
            })
            .collect();

        Scenario {
            name: "fragmented".into(),
            seed,
            n_frames: 80,
            particles,
            emulator: TrackerEmulatorConfig {
                position_noise: 0.4,
                miss_probability: 0.15,
                max_bridged_gap: 3,
                fragmentation_probability: 0.5,
                spurious_rate: 0.02,
                spurious_max_len: 5,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trackeval_core::{classify, MatcherConfig};

    #[test]
    fn every_scenario_builds_tracks() {
        for kind in [ScenarioKind::Simple, ScenarioKind::Dense, ScenarioKind::Fragmented] {
            let scenario = Scenario::build(kind, 42);
            let gt = scenario.ground_truth().unwrap();
            assert!(!gt.is_empty(), "{kind:?}");
            assert!(gt.segments().iter().all(|s| !s.is_empty()));
        }
    }

    #[test]
    fn scenarios_are_deterministic() {
        let a = Scenario::build(ScenarioKind::Dense, 7).generate().unwrap();
        let b = Scenario::build(ScenarioKind::Dense, 7).generate().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn dense_lifetimes_stay_inside_frames() {
        let scenario = Scenario::build(ScenarioKind::Dense, 1);
        let gt = scenario.ground_truth().unwrap();
        for s in gt.segments() {
            assert!(s.end().unwrap() < scenario.n_frames);
        }
    }

    #[test]
    fn simple_scenario_recovers_every_track() {
        let (gt, cands) = Scenario::build(ScenarioKind::Simple, 42).generate().unwrap();
        let c = classify(gt.segments(), cands.segments(), &MatcherConfig::default()).unwrap();
        assert!(c.missed.is_empty());
        assert_eq!(c.recovered.len(), gt.len());
    }
}
