//! Particle motion models and frame-by-frame propagation.
//!
//! Each particle has a true position and a `MotionSpec` describing how it
//! moves between two consecutive frames. Frames are the unit of time.

use nalgebra::{Point3, Vector3};
use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

/// Describes particle motion between consecutive frames.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum MotionSpec {
    /// Free diffusion in the XY plane. Per-axis step std = sqrt(2·D).
    Brownian { diffusion: f64 },
    /// Constant displacement per frame.
    Directed { velocity: [f64; 3] },
    /// Constant-turn-rate on XY plane. `omega` = heading change per frame (rad).
    ConstantTurn { speed: f64, omega: f64 },
}

/// A simulated particle with ground-truth position.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Particle {
    pub id: u64,
    pub position: Point3<f64>,
    /// Heading in the XY plane, used by `ConstantTurn`
    pub heading: f64,
    pub motion: MotionSpec,
    /// First frame with a detection
    pub appear_at: u32,
    /// First frame without a detection, `None` = visible until the end
    pub disappear_at: Option<u32>,
}

impl Particle {
    pub fn new(id: u64, position: [f64; 3], motion: MotionSpec) -> Self {
        Self {
            id,
            position: Point3::from(position),
            heading: 0.0,
            motion,
            appear_at: 0,
            disappear_at: None,
        }
    }

    pub fn with_heading(mut self, heading: f64) -> Self {
        self.heading = heading;
        self
    }

    pub fn with_lifetime(mut self, appear_at: u32, disappear_at: Option<u32>) -> Self {
        self.appear_at = appear_at;
        self.disappear_at = disappear_at;
        self
    }

    /// Propagate the true position by one frame.
    pub fn step<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        match self.motion {
            MotionSpec::Brownian { diffusion } => {
                let sigma = (2.0 * diffusion.max(0.0)).sqrt();
                let dx: f64 = rng.sample(StandardNormal);
                let dy: f64 = rng.sample(StandardNormal);
                self.position += Vector3::new(dx, dy, 0.0) * sigma;
            }
            MotionSpec::Directed { velocity } => {
                self.position += Vector3::from(velocity);
            }
            MotionSpec::ConstantTurn { speed, omega } => {
                self.position.x += speed * self.heading.cos();
                self.position.y += speed * self.heading.sin();
                self.heading += omega;
            }
        }
    }

    /// True if the particle is visible at frame `t`.
    pub fn is_active(&self, t: u32) -> bool {
        t >= self.appear_at && self.disappear_at.map_or(true, |end| t < end)
    }
}
