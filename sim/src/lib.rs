//! `sim`: Synthetic benchmark: particle trajectories, emulated tracker output, track set files.

pub mod emulator;
pub mod scenarios;
pub mod target;
pub mod track_io;

pub use emulator::{TrackerEmulator, TrackerEmulatorConfig};
pub use scenarios::{Scenario, ScenarioKind};
pub use target::{MotionSpec, Particle};
pub use track_io::{load_track_set, save_track_set, TrackSetFile};
