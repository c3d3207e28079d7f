//! `trackeval_core`: Track-to-track matching and tracker scoring.
//!
//! # Module layout
//! - [`types`]        - Detections, track segments, track groups
//! - [`distance`]     - Gated track-to-track distance
//! - [`pair`]         - Resolved reference/candidate pairs
//! - [`hungarian`]    - Kuhn-Munkres rectangular assignment
//! - [`association`]  - Compatibility graph clustering, cluster cost matrices
//! - [`matcher`]      - Global one-to-one track pairing
//! - [`classify`]     - Recovered / missed / correct / spurious lists
//! - [`metrics`]      - Alpha, beta, Jaccard indices, RMSE, MSD
//! - [`error`]        - Error types

pub mod association;
pub mod classify;
pub mod distance;
pub mod error;
pub mod hungarian;
pub mod matcher;
pub mod metrics;
pub mod pair;
pub mod types;

pub use classify::{classify, Classification};
pub use distance::{evaluate, DistanceType, TrackDistance};
pub use error::{AssignmentError, MatchError, TrackError};
pub use matcher::{pair_tracks, MatcherConfig};
pub use metrics::TrackingScores;
pub use pair::TrackPair;
pub use types::{DetectionKind, DetectionPoint, SegmentId, TrackGroup, TrackSegment};
