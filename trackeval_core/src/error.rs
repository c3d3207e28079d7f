//! Error types for segment construction, assignment and matching.

use crate::types::SegmentId;
use thiserror::Error;

/// Errors raised while building a [`TrackSegment`](crate::types::TrackSegment).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrackError {
    #[error("detections must have consecutive frame indices: expected t={expected}, got t={got}")]
    NonConsecutiveTime { expected: u32, got: u32 },

    #[error("detections must have increasing frame indices: t={got} follows t={previous}")]
    NonIncreasingTime { previous: u32, got: u32 },

    #[error("no frame can follow t={0}")]
    FrameOverflow(u32),
}

/// Errors raised by the Kuhn-Munkres solver.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AssignmentError {
    #[error("cost matrix entry ({row}, {col}) is not finite: {value}")]
    NonFiniteCost { row: usize, col: usize, value: f64 },
}

/// Errors raised while pairing reference and candidate tracks.
///
/// `InvalidGate` and `EmptyReference` are caller contract violations.
/// `EmptyFeasibleSet` and `MissingPair` mean the clustering bookkeeping is
/// broken and the whole result must be discarded.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MatchError {
    #[error("gate must be a positive finite distance, got {0}")]
    InvalidGate(f64),

    #[error("reference track {0} has no detections")]
    EmptyReference(SegmentId),

    #[error("reference track {0} has an empty feasible pair set")]
    EmptyFeasibleSet(SegmentId),

    #[error("no stored track pair for reference {reference} at cost-matrix column {column}")]
    MissingPair { reference: SegmentId, column: usize },

    #[error(transparent)]
    Assignment(#[from] AssignmentError),
}

/// Result type for matching operations.
pub type Result<T> = std::result::Result<T, MatchError>;
