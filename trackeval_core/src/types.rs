//! Fundamental types: detections, track segments and the group arena that
//! owns them.

use crate::error::TrackError;
use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Identifier types
// ---------------------------------------------------------------------------

/// Index of a [`TrackSegment`] inside the [`TrackGroup`] that owns it.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct SegmentId(pub usize);

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Detection
// ---------------------------------------------------------------------------

/// Origin of a detection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionKind {
    /// Observed in the image.
    #[default]
    Real,
    /// Interpolated to bridge a gap; never counted as a false positive.
    Virtual,
}

/// A single localized space-time observation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectionPoint {
    pub position: Point3<f64>,
    /// Frame index
    pub t: u32,
    #[serde(default)]
    pub kind: DetectionKind,
    /// Display flag, ignored by matching
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Display flag, ignored by matching
    #[serde(default)]
    pub selected: bool,
}

fn default_true() -> bool {
    true
}

impl DetectionPoint {
    /// A real detection at `(x, y, z)` in frame `t`.
    pub fn new(x: f64, y: f64, z: f64, t: u32) -> Self {
        Self {
            position: Point3::new(x, y, z),
            t,
            kind: DetectionKind::Real,
            enabled: true,
            selected: false,
        }
    }

    /// An interpolated detection at `(x, y, z)` in frame `t`.
    pub fn new_virtual(x: f64, y: f64, z: f64, t: u32) -> Self {
        Self {
            kind: DetectionKind::Virtual,
            ..Self::new(x, y, z, t)
        }
    }

    pub fn x(&self) -> f64 {
        self.position.x
    }

    pub fn y(&self) -> f64 {
        self.position.y
    }

    pub fn z(&self) -> f64 {
        self.position.z
    }

    pub fn is_real(&self) -> bool {
        self.kind == DetectionKind::Real
    }

    /// 3D Euclidean distance to `other`.
    pub fn distance(&self, other: &DetectionPoint) -> f64 {
        nalgebra::distance(&self.position, &other.position)
    }
}

// ---------------------------------------------------------------------------
// TrackSegment
// ---------------------------------------------------------------------------

/// One trajectory: exactly one detection per frame over a contiguous frame
/// range. Gaps must be filled with [`DetectionKind::Virtual`] points.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<DetectionPoint>", into = "Vec<DetectionPoint>")]
pub struct TrackSegment {
    detections: Vec<DetectionPoint>,
}

impl TrackSegment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a segment from detections given in frame order.
    pub fn from_detections<I>(detections: I) -> Result<Self, TrackError>
    where
        I: IntoIterator<Item = DetectionPoint>,
    {
        let mut segment = Self::new();
        for d in detections {
            segment.push(d)?;
        }
        Ok(segment)
    }

    /// Build a segment from detections with increasing frames, filling every
    /// gap with linearly interpolated [`DetectionKind::Virtual`] points.
    pub fn from_detections_bridged<I>(detections: I) -> Result<Self, TrackError>
    where
        I: IntoIterator<Item = DetectionPoint>,
    {
        let mut segment = Self::new();
        for d in detections {
            if let Some(last) = segment.last().copied() {
                if d.t <= last.t {
                    return Err(TrackError::NonIncreasingTime {
                        previous: last.t,
                        got: d.t,
                    });
                }
                let span = f64::from(d.t - last.t);
                for t in last.t + 1..d.t {
                    let frac = f64::from(t - last.t) / span;
                    let p = last.position + (d.position - last.position) * frac;
                    segment.detections.push(DetectionPoint::new_virtual(p.x, p.y, p.z, t));
                }
            }
            segment.detections.push(d);
        }
        Ok(segment)
    }

    /// Append a detection. Its frame must directly follow the last one.
    pub fn push(&mut self, detection: DetectionPoint) -> Result<(), TrackError> {
        if let Some(last) = self.detections.last() {
            let expected = last.t.checked_add(1).ok_or(TrackError::FrameOverflow(last.t))?;
            if detection.t != expected {
                return Err(TrackError::NonConsecutiveTime {
                    expected,
                    got: detection.t,
                });
            }
        }
        self.detections.push(detection);
        Ok(())
    }

    /// Remove and return the last detection.
    pub fn pop(&mut self) -> Option<DetectionPoint> {
        self.detections.pop()
    }

    pub fn first(&self) -> Option<&DetectionPoint> {
        self.detections.first()
    }

    pub fn last(&self) -> Option<&DetectionPoint> {
        self.detections.last()
    }

    /// First frame index, if any.
    pub fn start(&self) -> Option<u32> {
        self.first().map(|d| d.t)
    }

    /// Last frame index, if any.
    pub fn end(&self) -> Option<u32> {
        self.last().map(|d| d.t)
    }

    /// Detection at frame `t`, found by offset from the first frame.
    pub fn at_time(&self, t: u32) -> Option<&DetectionPoint> {
        let start = self.start()?;
        let offset = t.checked_sub(start)? as usize;
        self.detections.get(offset)
    }

    /// Number of frames spanned, `last.t - first.t + 1`; 0 when empty.
    pub fn duration(&self) -> u32 {
        match (self.start(), self.end()) {
            (Some(a), Some(b)) => (b - a).saturating_add(1),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }

    pub fn len(&self) -> usize {
        self.detections.len()
    }

    pub fn detections(&self) -> &[DetectionPoint] {
        &self.detections
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DetectionPoint> {
        self.detections.iter()
    }

    pub fn contains(&self, detection: &DetectionPoint) -> bool {
        self.detections.contains(detection)
    }

    /// Number of `Real` detections.
    pub fn num_real(&self) -> usize {
        self.detections.iter().filter(|d| d.is_real()).count()
    }

    /// Displacement between each pair of consecutive frames.
    pub fn jump_lengths(&self) -> Vec<f64> {
        self.detections
            .windows(2)
            .map(|w| w[0].distance(&w[1]))
            .collect()
    }
}

impl TryFrom<Vec<DetectionPoint>> for TrackSegment {
    type Error = TrackError;

    fn try_from(detections: Vec<DetectionPoint>) -> Result<Self, Self::Error> {
        Self::from_detections(detections)
    }
}

impl From<TrackSegment> for Vec<DetectionPoint> {
    fn from(segment: TrackSegment) -> Self {
        segment.detections
    }
}

impl<'a> IntoIterator for &'a TrackSegment {
    type Item = &'a DetectionPoint;
    type IntoIter = std::slice::Iter<'a, DetectionPoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.detections.iter()
    }
}

// ---------------------------------------------------------------------------
// TrackGroup
// ---------------------------------------------------------------------------

/// Arena owning a set of segments. A segment is identified by its
/// [`SegmentId`], so nothing needs to point back at the group.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackGroup {
    #[serde(default)]
    pub description: String,
    segments: Vec<TrackSegment>,
}

impl TrackGroup {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            segments: Vec::new(),
        }
    }

    pub fn from_segments(description: impl Into<String>, segments: Vec<TrackSegment>) -> Self {
        Self {
            description: description.into(),
            segments,
        }
    }

    /// Take ownership of `segment` and return its id.
    pub fn push(&mut self, segment: TrackSegment) -> SegmentId {
        self.segments.push(segment);
        SegmentId(self.segments.len() - 1)
    }

    pub fn get(&self, id: SegmentId) -> Option<&TrackSegment> {
        self.segments.get(id.0)
    }

    pub fn segments(&self) -> &[TrackSegment] {
        &self.segments
    }

    pub fn iter(&self) -> impl Iterator<Item = (SegmentId, &TrackSegment)> {
        self.segments
            .iter()
            .enumerate()
            .map(|(i, s)| (SegmentId(i), s))
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Segment owning `detection`, if any.
    pub fn segment_with_detection(&self, detection: &DetectionPoint) -> Option<SegmentId> {
        self.iter()
            .find(|(_, s)| s.contains(detection))
            .map(|(id, _)| id)
    }

    /// Total number of frames spanned by all segments.
    pub fn total_duration(&self) -> u64 {
        self.segments.iter().map(|s| s.duration() as u64).sum()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
