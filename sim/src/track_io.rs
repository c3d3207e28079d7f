//! Track set files: serialize/deserialize track groups for offline evaluation.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::io::{BufReader, BufWriter};
use std::path::Path;
use trackeval_core::{DetectionPoint, TrackError, TrackGroup, TrackSegment};

/// On-disk form of a track group.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrackSetFile {
    #[serde(default)]
    pub description: String,
    /// Detections per track in increasing frame order. Gaps are bridged on load.
    pub tracks: Vec<Vec<DetectionPoint>>,
}

impl From<&TrackGroup> for TrackSetFile {
    fn from(group: &TrackGroup) -> Self {
        Self {
            description: group.description.clone(),
            tracks: group
                .segments()
                .iter()
                .map(|s| s.iter().copied().collect())
                .collect(),
        }
    }
}

impl TryFrom<TrackSetFile> for TrackGroup {
    type Error = TrackError;

    fn try_from(file: TrackSetFile) -> Result<Self, Self::Error> {
        let segments = file
            .tracks
            .into_iter()
            .map(TrackSegment::from_detections_bridged)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(TrackGroup::from_segments(file.description, segments))
    }
}

/// Save a track group to a JSON file.
pub fn save_track_set(group: &TrackGroup, path: &Path) -> anyhow::Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating track set {}", path.display()))?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, &TrackSetFile::from(group))?;
    Ok(())
}

/// Load a track group from a JSON file. Missing frames inside a track are
/// filled with interpolated `Virtual` points.
pub fn load_track_set(path: &Path) -> anyhow::Result<TrackGroup> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("opening track set {}", path.display()))?;
    let reader = BufReader::new(file);
    let set: TrackSetFile = serde_json::from_reader(reader)
        .with_context(|| format!("parsing track set {}", path.display()))?;
    TrackGroup::try_from(set).with_context(|| format!("bridging tracks in {}", path.display()))
}
