//! Core types for the readgaze pipeline
//!
//! This module defines the data structures that flow through each stage of the
//! pipeline: landmarks, pupil centers, gaze points, fixations, per-frame
//! tracking records and the classifier's feature rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single facial landmark in normalized image coordinates ([0,1] x [0,1])
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
}

impl Landmark {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Scale to pixel space and truncate toward zero
    pub fn to_pixel(&self, frame: FrameSize) -> PixelPoint {
        PixelPoint {
            x: (self.x * frame.width as f64) as i32,
            y: (self.y * frame.height as f64) as i32,
        }
    }
}

/// Ordered landmarks for one detected face, indexed positionally
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LandmarkSet {
    points: Vec<Landmark>,
}

impl LandmarkSet {
    pub fn new(points: Vec<Landmark>) -> Self {
        Self { points }
    }

    pub fn get(&self, index: usize) -> Option<&Landmark> {
        self.points.get(index)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl From<Vec<(f64, f64)>> for LandmarkSet {
    fn from(points: Vec<(f64, f64)>) -> Self {
        Self::new(points.into_iter().map(|(x, y)| Landmark::new(x, y)).collect())
    }
}

/// Frame dimensions in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// A raw video frame (W x H x 3, row-major) handed to a landmark source
#[derive(Debug, Clone)]
pub struct Frame {
    pub size: FrameSize,
    pub pixels: Vec<u8>,
}

impl Frame {
    pub fn new(size: FrameSize, pixels: Vec<u8>) -> Self {
        Self { size, pixels }
    }

    /// A frame with no pixel payload, used when landmarks are supplied upstream
    pub fn empty(size: FrameSize) -> Self {
        Self {
            size,
            pixels: Vec::new(),
        }
    }
}

/// Integer pixel coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelPoint {
    pub x: i32,
    pub y: i32,
}

impl PixelPoint {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Pupil centers for both eyes in one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PupilPair {
    pub left: PixelPoint,
    pub right: PixelPoint,
}

impl PupilPair {
    /// Averaged gaze position (not truncated)
    pub fn midpoint(&self) -> (f64, f64) {
        (
            (self.left.x as f64 + self.right.x as f64) / 2.0,
            (self.left.y as f64 + self.right.y as f64) / 2.0,
        )
    }
}

/// One observation of averaged gaze position at a point in time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GazePoint {
    pub x: f64,
    pub y: f64,
    pub timestamp_ms: f64,
}

impl GazePoint {
    pub fn new(x: f64, y: f64, timestamp_ms: f64) -> Self {
        Self { x, y, timestamp_ms }
    }

    /// Euclidean distance between the two positions, ignoring time
    pub fn distance_to(&self, other: &GazePoint) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// A period of stable gaze
///
/// `start_time_ms` and `position` are fixed when the fixation opens; only
/// `duration_ms` changes while it stays open.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fixation {
    pub start_time_ms: f64,
    pub position: Option<(f64, f64)>,
    pub duration_ms: f64,
}

/// Fixation state captured alongside a tracking record
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FixationSample {
    pub duration_ms: f64,
    pub x: Option<f64>,
    pub y: Option<f64>,
}

impl From<&Fixation> for FixationSample {
    fn from(fixation: &Fixation) -> Self {
        Self {
            duration_ms: fixation.duration_ms,
            x: fixation.position.map(|(x, _)| x),
            y: fixation.position.map(|(_, y)| y),
        }
    }
}

/// One row per processed frame in which both pupils were found
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackingRecord {
    pub timestamp_ms: f64,
    pub left_pupil: PixelPoint,
    pub right_pupil: PixelPoint,
    /// Present when a fixation was open at this frame
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixation: Option<FixationSample>,
}

impl TrackingRecord {
    pub fn is_fixation(&self) -> bool {
        self.fixation.is_some()
    }
}

/// Classifier input row, named the way the model expects
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FixationFeatureRow {
    pub x: f64,
    pub y: f64,
    pub duration: f64,
}

impl FixationFeatureRow {
    pub fn as_array(&self) -> [f64; 3] {
        [self.x, self.y, self.duration]
    }
}

/// Class probabilities returned by a risk classifier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub p_no_risk: f64,
    pub p_risk: f64,
}

impl RiskAssessment {
    /// Build from the risk probability alone
    pub fn from_risk(p_risk: f64) -> Self {
        Self {
            p_no_risk: 1.0 - p_risk,
            p_risk,
        }
    }
}

/// Outcome of a session stop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Fixation rows were classified
    Classified,
    /// No fixation rows; classification skipped
    NoData,
    /// The classifier failed; records are still returned
    ClassifierFailed,
}

/// Summary of a stopped recording session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    pub session_id: String,
    pub started_at: DateTime<Utc>,
    pub stopped_at: DateTime<Utc>,
    pub frames_recorded: usize,
    pub fixation_rows: usize,
    pub closed_fixations: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_fixation_duration_ms: Option<f64>,
    pub status: SessionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assessment: Option<RiskAssessment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classifier_error: Option<String>,
}
