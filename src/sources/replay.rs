//! Recorded landmark replay
//!
//! Replays a landmark stream captured earlier, one NDJSON object per frame:
//!
//! ```text
//! {"timestamp_ms": 1700.0, "width": 640, "height": 480, "landmarks": [[0.51, 0.42], ...]}
//! {"timestamp_ms": 1733.3, "width": 640, "height": 480, "landmarks": null}
//! ```
//!
//! `landmarks: null` (or a missing field) marks a frame with no face.

use super::{CapturedFrame, FrameSource, LandmarkSource};
use crate::error::TrackingError;
use crate::types::{Frame, FrameSize, LandmarkSet};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// One recorded frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayFrame {
    pub timestamp_ms: f64,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub landmarks: Option<Vec<[f64; 2]>>,
}

impl ReplayFrame {
    pub fn size(&self) -> FrameSize {
        FrameSize::new(self.width, self.height)
    }

    pub fn landmark_set(&self) -> Option<LandmarkSet> {
        self.landmarks.as_ref().map(|points| {
            LandmarkSet::from(points.iter().map(|p| (p[0], p[1])).collect::<Vec<_>>())
        })
    }
}

/// Serves recorded frames and their landmarks in order
#[derive(Debug, Default)]
pub struct ReplaySource {
    frames: VecDeque<ReplayFrame>,
    /// Landmarks of the frame most recently handed out
    pending: Option<LandmarkSet>,
}

impl ReplaySource {
    pub fn new(frames: Vec<ReplayFrame>) -> Self {
        Self {
            frames: frames.into(),
            pending: None,
        }
    }

    /// Parse NDJSON, skipping blank lines
    pub fn parse_ndjson(ndjson: &str) -> Result<Self, TrackingError> {
        let mut frames = Vec::new();
        for (line_num, line) in ndjson.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<ReplayFrame>(trimmed) {
                Ok(frame) => frames.push(frame),
                Err(e) => {
                    return Err(TrackingError::ParseError(format!(
                        "Failed to parse line {}: {}",
                        line_num + 1,
                        e
                    )));
                }
            }
        }
        Ok(Self::new(frames))
    }

    /// Frames not yet handed out
    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl FrameSource for ReplaySource {
    fn next_frame(&mut self) -> Result<Option<CapturedFrame>, TrackingError> {
        let Some(next) = self.frames.pop_front() else {
            self.pending = None;
            return Ok(None);
        };
        self.pending = next.landmark_set();
        Ok(Some(CapturedFrame {
            frame: Frame::empty(next.size()),
            timestamp_ms: next.timestamp_ms,
        }))
    }
}

impl LandmarkSource for ReplaySource {
    fn detect(&mut self, _frame: &Frame) -> Result<Option<LandmarkSet>, TrackingError> {
        Ok(self.pending.take())
    }
}
