//! Frame and landmark sources
//!
//! Camera capture and facial-landmark detection live outside this crate. These
//! traits are the seams through which a driver supplies them; `ReplaySource`
//! serves recorded landmark streams through both.

mod replay;

pub use replay::{ReplayFrame, ReplaySource};

use crate::error::TrackingError;
use crate::types::{Frame, LandmarkSet};

/// A frame together with its capture time in milliseconds
#[derive(Debug, Clone)]
pub struct CapturedFrame {
    pub frame: Frame,
    pub timestamp_ms: f64,
}

/// Trait for frame producers (cameras, video files, replays)
///
/// The source owns its capture handle; dropping the source releases it.
pub trait FrameSource {
    /// Next frame, or `None` when the stream has ended
    fn next_frame(&mut self) -> Result<Option<CapturedFrame>, TrackingError>;
}

/// Trait for facial-landmark detectors
pub trait LandmarkSource {
    /// Landmarks of the first detected face in normalized coordinates, or
    /// `None` when no face is visible
    fn detect(&mut self, frame: &Frame) -> Result<Option<LandmarkSet>, TrackingError>;
}

/// A frame source and a landmark source driven as one
pub struct Paired<F, L> {
    pub frames: F,
    pub landmarks: L,
}

impl<F, L> Paired<F, L> {
    pub fn new(frames: F, landmarks: L) -> Self {
        Self { frames, landmarks }
    }
}

impl<F: FrameSource, L> FrameSource for Paired<F, L> {
    fn next_frame(&mut self) -> Result<Option<CapturedFrame>, TrackingError> {
        self.frames.next_frame()
    }
}

impl<F, L: LandmarkSource> LandmarkSource for Paired<F, L> {
    fn detect(&mut self, frame: &Frame) -> Result<Option<LandmarkSet>, TrackingError> {
        self.landmarks.detect(frame)
    }
}
