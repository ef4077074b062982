//! Pupil location
//!
//! Reduces the iris landmark subsets of a face mesh to one integer pixel center
//! per eye. Landmarks are denormalized and truncated individually before they
//! are averaged, and the mean is truncated again.

use crate::config::TrackerConfig;
use crate::error::TrackingError;
use crate::types::{FrameSize, LandmarkSet, PixelPoint, PupilPair};

/// Locate both pupil centers.
///
/// Returns `Ok(None)` when no face was detected; that is the ordinary
/// "looked away" frame and not an error.
///
/// # Example
/// ```ignore
/// let pupils = locate(Some(&landmarks), frame, &LEFT_IRIS, &RIGHT_IRIS)?;
/// ```
pub fn locate(
    landmarks: Option<&LandmarkSet>,
    frame: FrameSize,
    left_iris: &[usize],
    right_iris: &[usize],
) -> Result<Option<PupilPair>, TrackingError> {
    let Some(landmarks) = landmarks else {
        return Ok(None);
    };

    let left = iris_center(landmarks, frame, left_iris)?;
    let right = iris_center(landmarks, frame, right_iris)?;

    Ok(Some(PupilPair { left, right }))
}

/// Mean of the truncated pixel positions at `indices`, truncated toward zero
fn iris_center(
    landmarks: &LandmarkSet,
    frame: FrameSize,
    indices: &[usize],
) -> Result<PixelPoint, TrackingError> {
    if indices.is_empty() {
        return Err(TrackingError::InvalidConfig(
            "iris index set is empty".to_string(),
        ));
    }

    let mut sum_x: i64 = 0;
    let mut sum_y: i64 = 0;
    for &index in indices {
        let landmark = landmarks.get(index).ok_or(TrackingError::LandmarkIndex {
            index,
            len: landmarks.len(),
        })?;
        let pixel = landmark.to_pixel(frame);
        sum_x += pixel.x as i64;
        sum_y += pixel.y as i64;
    }

    let n = indices.len() as f64;
    Ok(PixelPoint {
        x: (sum_x as f64 / n) as i32,
        y: (sum_y as f64 / n) as i32,
    })
}

/// Pupil locator bound to a fixed pair of iris index sets
#[derive(Debug, Clone)]
pub struct PupilLocator {
    left_iris: Vec<usize>,
    right_iris: Vec<usize>,
}

impl Default for PupilLocator {
    fn default() -> Self {
        Self::from_config(&TrackerConfig::default())
    }
}

impl PupilLocator {
    pub fn new(left_iris: Vec<usize>, right_iris: Vec<usize>) -> Self {
        Self {
            left_iris,
            right_iris,
        }
    }

    pub fn from_config(config: &TrackerConfig) -> Self {
        Self::new(config.left_iris.clone(), config.right_iris.clone())
    }

    pub fn locate(
        &self,
        landmarks: Option<&LandmarkSet>,
        frame: FrameSize,
    ) -> Result<Option<PupilPair>, TrackingError> {
        locate(landmarks, frame, &self.left_iris, &self.right_iris)
    }
}
