//! Tracker configuration
//!
//! Thresholds for fixation detection and the iris landmark index sets used by
//! the pupil locator. Defaults match a 478-point refined face mesh.

use crate::error::TrackingError;
use serde::{Deserialize, Serialize};

/// Maximum pivot distance (pixels) for a window to count as stable
pub const DEFAULT_FIXATION_THRESHOLD_PX: f64 = 20.0;

/// Minimum window time span (milliseconds) for a window to count as stable
pub const DEFAULT_FIXATION_DURATION_MS: f64 = 30.0;

/// Number of recent gaze samples kept in the history window
pub const DEFAULT_HISTORY_CAPACITY: usize = 10;

/// Landmark indices tracing the left iris
pub const LEFT_IRIS: [usize; 4] = [474, 475, 476, 477];

/// Landmark indices tracing the right iris
pub const RIGHT_IRIS: [usize; 4] = [469, 470, 471, 472];

/// Configuration shared by the pupil locator and the fixation detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub fixation_threshold_px: f64,
    pub fixation_duration_ms: f64,
    pub history_capacity: usize,
    pub left_iris: Vec<usize>,
    pub right_iris: Vec<usize>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            fixation_threshold_px: DEFAULT_FIXATION_THRESHOLD_PX,
            fixation_duration_ms: DEFAULT_FIXATION_DURATION_MS,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            left_iris: LEFT_IRIS.to_vec(),
            right_iris: RIGHT_IRIS.to_vec(),
        }
    }
}

impl TrackerConfig {
    /// Parse and validate a configuration. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, TrackingError> {
        let config: TrackerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, TrackingError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), TrackingError> {
        if !(self.fixation_threshold_px.is_finite() && self.fixation_threshold_px > 0.0) {
            return Err(TrackingError::InvalidConfig(format!(
                "fixation_threshold_px must be positive, got {}",
                self.fixation_threshold_px
            )));
        }
        if !(self.fixation_duration_ms.is_finite() && self.fixation_duration_ms >= 0.0) {
            return Err(TrackingError::InvalidConfig(format!(
                "fixation_duration_ms must be non-negative, got {}",
                self.fixation_duration_ms
            )));
        }
        // A single sample can never be judged stable
        if self.history_capacity < 2 {
            return Err(TrackingError::InvalidConfig(format!(
                "history_capacity must be at least 2, got {}",
                self.history_capacity
            )));
        }
        if self.left_iris.is_empty() || self.right_iris.is_empty() {
            return Err(TrackingError::InvalidConfig(
                "iris index sets must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
