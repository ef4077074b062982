//! Error types for readgaze

use thiserror::Error;

/// Errors that can occur while tracking gaze or summarising a session
#[derive(Debug, Error)]
pub enum TrackingError {
    #[error("Failed to parse input: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Landmark index {index} out of range for a set of {len} landmarks")]
    LandmarkIndex { index: usize, len: usize },

    #[error("Frame source error: {0}")]
    FrameSource(String),

    #[error("Classifier error: {0}")]
    Classifier(String),

    #[error("Invalid class probabilities: no_risk={p_no_risk}, risk={p_risk}")]
    InvalidProbabilities { p_no_risk: f64, p_risk: f64 },

    #[error("Session is not recording")]
    NotRecording,
}
