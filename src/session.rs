//! Recording session control
//!
//! [`SessionController`] owns all per-session state and exposes the explicit
//! lifecycle `start()` -> `step()`* -> `stop()`. It has no loop of its own; a
//! driver (see [`crate::recorder`]) calls `step` once per frame.

use crate::classifier::{validate_assessment, RiskClassifier};
use crate::config::TrackerConfig;
use crate::error::TrackingError;
use crate::features::{FeatureDeriver, FixationSummary};
use crate::fixation::FixationDetector;
use crate::pupil::PupilLocator;
use crate::sources::LandmarkSource;
use crate::types::{
    Fixation, FixationFeatureRow, FixationSample, Frame, FrameSize, GazePoint, LandmarkSet,
    PupilPair, RiskAssessment, SessionReport, SessionStatus, TrackingRecord,
};
use chrono::{DateTime, Utc};
use tracing::{error, info, warn};
use uuid::Uuid;

/// Mutable state of one recording session. Reset by `start()`.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub recording: bool,
    pub session_id: String,
    pub started_at: Option<DateTime<Utc>>,
    pub records: Vec<TrackingRecord>,
    pub detector: FixationDetector,
}

impl SessionState {
    fn new(config: &TrackerConfig) -> Self {
        Self {
            recording: false,
            session_id: Uuid::new_v4().to_string(),
            started_at: None,
            records: Vec::new(),
            detector: FixationDetector::from_config(config),
        }
    }
}

/// What happened in one frame where both pupils were found
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameOutcome {
    pub pupils: PupilPair,
    pub gaze: GazePoint,
    pub fixation: Option<Fixation>,
}

/// Everything produced by `stop()`
#[derive(Debug, Clone)]
pub struct StoppedSession {
    pub report: SessionReport,
    pub records: Vec<TrackingRecord>,
    pub fixation_rows: Vec<FixationFeatureRow>,
}

/// Drives pupil location and fixation detection for one stream
pub struct SessionController {
    config: TrackerConfig,
    locator: PupilLocator,
    state: SessionState,
}

impl SessionController {
    pub fn new(config: TrackerConfig) -> Result<Self, TrackingError> {
        config.validate()?;
        Ok(Self {
            locator: PupilLocator::from_config(&config),
            state: SessionState::new(&config),
            config,
        })
    }

    pub fn with_defaults() -> Self {
        let config = TrackerConfig::default();
        Self {
            locator: PupilLocator::from_config(&config),
            state: SessionState::new(&config),
            config,
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_recording(&self) -> bool {
        self.state.recording
    }

    pub fn records(&self) -> &[TrackingRecord] {
        &self.state.records
    }

    /// Begin a new session: clears the per-frame log and the detector
    pub fn start(&mut self) {
        self.state = SessionState::new(&self.config);
        self.state.recording = true;
        self.state.started_at = Some(Utc::now());
        info!(session_id = %self.state.session_id, "recording started");
    }

    /// Process one frame through a landmark source
    pub fn step(
        &mut self,
        source: &mut dyn LandmarkSource,
        frame: &Frame,
        timestamp_ms: f64,
    ) -> Result<Option<FrameOutcome>, TrackingError> {
        let landmarks = source.detect(frame)?;
        self.step_landmarks(landmarks.as_ref(), frame.size, timestamp_ms)
    }

    /// Process one frame's landmarks.
    ///
    /// Frames without a face return `Ok(None)` and leave the detector
    /// untouched. Outside a recording the detector is still fed but no record
    /// is appended.
    pub fn step_landmarks(
        &mut self,
        landmarks: Option<&LandmarkSet>,
        frame: FrameSize,
        timestamp_ms: f64,
    ) -> Result<Option<FrameOutcome>, TrackingError> {
        let Some(pupils) = self.locator.locate(landmarks, frame)? else {
            return Ok(None);
        };

        let (x, y) = pupils.midpoint();
        let fixation = self.state.detector.observe((x, y), timestamp_ms);

        if self.state.recording {
            self.state.records.push(TrackingRecord {
                timestamp_ms,
                left_pupil: pupils.left,
                right_pupil: pupils.right,
                fixation: fixation.as_ref().map(FixationSample::from),
            });
        }

        Ok(Some(FrameOutcome {
            pupils,
            gaze: GazePoint::new(x, y, timestamp_ms),
            fixation,
        }))
    }

    /// End the session, aggregate fixation rows and classify them.
    ///
    /// With no fixation rows the classifier is not called and the report
    /// status is [`SessionStatus::NoData`]. A failing or invalid classifier
    /// yields [`SessionStatus::ClassifierFailed`] with the recorded frames intact.
    pub fn stop(
        &mut self,
        classifier: &dyn RiskClassifier,
    ) -> Result<StoppedSession, TrackingError> {
        if !self.state.recording {
            return Err(TrackingError::NotRecording);
        }
        self.state.recording = false;

        let stopped_at = Utc::now();
        let records = self.state.records.clone();
        let fixation_rows = FeatureDeriver::fixation_rows(&records);
        let summary = FixationSummary::from_fixations(self.state.detector.closed());

        let (status, assessment, classifier_error) = if fixation_rows.is_empty() {
            warn!(
                session_id = %self.state.session_id,
                frames = records.len(),
                "no fixations recorded; skipping classification"
            );
            (SessionStatus::NoData, None, None)
        } else {
            match classify(classifier, &fixation_rows) {
                Ok(assessment) => (SessionStatus::Classified, Some(assessment), None),
                Err(e) => {
                    error!(
                        session_id = %self.state.session_id,
                        error = %e,
                        "classification failed; keeping recorded frames"
                    );
                    (SessionStatus::ClassifierFailed, None, Some(e.to_string()))
                }
            }
        };

        let report = SessionReport {
            session_id: self.state.session_id.clone(),
            started_at: self.state.started_at.unwrap_or(stopped_at),
            stopped_at,
            frames_recorded: records.len(),
            fixation_rows: fixation_rows.len(),
            closed_fixations: summary.count,
            mean_fixation_duration_ms: summary.mean_duration_ms,
            status,
            assessment,
            classifier_error,
        };

        info!(
            session_id = %report.session_id,
            frames = report.frames_recorded,
            fixation_rows = report.fixation_rows,
            status = ?report.status,
            "recording stopped"
        );

        Ok(StoppedSession {
            report,
            records,
            fixation_rows,
        })
    }
}

fn classify(
    classifier: &dyn RiskClassifier,
    rows: &[FixationFeatureRow],
) -> Result<RiskAssessment, TrackingError> {
    let assessment = classifier.predict(rows)?;
    validate_assessment(&assessment)?;
    Ok(assessment)
}
