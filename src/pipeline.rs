//! Pipeline orchestration
//!
//! This module provides the one-shot public API: replay a recorded landmark
//! stream through a full session (start, per-frame steps, stop) and return
//! the result.

use crate::classifier::{LogisticRiskModel, RiskClassifier};
use crate::config::TrackerConfig;
use crate::error::TrackingError;
use crate::recorder::{LoopOutcome, Recorder};
use crate::session::{SessionController, StoppedSession};
use crate::sources::ReplaySource;

/// Result of replaying a recorded stream
#[derive(Debug, Clone)]
pub struct ReplayResult {
    pub outcome: LoopOutcome,
    pub session: StoppedSession,
}

/// Run a full session over a replay source.
///
/// Pipeline stages:
/// 1. SessionController::start - reset per-session state
/// 2. Recorder - pupil location and fixation detection per frame
/// 3. SessionController::stop - aggregate fixation rows and classify
///
/// A frame error ends the loop early but the frames processed so far are
/// still aggregated; the error is reported in `outcome.error`.
pub fn replay_session(
    source: ReplaySource,
    config: TrackerConfig,
    classifier: &dyn RiskClassifier,
) -> Result<ReplayResult, TrackingError> {
    let mut controller = SessionController::new(config)?;
    controller.start();

    let outcome = Recorder::run(&mut controller, source, |_| false);
    let session = controller.stop(classifier)?;

    Ok(ReplayResult { outcome, session })
}

/// Replay NDJSON landmark frames and return the session report as JSON.
///
/// # Arguments
/// * `ndjson` - Recorded frames, one JSON object per line
/// * `config_json` - Tracker configuration, or `None` for defaults
/// * `model_json` - Weights for [`LogisticRiskModel`]
///
/// # Example
/// ```ignore
/// let report = replay_to_report(&ndjson, None, &model_json)?;
/// ```
pub fn replay_to_report(
    ndjson: &str,
    config_json: Option<&str>,
    model_json: &str,
) -> Result<String, TrackingError> {
    let source = ReplaySource::parse_ndjson(ndjson)?;
    let config = match config_json {
        Some(json) => TrackerConfig::from_json(json)?,
        None => TrackerConfig::default(),
    };
    let model = LogisticRiskModel::from_json(model_json)?;

    let result = replay_session(source, config, &model)?;
    if let Some(message) = result.outcome.error {
        return Err(TrackingError::FrameSource(message));
    }
    Ok(serde_json::to_string(&result.session.report)?)
}
