//! Risk classification
//!
//! The classifier is an external collaborator reached through
//! [`RiskClassifier`]. [`LogisticRiskModel`] is a small reference model whose
//! weights are loaded from JSON; it standardizes each `(x, y, duration)` row
//! with stored means and scales and averages the per-row risk scores.

use crate::error::TrackingError;
use crate::types::{FixationFeatureRow, RiskAssessment};
use serde::{Deserialize, Serialize};

/// Tolerance when checking that class probabilities sum to one
const PROBABILITY_EPSILON: f64 = 1e-6;

/// Trait for models that score a table of fixation rows
pub trait RiskClassifier {
    /// Return `(p_no_risk, p_risk)` for a non-empty table
    fn predict(&self, rows: &[FixationFeatureRow]) -> Result<RiskAssessment, TrackingError>;
}

/// Check that an assessment is a valid two-class distribution
pub fn validate_assessment(assessment: &RiskAssessment) -> Result<(), TrackingError> {
    let RiskAssessment { p_no_risk, p_risk } = *assessment;
    let in_range = |p: f64| (0.0..=1.0).contains(&p);
    let sums_to_one = (p_no_risk + p_risk - 1.0).abs() <= PROBABILITY_EPSILON;
    if !in_range(p_no_risk) || !in_range(p_risk) || !sums_to_one {
        return Err(TrackingError::InvalidProbabilities { p_no_risk, p_risk });
    }
    Ok(())
}

/// Per-row logistic model over standardized fixation features
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRiskModel {
    /// Means of `x`, `y`, `duration` used for standardization
    pub feature_means: [f64; 3],
    /// Standard deviations of `x`, `y`, `duration`
    pub feature_scales: [f64; 3],
    pub weights: [f64; 3],
    pub bias: f64,
    /// Decision threshold on `p_risk`
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

fn default_threshold() -> f64 {
    0.5
}

impl LogisticRiskModel {
    pub fn from_json(json: &str) -> Result<Self, TrackingError> {
        let model: LogisticRiskModel = serde_json::from_str(json)?;
        model.validate()?;
        Ok(model)
    }

    pub fn validate(&self) -> Result<(), TrackingError> {
        if self.feature_scales.iter().any(|s| !s.is_finite() || *s == 0.0) {
            return Err(TrackingError::Classifier(
                "feature scales must be finite and non-zero".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(TrackingError::Classifier(format!(
                "threshold must be within [0, 1], got {}",
                self.threshold
            )));
        }
        Ok(())
    }

    /// Risk score for a single row
    pub fn score(&self, row: &FixationFeatureRow) -> f64 {
        let z = row
            .as_array()
            .iter()
            .zip(self.feature_means.iter().zip(self.feature_scales.iter()))
            .zip(self.weights.iter())
            .map(|((value, (mean, scale)), weight)| weight * (value - mean) / scale)
            .sum::<f64>()
            + self.bias;
        sigmoid(z)
    }

    pub fn is_at_risk(&self, assessment: &RiskAssessment) -> bool {
        assessment.p_risk > self.threshold
    }
}

impl RiskClassifier for LogisticRiskModel {
    fn predict(&self, rows: &[FixationFeatureRow]) -> Result<RiskAssessment, TrackingError> {
        if rows.is_empty() {
            return Err(TrackingError::Classifier(
                "cannot classify an empty fixation table".to_string(),
            ));
        }
        let p_risk = rows.iter().map(|row| self.score(row)).sum::<f64>() / rows.len() as f64;
        Ok(RiskAssessment::from_risk(p_risk.clamp(0.0, 1.0)))
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}
