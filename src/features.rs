//! Session aggregation
//!
//! Projects fixation-flagged tracking records into the classifier's feature
//! table and summarises the closed-fixation log. No smoothing, scaling or
//! outlier removal happens here.

use crate::types::{Fixation, FixationFeatureRow, TrackingRecord};

/// Builds the classifier's feature table
pub struct FeatureDeriver;

impl FeatureDeriver {
    /// One row per record with an open fixation.
    ///
    /// Rows whose fixation has no centroid are dropped.
    pub fn fixation_rows(records: &[TrackingRecord]) -> Vec<FixationFeatureRow> {
        records
            .iter()
            .filter_map(|record| {
                let fixation = record.fixation?;
                Some(FixationFeatureRow {
                    x: fixation.x?,
                    y: fixation.y?,
                    duration: fixation.duration_ms,
                })
            })
            .collect()
    }
}

/// Counts and mean duration over completed fixations
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixationSummary {
    pub count: usize,
    pub mean_duration_ms: Option<f64>,
}

impl FixationSummary {
    pub fn from_fixations(fixations: &[Fixation]) -> Self {
        let count = fixations.len();
        let mean_duration_ms = if count == 0 {
            None
        } else {
            Some(fixations.iter().map(|f| f.duration_ms).sum::<f64>() / count as f64)
        };
        Self {
            count,
            mean_duration_ms,
        }
    }
}
