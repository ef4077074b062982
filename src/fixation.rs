//! Fixation detection
//!
//! Converts a stream of averaged gaze positions into discrete fixations using a
//! bounded sliding window. A window is stable when every sample lies within
//! the distance threshold of the window's *first* sample and the window spans
//! at least the minimum duration.
//!
//! Timestamps passed to [`FixationDetector::observe`] must be non-decreasing
//! and come from a single stream. Out-of-order input is not detected or
//! corrected; the resulting fixations are unspecified.

use crate::config::TrackerConfig;
use crate::types::{Fixation, GazePoint};
use std::collections::VecDeque;
use tracing::debug;

/// Sliding-window fixation state machine
#[derive(Debug, Clone)]
pub struct FixationDetector {
    /// Recent gaze samples, oldest first
    history: VecDeque<GazePoint>,
    /// Maximum number of samples kept in `history`
    capacity: usize,
    threshold_px: f64,
    min_duration_ms: f64,
    /// The fixation currently open, if any
    current: Option<Fixation>,
    /// Closed fixations in the order they ended
    closed: Vec<Fixation>,
}

impl Default for FixationDetector {
    fn default() -> Self {
        Self::from_config(&TrackerConfig::default())
    }
}

impl FixationDetector {
    pub fn new(threshold_px: f64, min_duration_ms: f64, capacity: usize) -> Self {
        Self {
            history: VecDeque::with_capacity(capacity + 1),
            capacity,
            threshold_px,
            min_duration_ms,
            current: None,
            closed: Vec::new(),
        }
    }

    pub fn from_config(config: &TrackerConfig) -> Self {
        Self::new(
            config.fixation_threshold_px,
            config.fixation_duration_ms,
            config.history_capacity,
        )
    }

    /// Feed one gaze sample and return a snapshot of the open fixation.
    pub fn observe(&mut self, position: (f64, f64), timestamp_ms: f64) -> Option<Fixation> {
        self.history
            .push_back(GazePoint::new(position.0, position.1, timestamp_ms));
        while self.history.len() > self.capacity {
            self.history.pop_front();
        }

        if self.history.len() < 2 {
            return None;
        }

        let (first, last) = match (self.history.front(), self.history.back()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => return None,
        };

        let max_distance = self
            .history
            .iter()
            .map(|p| first.distance_to(p))
            .fold(0.0_f64, f64::max);
        let duration = last.timestamp_ms - first.timestamp_ms;

        let stable = max_distance < self.threshold_px && duration >= self.min_duration_ms;

        if stable {
            match self.current.as_mut() {
                Some(open) => open.duration_ms = duration,
                None => {
                    let fixation = Fixation {
                        start_time_ms: first.timestamp_ms,
                        position: self.mean_position(),
                        duration_ms: duration,
                    };
                    debug!(
                        start_ms = fixation.start_time_ms,
                        x = ?fixation.position.map(|p| p.0),
                        y = ?fixation.position.map(|p| p.1),
                        "fixation opened"
                    );
                    self.current = Some(fixation);
                }
            }
        } else if let Some(done) = self.current.take() {
            debug!(
                start_ms = done.start_time_ms,
                duration_ms = done.duration_ms,
                max_distance,
                "fixation closed"
            );
            self.closed.push(done);
        }

        self.current
    }

    /// Mean of all window positions
    fn mean_position(&self) -> Option<(f64, f64)> {
        if self.history.is_empty() {
            return None;
        }
        let n = self.history.len() as f64;
        let (sx, sy) = self
            .history
            .iter()
            .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
        Some((sx / n, sy / n))
    }

    /// The open fixation, if any
    pub fn current(&self) -> Option<&Fixation> {
        self.current.as_ref()
    }

    /// Closed fixations in the order they ended
    pub fn closed(&self) -> &[Fixation] {
        &self.closed
    }

    /// Drain the closed-fixation log
    pub fn take_closed(&mut self) -> Vec<Fixation> {
        std::mem::take(&mut self.closed)
    }

    /// Number of samples currently in the window
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Clear the window, the open fixation and the closed log
    pub fn reset(&mut self) {
        self.history.clear();
        self.current = None;
        self.closed.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> FixationDetector {
        FixationDetector::new(20.0, 30.0, 10)
    }

    fn feed(detector: &mut FixationDetector, points: &[(f64, f64, f64)]) -> Option<Fixation> {
        let mut last = None;
        for &(x, y, t) in points {
            last = detector.observe((x, y), t);
        }
        last
    }

    const STEADY: [(f64, f64, f64); 4] = [
        (100.0, 100.0, 0.0),
        (101.0, 100.0, 5.0),
        (100.0, 101.0, 10.0),
        (100.0, 100.0, 40.0),
    ];

    #[test]
    fn test_single_sample_returns_none() {
        let mut d = detector();
        assert!(d.observe((10.0, 10.0), 0.0).is_none());
        assert_eq!(d.history_len(), 1);
    }

    #[test]
    fn test_steady_gaze_opens_fixation() {
        let mut d = detector();
        let fixation = feed(&mut d, &STEADY).unwrap();

        assert_eq!(fixation.start_time_ms, 0.0);
        assert_eq!(fixation.duration_ms, 40.0);
        let (x, y) = fixation.position.unwrap();
        assert!((x - 100.25).abs() < 1e-9);
        assert!((y - 100.25).abs() < 1e-9);
        assert!(d.closed().is_empty());
    }

    #[test]
    fn test_not_open_before_minimum_duration() {
        let mut d = detector();
        assert!(feed(&mut d, &STEADY[..3]).is_none());
        assert!(d.current().is_none());
    }

    #[test]
    fn test_jump_closes_fixation() {
        let mut d = detector();
        feed(&mut d, &STEADY);

        let result = d.observe((500.0, 500.0), 45.0);

        assert!(result.is_none());
        assert!(d.current().is_none());
        assert_eq!(d.closed().len(), 1);
        assert_eq!(d.closed()[0].start_time_ms, 0.0);
        assert_eq!(d.closed()[0].duration_ms, 40.0);
        // Window is not cleared on close
        assert_eq!(d.history_len(), 5);
    }

    #[test]
    fn test_open_fixation_keeps_start_and_position() {
        let mut d = detector();
        let opened = feed(&mut d, &STEADY).unwrap();

        // Still within 20px of the pivot (100,100) but shifts the window mean
        let updated = feed(&mut d, &[(115.0, 110.0, 60.0), (112.0, 108.0, 80.0)]).unwrap();

        assert_eq!(updated.start_time_ms, opened.start_time_ms);
        assert_eq!(updated.position, opened.position);
        assert_eq!(updated.duration_ms, 80.0);
    }

    #[test]
    fn test_opens_exactly_once_while_stable() {
        let mut d = detector();
        let mut opened = 0;
        let mut was_open = false;
        for i in 0..30 {
            let t = i as f64 * 10.0;
            let x = 200.0 + (i % 3) as f64;
            let is_open = d.observe((x, 300.0), t).is_some();
            if is_open && !was_open {
                opened += 1;
            }
            was_open = is_open;
        }
        assert_eq!(opened, 1);
        assert!(d.closed().is_empty());
    }

    #[test]
    fn test_window_capped_at_capacity() {
        let mut d = detector();
        for i in 0..10 {
            d.observe((0.0, 0.0), i as f64);
        }
        assert_eq!(d.history_len(), 10);

        d.observe((0.0, 0.0), 10.0);
        assert_eq!(d.history_len(), 10);
    }

    #[test]
    fn test_eviction_moves_pivot_and_duration() {
        let mut d = detector();
        // 11 samples, 3ms apart: after eviction the window spans t=3..30 (27ms)
        for i in 0..11 {
            d.observe((0.0, 0.0), i as f64 * 3.0);
        }
        assert!(d.current().is_none());

        let fixation = d.observe((0.0, 0.0), 36.0).unwrap();
        // Window now holds t=6..36
        assert_eq!(fixation.start_time_ms, 6.0);
        assert_eq!(fixation.duration_ms, 30.0);
    }

    #[test]
    fn test_pivot_is_first_sample_not_diameter() {
        let mut d = detector();
        // Pairwise spread is 38px, but every sample is within 19px of the pivot
        let fixation = feed(
            &mut d,
            &[(100.0, 100.0, 0.0), (119.0, 100.0, 20.0), (81.0, 100.0, 40.0)],
        );
        assert!(fixation.is_some());
    }

    #[test]
    fn test_threshold_is_strict() {
        let mut d = detector();
        let fixation = feed(&mut d, &[(0.0, 0.0, 0.0), (20.0, 0.0, 50.0)]);
        assert!(fixation.is_none());
    }

    #[test]
    fn test_new_fixation_reuses_window_samples() {
        let mut d = FixationDetector::new(20.0, 30.0, 4);
        feed(&mut d, &STEADY);
        d.observe((500.0, 500.0), 45.0);
        assert_eq!(d.closed().len(), 1);

        // Pivot is still one of the old samples
        assert!(d.observe((500.0, 500.0), 50.0).is_none());
        assert!(d.observe((500.0, 501.0), 55.0).is_none());

        // The sample that broke the old fixation becomes the new pivot
        let reopened = d.observe((501.0, 500.0), 80.0).unwrap();
        assert_eq!(reopened.start_time_ms, 45.0);
        assert_eq!(reopened.duration_ms, 35.0);
        assert_eq!(d.closed().len(), 1);
    }

    #[test]
    fn test_long_fixation_duration_is_window_span() {
        let mut d = detector();
        for i in 0..30 {
            d.observe((100.0, 100.0), i as f64 * 10.0);
        }
        d.observe((500.0, 500.0), 300.0);

        // Duration is the span of the last stable window (200..290), not 0..290
        let closed = d.closed()[0];
        assert_eq!(closed.start_time_ms, 0.0);
        assert_eq!(closed.duration_ms, 90.0);
        assert_eq!(closed.position, Some((100.0, 100.0)));
    }

    #[test]
    fn test_take_closed_and_reset() {
        let mut d = detector();
        feed(&mut d, &STEADY);
        d.observe((500.0, 500.0), 45.0);

        let closed = d.take_closed();
        assert_eq!(closed.len(), 1);
        assert!(d.closed().is_empty());
        assert_eq!(d.history_len(), 5);

        d.reset();
        assert_eq!(d.history_len(), 0);
        assert!(d.current().is_none());
    }
}
