//! Per-frame driver loop
//!
//! Pulls frames from a source and steps a [`SessionController`] until the
//! source ends, the stop predicate fires, or a frame fails. Failures are
//! caught here and reported in the [`LoopOutcome`]; they never propagate past
//! the loop. The source is taken by value, so its capture handle is released
//! on every exit path.

use crate::session::{FrameOutcome, SessionController};
use crate::sources::{FrameSource, LandmarkSource};
use tracing::{debug, error};

/// Why the loop ended and how far it got
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoopOutcome {
    /// Frames pulled from the source and fully processed
    pub frames_processed: usize,
    /// Frames in which both pupils were found
    pub frames_with_face: usize,
    /// True when the stop predicate ended the loop
    pub stopped: bool,
    /// Message of the error that ended the loop, if any
    pub error: Option<String>,
}

/// Session recorder driving a controller from a frame source
pub struct Recorder;

impl Recorder {
    /// Run until the source is exhausted or `should_stop` returns true.
    ///
    /// `should_stop` is polled before each frame is read, so a frame already
    /// in progress always completes.
    pub fn run<S, P>(session: &mut SessionController, source: S, should_stop: P) -> LoopOutcome
    where
        S: FrameSource + LandmarkSource,
        P: FnMut(&SessionController) -> bool,
    {
        Self::run_with(session, source, should_stop, |_| {})
    }

    /// Like [`Recorder::run`], calling `on_frame` after every frame with a face
    pub fn run_with<S, P, F>(
        session: &mut SessionController,
        mut source: S,
        mut should_stop: P,
        mut on_frame: F,
    ) -> LoopOutcome
    where
        S: FrameSource + LandmarkSource,
        P: FnMut(&SessionController) -> bool,
        F: FnMut(&FrameOutcome),
    {
        let mut outcome = LoopOutcome::default();

        loop {
            if should_stop(session) {
                outcome.stopped = true;
                break;
            }

            let captured = match source.next_frame() {
                Ok(Some(captured)) => captured,
                Ok(None) => break,
                Err(e) => {
                    error!(
                        error = %e,
                        frames = outcome.frames_processed,
                        "frame acquisition failed"
                    );
                    outcome.error = Some(e.to_string());
                    break;
                }
            };

            match session.step(&mut source, &captured.frame, captured.timestamp_ms) {
                Ok(Some(frame)) => {
                    outcome.frames_with_face += 1;
                    on_frame(&frame);
                }
                Ok(None) => {}
                Err(e) => {
                    error!(
                        error = %e,
                        frames = outcome.frames_processed,
                        "frame processing failed"
                    );
                    outcome.error = Some(e.to_string());
                    break;
                }
            }
            outcome.frames_processed += 1;
        }

        debug!(
            frames = outcome.frames_processed,
            with_face = outcome.frames_with_face,
            "capture loop finished"
        );
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrackerConfig;
    use crate::error::TrackingError;
    use crate::sources::{CapturedFrame, Paired, ReplayFrame, ReplaySource};
    use crate::types::{Frame, FrameSize, LandmarkSet};
    use std::cell::Cell;
    use std::rc::Rc;

    /// Camera stub that fails after `fail_after` frames and records release
    struct FakeCamera {
        produced: usize,
        fail_after: usize,
        released: Rc<Cell<bool>>,
    }

    impl FrameSource for FakeCamera {
        fn next_frame(&mut self) -> Result<Option<CapturedFrame>, TrackingError> {
            if self.produced == self.fail_after {
                return Err(TrackingError::FrameSource("camera unplugged".to_string()));
            }
            self.produced += 1;
            Ok(Some(CapturedFrame {
                frame: Frame::new(FrameSize::new(100, 100), vec![0; 100 * 100 * 3]),
                timestamp_ms: self.produced as f64 * 10.0,
            }))
        }
    }

    impl Drop for FakeCamera {
        fn drop(&mut self) {
            self.released.set(true);
        }
    }

    /// Detector stub that always finds the same face
    struct FixedFace;

    impl LandmarkSource for FixedFace {
        fn detect(&mut self, frame: &Frame) -> Result<Option<LandmarkSet>, TrackingError> {
            let expected = frame.size.width as usize * frame.size.height as usize * 3;
            assert_eq!(frame.pixels.len(), expected);
            Ok(Some(LandmarkSet::from(vec![(0.5, 0.5), (0.5, 0.5)])))
        }
    }

    fn config() -> TrackerConfig {
        TrackerConfig {
            left_iris: vec![0],
            right_iris: vec![1],
            ..Default::default()
        }
    }

    #[test]
    fn test_error_caught_and_camera_released() {
        let released = Rc::new(Cell::new(false));
        let camera = FakeCamera {
            produced: 0,
            fail_after: 3,
            released: released.clone(),
        };
        let mut session = SessionController::new(config()).unwrap();
        session.start();

        let outcome = Recorder::run(&mut session, Paired::new(camera, FixedFace), |_| false);

        assert_eq!(outcome.frames_processed, 3);
        assert_eq!(outcome.error.as_deref(), Some("Frame source error: camera unplugged"));
        assert!(released.get());
        assert_eq!(session.records().len(), 3);
    }

    #[test]
    fn test_stop_predicate_polled_between_frames() {
        let released = Rc::new(Cell::new(false));
        let camera = FakeCamera {
            produced: 0,
            fail_after: usize::MAX,
            released: released.clone(),
        };
        let mut session = SessionController::new(config()).unwrap();
        session.start();

        let outcome = Recorder::run(&mut session, Paired::new(camera, FixedFace), |s| {
            s.records().len() >= 5
        });

        assert!(outcome.stopped);
        assert!(outcome.error.is_none());
        assert_eq!(session.records().len(), 5);
        assert!(released.get());
    }

    #[test]
    fn test_processing_error_ends_loop() {
        // Default iris indices need a 478-point mesh; two points trigger an index error
        let source = ReplaySource::new(vec![ReplayFrame {
            timestamp_ms: 0.0,
            width: 100,
            height: 100,
            landmarks: Some(vec![[0.5, 0.5], [0.5, 0.5]]),
        }]);
        let mut session = SessionController::with_defaults();
        session.start();

        let outcome = Recorder::run(&mut session, source, |_| false);

        assert_eq!(outcome.frames_processed, 0);
        assert!(outcome.error.unwrap().contains("out of range"));
    }

    #[test]
    fn test_replay_to_exhaustion_reports_fixations() {
        let frames = (0..6)
            .map(|i| ReplayFrame {
                timestamp_ms: i as f64 * 15.0,
                width: 100,
                height: 100,
                landmarks: if i == 2 {
                    None
                } else {
                    Some(vec![[0.4, 0.4], [0.6, 0.4]])
                },
            })
            .collect();
        let mut session = SessionController::new(config()).unwrap();
        session.start();

        let mut fixation_frames = 0;
        let outcome = Recorder::run_with(
            &mut session,
            ReplaySource::new(frames),
            |_| false,
            |frame| {
                if frame.fixation.is_some() {
                    fixation_frames += 1;
                }
            },
        );

        assert_eq!(outcome.frames_processed, 6);
        assert_eq!(outcome.frames_with_face, 5);
        assert!(!outcome.stopped);
        // Opens at t=45 (window t=0..45); t=60 and t=75 keep it open
        assert_eq!(fixation_frames, 3);
    }
}
