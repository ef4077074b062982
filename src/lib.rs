//! readgaze - gaze-to-fixation signal processing for reading-behaviour screening
//!
//! readgaze turns per-frame facial landmarks into pupil centers, averages them
//! into a gaze point, and segments the gaze stream into fixations with a
//! sliding-window state machine. At the end of a recording session the
//! fixation stream is aggregated into the feature table consumed by a risk
//! classifier.
//!
//! Pipeline: landmarks -> pupil locator -> gaze point -> fixation detector ->
//! tracking records -> fixation feature rows -> classifier

pub mod classifier;
pub mod config;
pub mod error;
pub mod export;
pub mod features;
pub mod fixation;
pub mod pipeline;
pub mod pupil;
pub mod recorder;
pub mod session;
pub mod sources;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use classifier::{LogisticRiskModel, RiskClassifier};
pub use config::TrackerConfig;
pub use error::TrackingError;
pub use fixation::FixationDetector;
pub use pipeline::{replay_session, replay_to_report};
pub use pupil::{locate, PupilLocator};
pub use recorder::{LoopOutcome, Recorder};
pub use session::{SessionController, StoppedSession};
pub use sources::{FrameSource, LandmarkSource, ReplaySource};

/// readgaze version
pub const READGAZE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for reports and diagnostics
pub const PRODUCER_NAME: &str = "readgaze";
