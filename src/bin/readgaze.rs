//! readgaze CLI - command-line interface for readgaze
//!
//! Commands:
//! - replay: Run a recorded landmark stream through a full session
//! - fixations: Print the fixations detected in a recorded stream
//! - config: Print the default tracker configuration
//! - doctor: Diagnose configuration and model files

use clap::{Parser, Subcommand};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};

use readgaze::classifier::LogisticRiskModel;
use readgaze::config::TrackerConfig;
use readgaze::export::save_session;
use readgaze::fixation::FixationDetector;
use readgaze::pipeline::replay_session;
use readgaze::pupil::PupilLocator;
use readgaze::sources::{FrameSource, LandmarkSource, ReplaySource};
use readgaze::types::{Fixation, SessionStatus};
use readgaze::{PRODUCER_NAME, READGAZE_VERSION};

/// readgaze - fixation detection and reading-risk screening from gaze
#[derive(Parser)]
#[command(name = "readgaze")]
#[command(version = READGAZE_VERSION)]
#[command(
    about = "Turn recorded facial landmarks into fixations and a risk estimate",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a recorded landmark stream through a full session
    Replay {
        /// Input NDJSON file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Tracker configuration JSON
        #[arg(long)]
        config: Option<PathBuf>,

        /// Risk model weights JSON
        #[arg(long)]
        model: PathBuf,

        /// Directory for the per-frame CSV
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the fixations detected in a recorded stream as NDJSON
    Fixations {
        /// Input NDJSON file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Tracker configuration JSON
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Print the default tracker configuration
    Config,

    /// Diagnose configuration and model files
    Doctor {
        /// Tracker configuration JSON to check
        #[arg(long)]
        config: Option<PathBuf>,

        /// Risk model weights JSON to check
        #[arg(long)]
        model: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "readgaze=info".into()),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let payload = serde_json::to_string(&CliError::from(e))
                .unwrap_or_else(|_| "Unknown error".to_string());
            eprintln!("{}", payload);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), GazeCliError> {
    match cli.command {
        Commands::Replay {
            input,
            config,
            model,
            output_dir,
            json,
        } => cmd_replay(&input, config.as_deref(), &model, &output_dir, json),

        Commands::Fixations { input, config } => cmd_fixations(&input, config.as_deref()),

        Commands::Config => {
            println!("{}", TrackerConfig::default().to_json()?);
            Ok(())
        }

        Commands::Doctor { config, model, json } => {
            cmd_doctor(config.as_deref(), model.as_deref(), json)
        }
    }
}

fn cmd_replay(
    input: &Path,
    config: Option<&Path>,
    model: &Path,
    output_dir: &Path,
    json: bool,
) -> Result<(), GazeCliError> {
    let source = ReplaySource::parse_ndjson(&read_input(input)?)?;
    let config = load_config(config)?;
    let model = LogisticRiskModel::from_json(&fs::read_to_string(model)?)?;

    info!(frames = source.remaining(), "replaying recorded stream");
    let result = replay_session(source, config, &model)?;

    if let Some(message) = &result.outcome.error {
        warn!(error = %message, "replay ended early");
    }

    let report = &result.session.report;
    let saved = if result.session.records.is_empty() {
        None
    } else {
        Some(save_session(output_dir, report.stopped_at, &result.session.records)?)
    };

    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        println!("Session Report");
        println!("==============");
        println!("Session:          {}", report.session_id);
        println!("Frames recorded:  {}", report.frames_recorded);
        println!("Fixation rows:    {}", report.fixation_rows);
        println!("Closed fixations: {}", report.closed_fixations);
        if let Some(mean) = report.mean_fixation_duration_ms {
            println!("Mean duration:    {:.1} ms", mean);
        }

        match (report.status, report.assessment) {
            (SessionStatus::Classified, Some(assessment)) => {
                println!();
                println!("Probability of dyslexia risk:    {:.2}%", assessment.p_risk * 100.0);
                println!("Probability of no dyslexia risk: {:.2}%", assessment.p_no_risk * 100.0);
                println!(
                    "Screening result: {}",
                    if model.is_at_risk(&assessment) {
                        "at risk"
                    } else {
                        "not at risk"
                    }
                );
            }
            (SessionStatus::ClassifierFailed, _) => {
                println!();
                println!(
                    "Classification failed: {}",
                    report.classifier_error.as_deref().unwrap_or("unknown error")
                );
            }
            _ => {
                println!();
                println!("No data: no fixations were recorded, classification skipped");
            }
        }

        if let Some(path) = &saved {
            println!("\nData saved to {}", path.display());
        }
    }

    match result.outcome.error {
        Some(message) => Err(GazeCliError::LoopAborted(message)),
        None => Ok(()),
    }
}

fn cmd_fixations(input: &Path, config: Option<&Path>) -> Result<(), GazeCliError> {
    let mut source = ReplaySource::parse_ndjson(&read_input(input)?)?;
    let config = load_config(config)?;
    let locator = PupilLocator::from_config(&config);
    let mut detector = FixationDetector::from_config(&config);

    while let Some(captured) = source.next_frame()? {
        let landmarks = source.detect(&captured.frame)?;
        if let Some(pupils) = locator.locate(landmarks.as_ref(), captured.frame.size)? {
            detector.observe(pupils.midpoint(), captured.timestamp_ms);
        }
    }

    for fixation in detector.closed() {
        println!("{}", fixation_line(fixation, "closed")?);
    }
    if let Some(open) = detector.current() {
        println!("{}", fixation_line(open, "open")?);
    }

    Ok(())
}

fn fixation_line(fixation: &Fixation, state: &str) -> Result<String, GazeCliError> {
    let value = serde_json::json!({
        "state": state,
        "start_time_ms": fixation.start_time_ms,
        "duration_ms": fixation.duration_ms,
        "x": fixation.position.map(|p| p.0),
        "y": fixation.position.map(|p| p.1),
    });
    Ok(serde_json::to_string(&value)?)
}

fn cmd_doctor(config: Option<&Path>, model: Option<&Path>, json: bool) -> Result<(), GazeCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "version".to_string(),
        status: CheckStatus::Ok,
        message: format!("readgaze version {}", READGAZE_VERSION),
    });

    if let Some(path) = config {
        checks.push(check_file(path, "config", |content| {
            TrackerConfig::from_json(content).map(|c| {
                format!(
                    "threshold {} px, duration {} ms, window {}",
                    c.fixation_threshold_px, c.fixation_duration_ms, c.history_capacity
                )
            })
        }));
    }

    if let Some(path) = model {
        checks.push(check_file(path, "model", |content| {
            LogisticRiskModel::from_json(content).map(|m| format!("threshold {}", m.threshold))
        }));
    }

    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (pass --input <file>)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (--input - ready)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: READGAZE_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("readgaze Doctor Report");
        println!("======================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report.checks.iter().any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(GazeCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

// Helper functions

fn check_file<F>(path: &Path, name: &str, parse: F) -> DoctorCheck
where
    F: FnOnce(&str) -> Result<String, readgaze::TrackingError>,
{
    if !path.exists() {
        return DoctorCheck {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: format!("{} does not exist", path.display()),
        };
    }
    match fs::read_to_string(path) {
        Ok(content) => match parse(&content) {
            Ok(summary) => DoctorCheck {
                name: name.to_string(),
                status: CheckStatus::Ok,
                message: format!("valid ({})", summary),
            },
            Err(e) => DoctorCheck {
                name: name.to_string(),
                status: CheckStatus::Error,
                message: e.to_string(),
            },
        },
        Err(e) => DoctorCheck {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: format!("Cannot read file: {}", e),
        },
    }
}

fn read_input(input: &Path) -> Result<String, GazeCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn load_config(path: Option<&Path>) -> Result<TrackerConfig, GazeCliError> {
    match path {
        Some(path) => Ok(TrackerConfig::from_json(&fs::read_to_string(path)?)?),
        None => Ok(TrackerConfig::default()),
    }
}

// Error types

#[derive(Debug)]
enum GazeCliError {
    Io(io::Error),
    Tracking(readgaze::TrackingError),
    Json(serde_json::Error),
    LoopAborted(String),
    DoctorFailed,
}

impl From<io::Error> for GazeCliError {
    fn from(e: io::Error) -> Self {
        GazeCliError::Io(e)
    }
}

impl From<readgaze::TrackingError> for GazeCliError {
    fn from(e: readgaze::TrackingError) -> Self {
        GazeCliError::Tracking(e)
    }
}

impl From<serde_json::Error> for GazeCliError {
    fn from(e: serde_json::Error) -> Self {
        GazeCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<GazeCliError> for CliError {
    fn from(e: GazeCliError) -> Self {
        match e {
            GazeCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            GazeCliError::Tracking(e) => CliError {
                code: "TRACKING_ERROR".to_string(),
                message: e.to_string(),
                hint: Some(
                    "Run 'readgaze doctor' to check configuration and model files".to_string(),
                ),
            },
            GazeCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            GazeCliError::LoopAborted(message) => CliError {
                code: "LOOP_ABORTED".to_string(),
                message,
                hint: Some("Frames before the failure were still aggregated".to_string()),
            },
            GazeCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
