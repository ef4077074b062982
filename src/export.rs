//! CSV export of per-frame tracking records
//!
//! Column layout:
//! `timestamp,left_pupil_x,left_pupil_y,right_pupil_x,right_pupil_y,is_fixation,fixation_duration,fixation_x,fixation_y`.
//! The fixation columns are left empty for frames without a fixation.

use crate::error::TrackingError;
use crate::types::TrackingRecord;
use chrono::{DateTime, Utc};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub const CSV_HEADER: &str = concat!(
    "timestamp,left_pupil_x,left_pupil_y,right_pupil_x,right_pupil_y,",
    "is_fixation,fixation_duration,fixation_x,fixation_y"
);

/// File name for a session stopped at `stopped_at`
pub fn session_filename(stopped_at: DateTime<Utc>) -> String {
    format!(
        "pupil_tracking_data_{}.csv",
        stopped_at.format("%Y%m%d_%H%M%S")
    )
}

/// Write the header and one row per record.
///
/// Floats always carry a fractional part (`40.0`, not `40`).
pub fn write_records<W: Write>(
    writer: &mut W,
    records: &[TrackingRecord],
) -> Result<(), TrackingError> {
    writeln!(writer, "{}", CSV_HEADER)?;
    for record in records {
        write!(
            writer,
            "{:?},{},{},{},{},",
            record.timestamp_ms,
            record.left_pupil.x,
            record.left_pupil.y,
            record.right_pupil.x,
            record.right_pupil.y
        )?;
        match &record.fixation {
            Some(fixation) => writeln!(
                writer,
                "True,{:?},{},{}",
                fixation.duration_ms,
                optional(fixation.x),
                optional(fixation.y)
            )?,
            None => writeln!(writer, "False,,,")?,
        }
    }
    Ok(())
}

/// Write `records` into `dir` under the session file name; returns the path
pub fn save_session(
    dir: &Path,
    stopped_at: DateTime<Utc>,
    records: &[TrackingRecord],
) -> Result<PathBuf, TrackingError> {
    let path = dir.join(session_filename(stopped_at));
    let mut writer = BufWriter::new(File::create(&path)?);
    write_records(&mut writer, records)?;
    writer.flush()?;
    Ok(path)
}

fn optional(value: Option<f64>) -> String {
    value.map(|v| format!("{:?}", v)).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FixationSample, PixelPoint};
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_filename_uses_stop_time() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(session_filename(at), "pupil_tracking_data_20240309_140507.csv");
    }

    #[test]
    fn test_rows_leave_fixation_columns_empty() {
        let records = vec![
            TrackingRecord {
                timestamp_ms: 1000.5,
                left_pupil: PixelPoint::new(310, 240),
                right_pupil: PixelPoint::new(370, 242),
                fixation: None,
            },
            TrackingRecord {
                timestamp_ms: 1040.0,
                left_pupil: PixelPoint::new(311, 240),
                right_pupil: PixelPoint::new(371, 241),
                fixation: Some(FixationSample {
                    duration_ms: 39.5,
                    x: Some(340.25),
                    y: Some(241.0),
                }),
            },
        ];

        let mut out = Vec::new();
        write_records(&mut out, &records).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(
            text,
            format!(
                "{}\n{}\n{}\n",
                CSV_HEADER,
                "1000.5,310,240,370,242,False,,,",
                "1040.0,311,240,371,241,True,39.5,340.25,241.0"
            )
        );
    }

    #[test]
    fn test_whole_floats_keep_fraction() {
        assert_eq!(optional(Some(200.0)), "200.0");
        assert_eq!(optional(None), "");
    }

    #[test]
    fn test_save_session_writes_file() {
        let dir = std::env::temp_dir().join(format!("readgaze-export-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();

        let path = save_session(&dir, at, &[]).unwrap();

        assert!(path.ends_with("pupil_tracking_data_20240102_030405.csv"));
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, format!("{}\n", CSV_HEADER));
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
