//! FFI bindings for readgaze
//!
//! This module provides C-compatible functions for calling readgaze from other
//! languages. Strings are null-terminated; strings returned by this module are
//! allocated here and must be freed with `readgaze_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;
use std::slice;

use crate::config::TrackerConfig;
use crate::fixation::FixationDetector;
use crate::pipeline::replay_to_report;
use crate::pupil::locate;
use crate::types::{FrameSize, LandmarkSet};

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Helper to convert C string to Rust string
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Helper to convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

// ============================================================================
// Fixation detector
// ============================================================================

/// Opaque handle to a FixationDetector
pub struct DetectorHandle {
    detector: FixationDetector,
}

/// Snapshot of an open fixation
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadgazeFixation {
    pub start_time_ms: f64,
    pub duration_ms: f64,
    pub x: f64,
    pub y: f64,
    /// 1 when `x`/`y` hold a centroid, 0 otherwise
    pub has_position: i32,
}

/// Create a fixation detector. Non-positive arguments select the defaults.
///
/// # Safety
/// - Returns a pointer that must be freed with `readgaze_detector_free`.
#[no_mangle]
pub unsafe extern "C" fn readgaze_detector_new(
    threshold_px: f64,
    duration_ms: f64,
    capacity: i32,
) -> *mut DetectorHandle {
    clear_last_error();

    let defaults = TrackerConfig::default();
    let config = TrackerConfig {
        fixation_threshold_px: if threshold_px > 0.0 {
            threshold_px
        } else {
            defaults.fixation_threshold_px
        },
        fixation_duration_ms: if duration_ms > 0.0 {
            duration_ms
        } else {
            defaults.fixation_duration_ms
        },
        history_capacity: if capacity > 0 {
            capacity as usize
        } else {
            defaults.history_capacity
        },
        ..defaults
    };

    if let Err(e) = config.validate() {
        set_last_error(&e.to_string());
        return ptr::null_mut();
    }

    Box::into_raw(Box::new(DetectorHandle {
        detector: FixationDetector::from_config(&config),
    }))
}

/// Feed one gaze sample.
///
/// Returns 1 and fills `out` when a fixation is open, 0 when none is open,
/// -1 on error.
///
/// # Safety
/// - `detector` must be a valid pointer returned by `readgaze_detector_new`.
/// - `out` must be NULL or point to writable memory for one `ReadgazeFixation`.
#[no_mangle]
pub unsafe extern "C" fn readgaze_detector_observe(
    detector: *mut DetectorHandle,
    x: f64,
    y: f64,
    timestamp_ms: f64,
    out: *mut ReadgazeFixation,
) -> i32 {
    clear_last_error();

    let Some(handle) = detector.as_mut() else {
        set_last_error("Null detector pointer");
        return -1;
    };

    match handle.detector.observe((x, y), timestamp_ms) {
        Some(fixation) => {
            if !out.is_null() {
                let (fx, fy) = fixation.position.unwrap_or((0.0, 0.0));
                *out = ReadgazeFixation {
                    start_time_ms: fixation.start_time_ms,
                    duration_ms: fixation.duration_ms,
                    x: fx,
                    y: fy,
                    has_position: fixation.position.is_some() as i32,
                };
            }
            1
        }
        None => 0,
    }
}

/// Number of closed fixations, or -1 for a null handle.
///
/// # Safety
/// - `detector` must be NULL or a valid pointer returned by `readgaze_detector_new`.
#[no_mangle]
pub unsafe extern "C" fn readgaze_detector_closed_count(detector: *const DetectorHandle) -> i64 {
    match detector.as_ref() {
        Some(handle) => handle.detector.closed().len() as i64,
        None => -1,
    }
}

/// Free a detector.
///
/// # Safety
/// - `detector` must be a valid pointer returned by `readgaze_detector_new`.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn readgaze_detector_free(detector: *mut DetectorHandle) {
    if !detector.is_null() {
        drop(Box::from_raw(detector));
    }
}

// ============================================================================
// Pupil location
// ============================================================================

/// Locate both pupils with the default iris index sets.
///
/// `coords` holds `count` landmarks as interleaved normalized `x, y` pairs;
/// NULL means no face. On success writes `[left_x, left_y, right_x, right_y]`
/// to `out` and returns 1. Returns 0 when there is no face, -1 on error.
///
/// # Safety
/// - `coords` must be NULL or point to `2 * count` readable doubles.
/// - `out` must point to 4 writable ints.
#[no_mangle]
pub unsafe extern "C" fn readgaze_locate_pupils(
    coords: *const f64,
    count: usize,
    width: u32,
    height: u32,
    out: *mut i32,
) -> i32 {
    clear_last_error();

    if out.is_null() {
        set_last_error("Null output pointer");
        return -1;
    }

    let landmarks = if coords.is_null() {
        None
    } else {
        let Some(len) = count.checked_mul(2) else {
            set_last_error("Landmark count overflows");
            return -1;
        };
        let flat = slice::from_raw_parts(coords, len);
        Some(LandmarkSet::from(
            flat.chunks_exact(2).map(|p| (p[0], p[1])).collect::<Vec<_>>(),
        ))
    };

    let config = TrackerConfig::default();
    match locate(
        landmarks.as_ref(),
        FrameSize::new(width, height),
        &config.left_iris,
        &config.right_iris,
    ) {
        Ok(Some(pupils)) => {
            let out = slice::from_raw_parts_mut(out, 4);
            out.copy_from_slice(&[pupils.left.x, pupils.left.y, pupils.right.x, pupils.right.y]);
            1
        }
        Ok(None) => 0,
        Err(e) => {
            set_last_error(&e.to_string());
            -1
        }
    }
}

// ============================================================================
// Replay
// ============================================================================

/// Replay NDJSON landmark frames and return the session report JSON.
///
/// # Safety
/// - `ndjson` and `model_json` must be valid null-terminated C strings.
/// - `config_json` may be NULL to use the default configuration.
/// - Returns a newly allocated string that must be freed with `readgaze_free_string`.
/// - Returns NULL on error; call `readgaze_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn readgaze_replay_ndjson(
    ndjson: *const c_char,
    config_json: *const c_char,
    model_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let Some(ndjson) = cstr_to_string(ndjson) else {
        set_last_error("Invalid NDJSON string pointer");
        return ptr::null_mut();
    };

    let Some(model) = cstr_to_string(model_json) else {
        set_last_error("Invalid model JSON string pointer");
        return ptr::null_mut();
    };

    let config = cstr_to_string(config_json);

    match replay_to_report(&ndjson, config.as_deref(), &model) {
        Ok(report) => string_to_cstr(&report),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Memory / errors / version
// ============================================================================

/// Free a string returned by this module.
///
/// # Safety
/// - `ptr` must be a string returned by a readgaze function, or NULL.
#[no_mangle]
pub unsafe extern "C" fn readgaze_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

/// Last error message on this thread, or NULL.
///
/// # Safety
/// - The returned pointer is valid until the next readgaze call on this thread. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn readgaze_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

/// Library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn readgaze_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    #[test]
    fn test_ffi_detector_lifecycle() {
        unsafe {
            let detector = readgaze_detector_new(0.0, 0.0, 0);
            assert!(!detector.is_null());

            let mut fixation = ReadgazeFixation::default();
            let samples = [(100.0, 100.0, 0.0), (101.0, 100.0, 5.0), (100.0, 101.0, 10.0)];
            for (x, y, t) in samples {
                assert_eq!(readgaze_detector_observe(detector, x, y, t, &mut fixation), 0);
            }

            let opened = readgaze_detector_observe(detector, 100.0, 100.0, 40.0, &mut fixation);
            assert_eq!(opened, 1);
            assert_eq!(fixation.start_time_ms, 0.0);
            assert_eq!(fixation.duration_ms, 40.0);
            assert_eq!(fixation.has_position, 1);

            let closed = readgaze_detector_observe(detector, 500.0, 500.0, 45.0, &mut fixation);
            assert_eq!(closed, 0);
            assert_eq!(readgaze_detector_closed_count(detector), 1);

            readgaze_detector_free(detector);
        }
    }

    #[test]
    fn test_ffi_null_detector() {
        unsafe {
            let result =
                readgaze_detector_observe(ptr::null_mut(), 0.0, 0.0, 0.0, ptr::null_mut());
            assert_eq!(result, -1);
            assert_eq!(readgaze_detector_closed_count(ptr::null()), -1);
            assert!(!readgaze_last_error().is_null());
        }
    }

    #[test]
    fn test_ffi_locate_pupils() {
        let mut coords = vec![0.0_f64; 478 * 2];
        for i in 469..=477 {
            coords[i * 2] = 0.25;
            coords[i * 2 + 1] = 0.5;
        }
        let mut out = [0_i32; 4];

        unsafe {
            let found = readgaze_locate_pupils(coords.as_ptr(), 478, 640, 480, out.as_mut_ptr());
            assert_eq!(found, 1);
            assert_eq!(out, [160, 240, 160, 240]);

            let none = readgaze_locate_pupils(ptr::null(), 0, 640, 480, out.as_mut_ptr());
            assert_eq!(none, 0);

            let short = readgaze_locate_pupils(coords.as_ptr(), 10, 640, 480, out.as_mut_ptr());
            assert_eq!(short, -1);
        }
    }

    #[test]
    fn test_ffi_locate_pupils_count_overflow() {
        let coords = [0.5_f64; 2];
        let mut out = [0_i32; 4];

        unsafe {
            let result =
                readgaze_locate_pupils(coords.as_ptr(), usize::MAX, 640, 480, out.as_mut_ptr());
            assert_eq!(result, -1);
            let error = CStr::from_ptr(readgaze_last_error()).to_str().unwrap();
            assert!(error.contains("overflows"));
        }
    }

    #[test]
    fn test_ffi_replay_error_handling() {
        unsafe {
            let ndjson = CString::new("not json").unwrap();
            let model = CString::new("{}").unwrap();

            let result = readgaze_replay_ndjson(ndjson.as_ptr(), ptr::null(), model.as_ptr());
            assert!(result.is_null());

            let error = readgaze_last_error();
            assert!(!error.is_null());
            let error_str = CStr::from_ptr(error).to_str().unwrap();
            assert!(!error_str.is_empty());
        }
    }

    #[test]
    fn test_ffi_replay_no_face() {
        unsafe {
            let ndjson = CString::new(
                r#"{"timestamp_ms": 0, "width": 640, "height": 480, "landmarks": null}"#,
            )
            .unwrap();
            let model = CString::new(
                r#"{"feature_means":[0,0,0],"feature_scales":[1,1,1],"weights":[0,0,0],"bias":0}"#,
            )
            .unwrap();

            let result = readgaze_replay_ndjson(ndjson.as_ptr(), ptr::null(), model.as_ptr());
            assert!(!result.is_null());
            let report = CStr::from_ptr(result).to_str().unwrap();
            assert!(report.contains("no_data"));

            readgaze_free_string(result);
        }
    }

    #[test]
    fn test_ffi_version() {
        unsafe {
            let version = readgaze_version();
            assert!(!version.is_null());
            let version_str = CStr::from_ptr(version).to_str().unwrap();
            assert!(!version_str.is_empty());
        }
    }
}
