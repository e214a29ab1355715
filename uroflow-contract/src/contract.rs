//! `ios_capture_v1` Contract Validation
//!
//! Converts an untyped JSON document into a typed [`CapturePayload`], or
//! explains precisely why it cannot. Checks run in a fixed order and stop at
//! the first violation:
//!
//! ```text
//! 1. schema_version == "ios_capture_v1"
//! 2. session: session_id, started_at, mode, calibration.ml_per_mm
//! 3. samples is an array of at least two entries, each an object
//! 4. every t_s finite and non-decreasing
//! 5. every depth_confidence in [0, 1]
//! 6. every sample: level fields number|null, at least one present
//! 7. every sample: roi_valid bool, motion_norm >= 0, audio_rms_dbfs numeric
//! ```
//!
//! Steps 4 to 7 each sweep the whole sample array before the next starts, so
//! a regressing timestamp is reported ahead of a bad confidence at an
//! earlier index.
//!
//! Optional session fields are lenient: a malformed confidence override or
//! privacy flag falls back to its default with a warning, and a non-string
//! `sync_id` is kept in its JSON text form.
//!
//! Validation is pure and total: every input yields either a payload or a
//! [`ContractError`], and no numeric stage runs on a rejected document.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use log::{debug, warn};
use serde_json::{Map, Value};

use uroflow_core::{
    Calibration, CaptureMode, CapturePayload, CaptureSession, ContractError, ContractResult,
    PrivacyFlags, RuntimeHints, Sample, SCHEMA_VERSION,
};

/// Naive timestamp layouts accepted for `started_at`
const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Validate a capture document and build the typed payload.
pub fn validate_payload(document: &Value) -> ContractResult<CapturePayload> {
    let result = parse_payload(document);
    match &result {
        Ok(payload) => debug!(
            "contract: session {} accepted with {} samples",
            payload.session.session_id,
            payload.samples.len()
        ),
        Err(err) => warn!("contract: rejected capture: {}", err),
    }
    result
}

fn parse_payload(document: &Value) -> ContractResult<CapturePayload> {
    let root = document
        .as_object()
        .ok_or(ContractError::UnsupportedSchema { found: None })?;

    match root.get("schema_version") {
        Some(Value::String(tag)) if tag == SCHEMA_VERSION => {}
        other => {
            return Err(ContractError::UnsupportedSchema {
                found: other.map(|v| v.as_str().map(String::from).unwrap_or_else(|| v.to_string())),
            })
        }
    }

    let session = parse_session(root.get("session"))?;

    let raw_samples = match root.get("samples") {
        Some(Value::Array(items)) => items,
        _ => return Err(ContractError::SamplesNotAnArray),
    };
    if raw_samples.len() < 2 {
        return Err(ContractError::TooFewSamples { count: raw_samples.len() });
    }

    let rows = raw_samples
        .iter()
        .enumerate()
        .map(|(index, raw)| {
            raw.as_object()
                .ok_or(ContractError::InvalidSample { index, field: "sample" })
        })
        .collect::<ContractResult<Vec<_>>>()?;

    let times = check_times(&rows)?;
    let confidences = check_confidences(&rows)?;
    let levels = check_levels(&rows)?;
    let samples = rows
        .iter()
        .enumerate()
        .map(|(index, row)| {
            let (depth, rgb) = levels[index];
            let (roi_valid, audio, motion) = sample_proxies(index, row)?;
            Ok(Sample::new(times[index], depth, rgb, confidences[index], roi_valid)
                .with_proxies(audio, motion))
        })
        .collect::<ContractResult<Vec<_>>>()?;

    Ok(CapturePayload {
        schema_version: SCHEMA_VERSION.into(),
        session,
        samples,
        analysis: parse_hints(root.get("analysis")),
    })
}

fn invalid_session(field: &'static str, reason: &'static str) -> ContractError {
    ContractError::InvalidSession { field, reason }
}

fn parse_session(value: Option<&Value>) -> ContractResult<CaptureSession> {
    let session = value
        .and_then(Value::as_object)
        .ok_or_else(|| invalid_session("session", "must be an object"))?;

    let session_id = match session.get("session_id") {
        Some(Value::String(id)) if !id.trim().is_empty() => id.clone(),
        _ => return Err(invalid_session("session_id", "must be a non-empty string")),
    };

    let started_at = match session.get("started_at") {
        Some(Value::String(text)) if is_iso8601(text) => text.clone(),
        _ => return Err(invalid_session("started_at", "must be an ISO-8601 timestamp")),
    };

    let mode = session
        .get("mode")
        .and_then(Value::as_str)
        .and_then(CaptureMode::from_name)
        .ok_or_else(|| invalid_session("mode", "must be one of jet_in_air, porcelain_wall, water_impact"))?;

    let calibration = session
        .get("calibration")
        .and_then(Value::as_object)
        .ok_or_else(|| invalid_session("calibration", "must be an object"))?;
    let ml_per_mm = match finite_number(calibration.get("ml_per_mm")) {
        Some(value) if value > 0.0 => value,
        _ => return Err(invalid_session("calibration.ml_per_mm", "must be a positive number")),
    };
    let min_depth_confidence = confidence_override(calibration.get("min_depth_confidence"));

    let sync_id = match session.get("sync_id") {
        None | Some(Value::Null) => None,
        Some(Value::String(id)) => Some(id.clone()),
        Some(other) => Some(other.to_string()),
    };

    let privacy = match session.get("privacy") {
        Some(Value::Object(flags)) => PrivacyFlags {
            full_frame_storage: lenient_bool(flags, "full_frame_storage"),
            audio_stored: lenient_bool(flags, "audio_stored"),
        },
        None | Some(Value::Null) => PrivacyFlags::default(),
        Some(_) => {
            warn!("contract: session.privacy is not an object, using defaults");
            PrivacyFlags::default()
        }
    };

    Ok(CaptureSession {
        session_id,
        sync_id,
        started_at,
        mode,
        calibration: Calibration { ml_per_mm, min_depth_confidence },
        privacy,
    })
}

type Row<'a> = &'a Map<String, Value>;

fn check_times(rows: &[Row<'_>]) -> ContractResult<Vec<f64>> {
    let mut times = Vec::with_capacity(rows.len());
    for (index, row) in rows.iter().enumerate() {
        let t_s = finite_number(row.get("t_s"))
            .ok_or(ContractError::InvalidSample { index, field: "t_s" })?;
        if times.last().map_or(false, |previous| t_s < *previous) {
            return Err(ContractError::NonMonotonicTime { index });
        }
        times.push(t_s);
    }
    Ok(times)
}

fn check_confidences(rows: &[Row<'_>]) -> ContractResult<Vec<f64>> {
    rows.iter()
        .enumerate()
        .map(|(index, row)| {
            let value = finite_number(row.get("depth_confidence"))
                .ok_or(ContractError::InvalidSample { index, field: "depth_confidence" })?;
            if (0.0..=1.0).contains(&value) {
                Ok(value)
            } else {
                Err(ContractError::ConfidenceOutOfRange { index, value })
            }
        })
        .collect()
}

fn check_levels(rows: &[Row<'_>]) -> ContractResult<Vec<(Option<f64>, Option<f64>)>> {
    rows.iter()
        .enumerate()
        .map(|(index, row)| {
            let invalid = |field: &'static str| ContractError::InvalidSample { index, field };
            let depth = nullable_number(row, "depth_level_mm").ok_or_else(|| invalid("depth_level_mm"))?;
            let rgb = nullable_number(row, "rgb_level_mm").ok_or_else(|| invalid("rgb_level_mm"))?;
            if depth.is_none() && rgb.is_none() {
                return Err(ContractError::MissingLevelChannel { index });
            }
            Ok((depth, rgb))
        })
        .collect()
}

/// ROI flag, audio and motion for one sample
fn sample_proxies(index: usize, row: Row<'_>) -> ContractResult<(bool, Option<f64>, Option<f64>)> {
    let invalid = |field: &'static str| ContractError::InvalidSample { index, field };

    let roi_valid = row
        .get("roi_valid")
        .and_then(Value::as_bool)
        .ok_or_else(|| invalid("roi_valid"))?;

    let motion_norm = nullable_number(row, "motion_norm").ok_or_else(|| invalid("motion_norm"))?;
    if motion_norm.map_or(false, |m| m < 0.0) {
        return Err(invalid("motion_norm"));
    }
    let audio_rms_dbfs =
        nullable_number(row, "audio_rms_dbfs").ok_or_else(|| invalid("audio_rms_dbfs"))?;

    Ok((roi_valid, audio_rms_dbfs, motion_norm))
}

/// On-device hints are informational; malformed hints are dropped, not fatal.
fn parse_hints(value: Option<&Value>) -> Option<RuntimeHints> {
    match value {
        None | Some(Value::Null) => None,
        Some(raw) => match serde_json::from_value(raw.clone()) {
            Ok(hints) => Some(hints),
            Err(err) => {
                warn!("contract: ignoring malformed analysis hints: {}", err);
                None
            }
        },
    }
}

/// A finite JSON number. Booleans are not numbers.
fn finite_number(value: Option<&Value>) -> Option<f64> {
    value.and_then(Value::as_f64).filter(|v| v.is_finite())
}

/// `Some(None)` for absent or null, `Some(Some(v))` for a finite number,
/// `None` for anything else.
fn nullable_number(object: &Map<String, Value>, key: &str) -> Option<Option<f64>> {
    match object.get(key) {
        None | Some(Value::Null) => Some(None),
        value => finite_number(value).map(Some),
    }
}

/// Session confidence override. Numbers and numeric strings are accepted;
/// anything else is ignored so the engine default applies.
fn confidence_override(value: Option<&Value>) -> Option<f64> {
    let parsed = match value {
        None | Some(Value::Null) => return None,
        Some(Value::String(text)) => text.trim().parse::<f64>().ok(),
        Some(other) => other.as_f64(),
    };
    match parsed.filter(|v| v.is_finite()) {
        Some(v) => Some(v),
        None => {
            warn!("contract: ignoring malformed calibration.min_depth_confidence");
            None
        }
    }
}

/// Absent or malformed means `false`
fn lenient_bool(object: &Map<String, Value>, key: &str) -> bool {
    match object.get(key) {
        None | Some(Value::Null) => false,
        Some(Value::Bool(flag)) => *flag,
        Some(_) => {
            warn!("contract: ignoring non-boolean privacy.{}", key);
            false
        }
    }
}

/// RFC 3339 (`Z` or offset), naive date-time, or a bare date.
pub fn is_iso8601(text: &str) -> bool {
    if text.is_empty() {
        return false;
    }
    DateTime::parse_from_rfc3339(text).is_ok()
        || NAIVE_FORMATS
            .iter()
            .any(|format| NaiveDateTime::parse_from_str(text, format).is_ok())
        || NaiveDate::parse_from_str(text, "%Y-%m-%d").is_ok()
}
