//! JSON capture builders shared by the end-to-end tests
//!
//! - **A**: 20 samples, 0.5 s apart, bell flow of 300 mL, confident depth
//! - **B**: A with the ROI lost on every sample
//! - **C**: a single sample

#![allow(dead_code)]

use serde_json::{json, Value};

/// Receptacle calibration (mL/mm)
pub const ML_PER_MM: f64 = 8.0;

/// Receptacle level before voiding (mm)
pub const BASE_LEVEL_MM: f64 = 30.0;

/// True voided volume of scenarios A and B (mL)
pub const SCENARIO_VOLUME_ML: f64 = 300.0;

/// Number of samples in scenarios A and B
pub const SCENARIO_SAMPLES: usize = 20;

/// Level trace of a `sin^1.8` flow bell delivering `volume_ml`, starting at zero
pub fn bell_levels(n: usize, dt: f64, volume_ml: f64) -> Vec<(f64, f64)> {
    let duration = (n - 1) as f64 * dt;
    let raw: Vec<f64> = (0..n)
        .map(|i| (std::f64::consts::PI * i as f64 * dt / duration).sin().max(0.0).powf(1.8))
        .collect();
    let area: f64 = (1..n).map(|i| 0.5 * (raw[i] + raw[i - 1]) * dt).sum();
    let scale = volume_ml / area;

    let mut volume = 0.0;
    let mut out = vec![(0.0, 0.0)];
    for i in 1..n {
        volume += 0.5 * (raw[i] + raw[i - 1]) * scale * dt;
        out.push((i as f64 * dt, volume / ML_PER_MM));
    }
    out
}

/// Wrap sample objects into an `ios_capture_v1` document
pub fn document(samples: Vec<Value>) -> Value {
    json!({
        "schema_version": "ios_capture_v1",
        "session": {
            "session_id": "e2e-session",
            "sync_id": "queue-0001",
            "started_at": "2026-02-24T10:00:00Z",
            "mode": "water_impact",
            "calibration": { "ml_per_mm": ML_PER_MM, "min_depth_confidence": 0.6 },
            "privacy": { "full_frame_storage": false, "audio_stored": false }
        },
        "samples": samples
    })
}

/// Bell capture whose ROI validity is decided per sample index
pub fn bell_document(roi_valid: impl Fn(usize) -> bool) -> Value {
    let samples = bell_levels(SCENARIO_SAMPLES, 0.5, SCENARIO_VOLUME_ML)
        .into_iter()
        .enumerate()
        .map(|(i, (t, level))| {
            json!({
                "t_s": t,
                "depth_level_mm": BASE_LEVEL_MM + level,
                "rgb_level_mm": null,
                "depth_confidence": 0.95,
                "roi_valid": roi_valid(i)
            })
        })
        .collect();
    document(samples)
}

/// Clean bell capture
pub fn scenario_a() -> Value {
    bell_document(|_| true)
}

/// Clean bell capture with no ROI tracking
pub fn scenario_b() -> Value {
    bell_document(|_| false)
}

/// A single sample
pub fn scenario_c() -> Value {
    document(vec![json!({
        "t_s": 0.0,
        "depth_level_mm": BASE_LEVEL_MM,
        "rgb_level_mm": null,
        "depth_confidence": 0.95,
        "roi_valid": true
    })])
}

/// Relative error of `actual` against `expected`
pub fn relative_error(actual: f64, expected: f64) -> f64 {
    (actual - expected).abs() / expected.abs()
}
