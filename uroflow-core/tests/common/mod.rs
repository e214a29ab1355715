//! Common test utilities for integration tests
//!
//! This module provides:
//! - Payload builders for hand-written captures
//! - The synthetic bench generator (`generators`)
//! - Named end-to-end captures (`scenarios`)

#![allow(dead_code)]

use uroflow_core::{
    Calibration, CaptureMode, CapturePayload, CaptureSession, PrivacyFlags, Sample, SCHEMA_VERSION,
};

pub mod generators;
pub mod scenarios;

/// Default receptacle calibration used across tests
pub const ML_PER_MM: f64 = 8.0;

/// Wrap samples into a payload with a fixed session
pub fn payload(samples: Vec<Sample>, mode: CaptureMode, ml_per_mm: f64) -> CapturePayload {
    CapturePayload {
        schema_version: SCHEMA_VERSION.into(),
        session: CaptureSession {
            session_id: "test-session".into(),
            sync_id: None,
            started_at: "2026-02-24T10:00:00Z".into(),
            mode,
            calibration: Calibration { ml_per_mm, min_depth_confidence: None },
            privacy: PrivacyFlags::default(),
        },
        samples,
        analysis: None,
    }
}

/// Ground-truth level for a `sin^1.8` flow bell delivering `volume_ml`.
///
/// Returns `(t_s, level_mm)` with the level starting at zero.
pub fn bell_levels(n: usize, dt: f64, volume_ml: f64, ml_per_mm: f64) -> (Vec<f64>, Vec<f64>) {
    let t: Vec<f64> = (0..n).map(|i| i as f64 * dt).collect();
    let duration = t[n - 1];
    let raw: Vec<f64> = t
        .iter()
        .map(|x| (std::f64::consts::PI * x / duration).sin().max(0.0).powf(1.8))
        .collect();
    let area: f64 = (1..n).map(|i| 0.5 * (raw[i] + raw[i - 1]) * dt).sum();
    let scale = volume_ml / area;

    let mut volume = 0.0;
    let mut level = vec![0.0];
    for i in 1..n {
        volume += 0.5 * (raw[i] + raw[i - 1]) * scale * dt;
        level.push(volume / ml_per_mm);
    }
    (t, level)
}

/// Relative error of `actual` against `expected`
pub fn relative_error(actual: f64, expected: f64) -> f64 {
    (actual - expected).abs() / expected.abs()
}
