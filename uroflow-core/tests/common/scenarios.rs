//! Named end-to-end captures
//!
//! - **A**: 20 samples, 0.5 s apart, bell flow of 300 mL, confident depth
//! - **B**: A with the ROI lost on every sample
//! - **flat**: receptacle never fills

use uroflow_core::{CaptureMode, CapturePayload, Sample};

use super::{bell_levels, payload, ML_PER_MM};

/// Receptacle level before voiding (mm)
pub const BASE_LEVEL_MM: f64 = 30.0;

/// True voided volume of scenarios A and B (mL)
pub const SCENARIO_VOLUME_ML: f64 = 300.0;

fn bell_samples(roi_valid: bool) -> Vec<Sample> {
    let (t, level) = bell_levels(20, 0.5, SCENARIO_VOLUME_ML, ML_PER_MM);
    t.iter()
        .zip(&level)
        .map(|(t, h)| Sample::new(*t, Some(BASE_LEVEL_MM + h), None, 0.95, roi_valid))
        .collect()
}

/// Clean bell capture
pub fn scenario_a() -> CapturePayload {
    payload(bell_samples(true), CaptureMode::WaterImpact, ML_PER_MM)
}

/// Clean bell capture with no ROI tracking
pub fn scenario_b() -> CapturePayload {
    payload(bell_samples(false), CaptureMode::WaterImpact, ML_PER_MM)
}

/// Still receptacle, nothing voided
pub fn flat_capture() -> CapturePayload {
    let samples = (0..20)
        .map(|i| Sample::new(i as f64 * 0.5, Some(BASE_LEVEL_MM), Some(BASE_LEVEL_MM), 0.95, true))
        .collect();
    payload(samples, CaptureMode::WaterImpact, ML_PER_MM)
}
