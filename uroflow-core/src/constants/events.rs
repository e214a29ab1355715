//! Event Boundary Constants
//!
//! Hysteresis thresholds for locating the voiding window in the fused flow
//! series, and the ROI gating policy.

/// Flow at or above which voiding has started (mL/s).
pub const START_THRESHOLD_ML_S: f64 = 0.5;

/// Flow at or above which voiding is still ongoing, read backward from the
/// end of the capture (mL/s).
///
/// Must not exceed [`START_THRESHOLD_ML_S`]; the gap between the two is the
/// hysteresis that stops the window chattering at low flow.
pub const STOP_THRESHOLD_ML_S: f64 = 0.2;

/// Fraction of ROI-valid samples required to gate boundary scans on ROI.
///
/// Below this the ROI flag is ignored entirely during boundary detection.
/// Tunable: carried over from field behaviour without a documented
/// clinical rationale.
pub const ROI_GATE_MIN_RATIO: f64 = 0.25;

/// Peak flow multiple of the start threshold treated as full-strength
/// evidence when scoring window confidence.
pub const FLOW_STRENGTH_MULTIPLE: f64 = 3.0;

/// Flow below which an in-window interval counts as paused (mL/s).
pub const PAUSE_THRESHOLD_ML_S: f64 = 0.2;

/// Minimum pause length counted as an interruption (s).
pub const MIN_PAUSE_S: f64 = 0.5;
