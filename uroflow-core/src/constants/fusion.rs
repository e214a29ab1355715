//! Fusion Algorithm Constants
//!
//! Parameters for confidence-gated level fusion, the level-to-volume
//! conversion, flow differentiation and first-order uncertainty propagation.

// ===== CHANNEL GATING =====

/// Minimum depth confidence for the depth channel to be trusted.
///
/// Below this the RGB channel is used, or the point is bridged by
/// interpolation when RGB is missing too. A session may override it through
/// `calibration.min_depth_confidence` when the override lies in `(0, 1]`.
///
/// Source: depth-map confidence distribution on reflective bowls
pub const DEFAULT_MIN_DEPTH_CONFIDENCE: f64 = 0.6;

// ===== UNCERTAINTY MODEL =====

/// Base level uncertainty of the depth channel (mm).
///
/// Scaled by `(1 - confidence)` per sample.
pub const DEPTH_BASE_SIGMA_MM: f64 = 1.0;

/// Base level uncertainty of the RGB channel (mm).
///
/// Larger than depth: the RGB meniscus estimate is sensitive to lighting.
pub const RGB_BASE_SIGMA_MM: f64 = 1.5;

/// Extra widening applied when the RGB channel stands in for depth.
pub const RGB_FALLBACK_WIDENING: f64 = 1.5;

/// Floor for the `(1 - confidence)` factor.
///
/// A confidence of exactly 1.0 would otherwise claim a perfect level.
pub const MIN_UNCERTAINTY_FACTOR: f64 = 0.05;

/// Level uncertainty added per second of bridged gap (mm/s).
///
/// Interpolated points get `max(sigma_left, sigma_right) + rate * gap_s`.
pub const GAP_SIGMA_MM_PER_S: f64 = 2.0;

/// Longest gap bridged without downgrading quality (s).
///
/// Longer gaps are still bridged so the series stays aligned, but the
/// capture picks up a `LongGap` quality reason.
pub const MAX_BRIDGEABLE_GAP_S: f64 = 1.0;

// ===== FLOW ESTIMATION =====

/// Centered moving-average window applied to raw flow (samples, odd).
///
/// Three samples keeps onset/offset decisions within one sample of the
/// unsmoothed series.
pub const FLOW_SMOOTHING_WINDOW: usize = 3;

/// Window used to estimate level noise (samples, odd).
pub const LEVEL_NOISE_WINDOW: usize = 5;

/// Level residual standard deviation above which the signal is noisy (mm).
pub const MAX_LEVEL_NOISE_MM: f64 = 2.5;

/// Absolute tolerance for the volume consistency check (mL).
pub const VOLUME_CONSISTENCY_ABS_ML: f64 = 10.0;

/// Relative tolerance for the volume consistency check.
pub const VOLUME_CONSISTENCY_REL: f64 = 0.05;
