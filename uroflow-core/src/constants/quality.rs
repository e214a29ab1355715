//! Quality Policy Constants
//!
//! Penalty caps, onset thresholds and classification bands for the
//! deterministic 0-100 capture score.

// ===== SCORE BANDS =====

/// Starting (and maximum) quality score.
pub const QUALITY_SCORE_MAX: f64 = 100.0;

/// A score at or below this is rejected.
pub const REJECT_SCORE: f64 = 50.0;

/// A score below this needs a repeat measurement.
pub const VALID_SCORE: f64 = 75.0;

// ===== ROI =====

/// ROI-valid ratio at or below which the capture is rejected outright.
pub const REJECT_ROI_RATIO: f64 = 0.55;

/// ROI-valid ratio below which the capture is penalized and needs a repeat.
pub const REPEAT_ROI_RATIO: f64 = 0.80;

/// Score points per unit of ROI-valid ratio below [`REPEAT_ROI_RATIO`].
pub const ROI_PENALTY_PER_UNIT: f64 = 100.0;

/// Maximum ROI penalty.
pub const ROI_PENALTY_CAP: f64 = 50.0;

// ===== DEPTH CONFIDENCE =====

/// Low-confidence sample ratio from which a penalty applies.
pub const LOW_CONFIDENCE_ONSET_RATIO: f64 = 0.25;

/// Low-confidence sample ratio above which the capture needs a repeat.
pub const REPEAT_LOW_CONFIDENCE_RATIO: f64 = 0.35;

/// Maximum low-confidence penalty.
pub const LOW_CONFIDENCE_PENALTY_CAP: f64 = 25.0;

// ===== MOTION =====

/// `motion_norm` above which a sample counts as high motion.
pub const HIGH_MOTION_NORM: f64 = 0.2;

/// High-motion sample ratio from which a penalty applies.
pub const MAX_HIGH_MOTION_RATIO: f64 = 0.15;

/// Maximum motion penalty.
pub const MOTION_PENALTY_CAP: f64 = 60.0;

// ===== SIGNAL / VOLUME =====

/// Penalty for a noisy fused level signal.
pub const LOW_SNR_PENALTY: f64 = 10.0;

/// Voided volume below which a capture is not representative (mL).
pub const MIN_REPRESENTATIVE_VOLUME_ML: f64 = 150.0;

/// Maximum low-volume penalty.
pub const LOW_VOLUME_PENALTY_CAP: f64 = 20.0;

/// Penalty when the integrated flow disagrees with the final volume.
pub const VOLUME_MISMATCH_PENALTY: f64 = 5.0;

/// Penalty when a gap longer than the bridgeable maximum was interpolated.
pub const LONG_GAP_PENALTY: f64 = 10.0;

/// Penalty when any sample relied on the RGB channel.
pub const RGB_FALLBACK_PENALTY: f64 = 5.0;

/// Penalty when some point had neither trusted depth nor RGB.
pub const MISSING_RGB_FALLBACK_PENALTY: f64 = 20.0;

// ===== AUDIO =====

/// Audio level above which a sample counts as clipped (dBFS).
pub const AUDIO_CLIP_DBFS: f64 = -3.0;

/// Clipped sample ratio from which a penalty applies.
pub const MAX_AUDIO_CLIPPING_RATIO: f64 = 0.05;

/// Maximum clipping penalty.
pub const AUDIO_CLIPPING_PENALTY_CAP: f64 = 10.0;

/// Percentile of the audio track used as the noise floor.
pub const AUDIO_NOISE_PERCENTILE: f64 = 20.0;

/// Rise above the noise floor expected from a stream hitting water (dB).
pub const MIN_AUDIO_DELTA_DB: f64 = 6.0;

/// Audio coverage needed before the not-in-water check is trusted.
pub const MIN_AUDIO_COVERAGE: f64 = 0.5;

/// Penalty when a water-impact capture shows no impact sound.
pub const NOT_IN_WATER_PENALTY: f64 = 20.0;

// ===== EVENT =====

/// Penalty when no voiding window was found.
pub const EVENT_NOT_FOUND_PENALTY: f64 = 40.0;

/// Window confidence below which a penalty applies.
pub const MIN_EVENT_CONFIDENCE: f64 = 0.5;

/// Maximum low-event-confidence penalty.
pub const LOW_EVENT_CONFIDENCE_PENALTY_CAP: f64 = 10.0;

// ===== LIMITS =====

/// Capacity of the reason list; one slot per [`crate::quality::QualityReason`].
pub const MAX_QUALITY_REASONS: usize = 16;
