//! Engine Configuration
//!
//! One immutable value, passed by reference into [`crate::engine::analyze`].
//! There are no module-level mutable globals: running the engine with an
//! alternative threshold set is just a matter of passing a different
//! `EngineConfig`, which keeps the engine reentrant and safe to call from
//! many threads at once.
//!
//! Every field defaults to a named constant from [`crate::constants`]. The
//! structs deserialize with `#[serde(default)]`, so a JSON override only needs
//! the fields it changes:
//!
//! ```rust
//! use uroflow_core::config::EngineConfig;
//!
//! let mut config = EngineConfig::default();
//! config.events.start_threshold_ml_s = 1.0;
//! assert!(config.validate().is_ok());
//! ```

use serde::{Deserialize, Serialize};

use crate::constants::{events as ev, fusion as fu, quality as qu};
use crate::errors::ConfigError;

/// Fusion estimator parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    /// Depth confidence gate; sessions may override it
    pub min_depth_confidence: f64,
    /// Depth channel base uncertainty (mm)
    pub depth_sigma_mm: f64,
    /// RGB channel base uncertainty (mm)
    pub rgb_sigma_mm: f64,
    /// Widening applied when RGB stands in for depth
    pub rgb_fallback_widening: f64,
    /// Floor for the `(1 - confidence)` factor
    pub min_uncertainty_factor: f64,
    /// Uncertainty added per second of bridged gap (mm/s)
    pub gap_sigma_mm_per_s: f64,
    /// Longest gap bridged without a quality downgrade (s)
    pub max_bridgeable_gap_s: f64,
    /// Centered smoothing window for flow (odd, samples)
    pub flow_smoothing_window: usize,
    /// Window for the level-noise estimate (odd, samples)
    pub level_noise_window: usize,
    /// Residual level noise above which the signal is noisy (mm)
    pub max_level_noise_mm: f64,
    /// Absolute volume-consistency tolerance (mL)
    pub volume_tolerance_ml: f64,
    /// Relative volume-consistency tolerance
    pub volume_tolerance_rel: f64,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            min_depth_confidence: fu::DEFAULT_MIN_DEPTH_CONFIDENCE,
            depth_sigma_mm: fu::DEPTH_BASE_SIGMA_MM,
            rgb_sigma_mm: fu::RGB_BASE_SIGMA_MM,
            rgb_fallback_widening: fu::RGB_FALLBACK_WIDENING,
            min_uncertainty_factor: fu::MIN_UNCERTAINTY_FACTOR,
            gap_sigma_mm_per_s: fu::GAP_SIGMA_MM_PER_S,
            max_bridgeable_gap_s: fu::MAX_BRIDGEABLE_GAP_S,
            flow_smoothing_window: fu::FLOW_SMOOTHING_WINDOW,
            level_noise_window: fu::LEVEL_NOISE_WINDOW,
            max_level_noise_mm: fu::MAX_LEVEL_NOISE_MM,
            volume_tolerance_ml: fu::VOLUME_CONSISTENCY_ABS_ML,
            volume_tolerance_rel: fu::VOLUME_CONSISTENCY_REL,
        }
    }
}

/// Event boundary detector parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventConfig {
    /// Onset threshold (mL/s)
    pub start_threshold_ml_s: f64,
    /// Completion threshold, `<= start_threshold_ml_s` (mL/s)
    pub stop_threshold_ml_s: f64,
    /// ROI-valid fraction needed to gate the scans on ROI
    pub roi_gate_min_ratio: f64,
    /// Peak multiple of the start threshold counted as full flow evidence
    pub flow_strength_multiple: f64,
    /// In-window pause threshold (mL/s)
    pub pause_threshold_ml_s: f64,
    /// Minimum counted pause (s)
    pub min_pause_s: f64,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            start_threshold_ml_s: ev::START_THRESHOLD_ML_S,
            stop_threshold_ml_s: ev::STOP_THRESHOLD_ML_S,
            roi_gate_min_ratio: ev::ROI_GATE_MIN_RATIO,
            flow_strength_multiple: ev::FLOW_STRENGTH_MULTIPLE,
            pause_threshold_ml_s: ev::PAUSE_THRESHOLD_ML_S,
            min_pause_s: ev::MIN_PAUSE_S,
        }
    }
}

/// Quality policy parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    /// Score at or below which a capture is rejected
    pub reject_score: f64,
    /// Score from which a capture is valid
    pub valid_score: f64,
    /// ROI ratio at or below which a capture is rejected
    pub reject_roi_ratio: f64,
    /// ROI ratio below which a capture is penalized and repeated
    pub repeat_roi_ratio: f64,
    /// Score points per unit of ROI deficit
    pub roi_penalty_per_unit: f64,
    /// ROI penalty cap
    pub roi_penalty_cap: f64,
    /// Low-confidence ratio from which a penalty applies
    pub low_confidence_onset_ratio: f64,
    /// Low-confidence ratio above which a capture is repeated
    pub repeat_low_confidence_ratio: f64,
    /// Low-confidence penalty cap
    pub low_confidence_penalty_cap: f64,
    /// Motion norm counted as high motion
    pub high_motion_norm: f64,
    /// High-motion ratio from which a penalty applies
    pub max_high_motion_ratio: f64,
    /// Motion penalty cap
    pub motion_penalty_cap: f64,
    /// Noisy level penalty
    pub low_snr_penalty: f64,
    /// Minimum representative voided volume (mL)
    pub min_volume_ml: f64,
    /// Low-volume penalty cap
    pub low_volume_penalty_cap: f64,
    /// Volume mismatch penalty
    pub volume_mismatch_penalty: f64,
    /// Long interpolated gap penalty
    pub long_gap_penalty: f64,
    /// RGB fallback penalty
    pub rgb_fallback_penalty: f64,
    /// Missing RGB fallback penalty
    pub missing_rgb_fallback_penalty: f64,
    /// Clipping level (dBFS)
    pub audio_clip_dbfs: f64,
    /// Clipped ratio from which a penalty applies
    pub max_audio_clipping_ratio: f64,
    /// Clipping penalty cap
    pub audio_clipping_penalty_cap: f64,
    /// Noise-floor percentile of the audio track
    pub audio_noise_percentile: f64,
    /// Expected impact rise above the noise floor (dB)
    pub min_audio_delta_db: f64,
    /// Audio coverage needed for the not-in-water check
    pub min_audio_coverage: f64,
    /// Not-in-water penalty
    pub not_in_water_penalty: f64,
    /// Penalty when no event was found
    pub event_not_found_penalty: f64,
    /// Event confidence from which no penalty applies
    pub min_event_confidence: f64,
    /// Low event confidence penalty cap
    pub low_event_confidence_penalty_cap: f64,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            reject_score: qu::REJECT_SCORE,
            valid_score: qu::VALID_SCORE,
            reject_roi_ratio: qu::REJECT_ROI_RATIO,
            repeat_roi_ratio: qu::REPEAT_ROI_RATIO,
            roi_penalty_per_unit: qu::ROI_PENALTY_PER_UNIT,
            roi_penalty_cap: qu::ROI_PENALTY_CAP,
            low_confidence_onset_ratio: qu::LOW_CONFIDENCE_ONSET_RATIO,
            repeat_low_confidence_ratio: qu::REPEAT_LOW_CONFIDENCE_RATIO,
            low_confidence_penalty_cap: qu::LOW_CONFIDENCE_PENALTY_CAP,
            high_motion_norm: qu::HIGH_MOTION_NORM,
            max_high_motion_ratio: qu::MAX_HIGH_MOTION_RATIO,
            motion_penalty_cap: qu::MOTION_PENALTY_CAP,
            low_snr_penalty: qu::LOW_SNR_PENALTY,
            min_volume_ml: qu::MIN_REPRESENTATIVE_VOLUME_ML,
            low_volume_penalty_cap: qu::LOW_VOLUME_PENALTY_CAP,
            volume_mismatch_penalty: qu::VOLUME_MISMATCH_PENALTY,
            long_gap_penalty: qu::LONG_GAP_PENALTY,
            rgb_fallback_penalty: qu::RGB_FALLBACK_PENALTY,
            missing_rgb_fallback_penalty: qu::MISSING_RGB_FALLBACK_PENALTY,
            audio_clip_dbfs: qu::AUDIO_CLIP_DBFS,
            max_audio_clipping_ratio: qu::MAX_AUDIO_CLIPPING_RATIO,
            audio_clipping_penalty_cap: qu::AUDIO_CLIPPING_PENALTY_CAP,
            audio_noise_percentile: qu::AUDIO_NOISE_PERCENTILE,
            min_audio_delta_db: qu::MIN_AUDIO_DELTA_DB,
            min_audio_coverage: qu::MIN_AUDIO_COVERAGE,
            not_in_water_penalty: qu::NOT_IN_WATER_PENALTY,
            event_not_found_penalty: qu::EVENT_NOT_FOUND_PENALTY,
            min_event_confidence: qu::MIN_EVENT_CONFIDENCE,
            low_event_confidence_penalty_cap: qu::LOW_EVENT_CONFIDENCE_PENALTY_CAP,
        }
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Fusion estimator
    pub fusion: FusionConfig,
    /// Event boundary detector
    pub events: EventConfig,
    /// Quality policy
    pub quality: QualityConfig,
}

impl EngineConfig {
    /// Reject internally inconsistent threshold sets
    pub fn validate(&self) -> Result<(), ConfigError> {
        let f = &self.fusion;
        fraction("fusion.min_depth_confidence", f.min_depth_confidence)?;
        positive("fusion.depth_sigma_mm", f.depth_sigma_mm)?;
        positive("fusion.rgb_sigma_mm", f.rgb_sigma_mm)?;
        positive("fusion.rgb_fallback_widening", f.rgb_fallback_widening)?;
        fraction("fusion.min_uncertainty_factor", f.min_uncertainty_factor)?;
        positive("fusion.max_bridgeable_gap_s", f.max_bridgeable_gap_s)?;
        positive("fusion.max_level_noise_mm", f.max_level_noise_mm)?;
        odd_window(f.flow_smoothing_window)?;
        odd_window(f.level_noise_window)?;

        let e = &self.events;
        positive("events.start_threshold_ml_s", e.start_threshold_ml_s)?;
        positive("events.stop_threshold_ml_s", e.stop_threshold_ml_s)?;
        if e.stop_threshold_ml_s > e.start_threshold_ml_s {
            return Err(ConfigError::ThresholdOrder {
                start: e.start_threshold_ml_s,
                stop: e.stop_threshold_ml_s,
            });
        }
        fraction("events.roi_gate_min_ratio", e.roi_gate_min_ratio)?;

        let q = &self.quality;
        if q.reject_score >= q.valid_score {
            return Err(ConfigError::ScoreBands { reject: q.reject_score, valid: q.valid_score });
        }
        fraction("quality.reject_roi_ratio", q.reject_roi_ratio)?;
        fraction("quality.repeat_roi_ratio", q.repeat_roi_ratio)?;
        fraction("quality.low_confidence_onset_ratio", q.low_confidence_onset_ratio)?;
        fraction("quality.max_high_motion_ratio", q.max_high_motion_ratio)?;
        positive("quality.min_volume_ml", q.min_volume_ml)?;
        Ok(())
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { field, value })
    }
}

fn fraction(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::NotAFraction { field, value })
    }
}

fn odd_window(window: usize) -> Result<(), ConfigError> {
    if window >= 1 && window % 2 == 1 {
        Ok(())
    } else {
        Err(ConfigError::SmoothingWindow(window))
    }
}
