//! Capture Quality Policy
//!
//! ## Overview
//!
//! A capture is only clinically useful when the phone saw what it needed to
//! see. The policy starts from a perfect score and subtracts a bounded
//! penalty for every quality factor that crossed its threshold:
//!
//! ```text
//! 100 ─┬─ ROI lost              up to 50
//!      ├─ low depth confidence  up to 25
//!      ├─ phone motion          up to 60
//!      ├─ noisy level            10
//!      ├─ low volume            up to 20
//!      ├─ not in water           20
//!      ├─ audio clipping        up to 10
//!      ├─ event not found        40
//!      ├─ weak event            up to 10
//!      └─ fusion flags           5 / 10 / 5 / 20
//!            │
//!            ▼
//!     clamp to [0, 100] ─> classify ─> valid | repeat | reject
//! ```
//!
//! ## Classification
//!
//! | Status   | Condition                                                    |
//! |----------|--------------------------------------------------------------|
//! | `reject` | no event, or score `<= 50`, or ROI ratio `<= 0.55`            |
//! | `repeat` | score `< 75`, or ROI ratio `< 0.80`, or low-confidence `> 0.35` |
//! | `valid`  | otherwise                                                    |
//!
//! A reject is still a successful analysis: metrics stay available for audit.
//! The policy is a pure function of its inputs.

use alloc::vec::Vec;
use heapless::Vec as BoundedVec;
use serde::{Deserialize, Serialize};

use crate::capture::{ratio, CaptureMode};
use crate::config::QualityConfig;
use crate::constants::quality::{MAX_QUALITY_REASONS, QUALITY_SCORE_MAX};
use crate::events::EventWindow;
use crate::fusion::FusionFlags;
use crate::metrics::MetricsSummary;
use crate::normalize::NormalizedCapture;

/// Capture verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityStatus {
    /// Usable for clinical review
    Valid,
    /// Usable with reservations; the patient should record again
    Repeat,
    /// Not usable
    Reject,
}

impl QualityStatus {
    /// Wire name
    pub const fn as_str(&self) -> &'static str {
        match self {
            QualityStatus::Valid => "valid",
            QualityStatus::Repeat => "repeat",
            QualityStatus::Reject => "reject",
        }
    }
}

/// Why a capture lost points, in reporting order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityReason {
    /// Receptacle ROI was not tracked often enough
    RoiLost,
    /// Too many samples below the depth confidence gate
    LowConfidenceRatio,
    /// Phone moved during capture
    HighMotion,
    /// Fused level signal is noisy
    LowSnr,
    /// Voided volume below the representative minimum
    LowVolume,
    /// Water impact mode without an audible impact
    NotInWater,
    /// Microphone saturated
    AudioClipping,
    /// No voiding window was found
    EventNotFound,
    /// Voiding window found with low confidence
    LowEventConfidence,
    /// Integrated flow disagrees with the volume curve
    VolumeMismatch,
    /// A long stretch without usable level was bridged
    LongGap,
    /// RGB stood in for depth
    RgbFallback,
    /// Some point had neither trusted depth nor RGB
    MissingRgbFallback,
}

/// The ratios and flags the policy is computed from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityInputs {
    /// Capture geometry
    pub mode: CaptureMode,
    /// Share of samples with a tracked ROI
    pub roi_valid_ratio: f64,
    /// Share of samples below the depth confidence gate
    pub low_confidence_ratio: f64,
    /// Share of motion readings above the motion limit, if any were reported
    pub high_motion_ratio: Option<f64>,
    /// Share of samples carrying an audio reading
    pub audio_coverage: f64,
    /// Share of audio readings above the clipping level, if any were reported
    pub audio_clipping_ratio: Option<f64>,
    /// In-window audio peak over the noise floor (dB), if measurable
    pub audio_delta_db: Option<f64>,
    /// Voided volume (mL)
    pub vvoid_ml: f64,
    /// Event window confidence; `None` when no event was found
    pub event_confidence: Option<f64>,
    /// Degraded fusion conditions
    pub flags: FusionFlags,
}

impl QualityInputs {
    /// Collect policy inputs from the engine stages.
    pub fn gather(
        capture: &NormalizedCapture,
        mode: CaptureMode,
        min_depth_confidence: f64,
        flags: &FusionFlags,
        window: Option<&EventWindow>,
        metrics: &MetricsSummary,
        config: &QualityConfig,
    ) -> Self {
        let n = capture.len();
        let roi_valid_ratio = ratio(capture.roi_valid.iter().filter(|v| **v).count(), n);
        let low_confidence_ratio = ratio(
            capture.confidence.iter().filter(|c| **c < min_depth_confidence).count(),
            n,
        );

        let motion: Vec<f64> = capture.motion_norm.iter().flatten().copied().collect();
        let high_motion_ratio = (!motion.is_empty()).then(|| {
            ratio(motion.iter().filter(|m| **m > config.high_motion_norm).count(), motion.len())
        });

        let audio: Vec<f64> = capture.audio_rms_dbfs.iter().flatten().copied().collect();
        let audio_coverage = ratio(audio.len(), n);
        let audio_clipping_ratio = (!audio.is_empty()).then(|| {
            ratio(audio.iter().filter(|a| **a > config.audio_clip_dbfs).count(), audio.len())
        });
        let audio_delta_db = window.and_then(|w| {
            let floor = percentile(&audio, config.audio_noise_percentile)?;
            let peak = capture.audio_rms_dbfs[w.start_index..=w.end_index.min(n.saturating_sub(1))]
                .iter()
                .flatten()
                .copied()
                .fold(None, |best: Option<f64>, a| Some(best.map_or(a, |b| b.max(a))))?;
            Some(peak - floor)
        });

        Self {
            mode,
            roi_valid_ratio,
            low_confidence_ratio,
            high_motion_ratio,
            audio_coverage,
            audio_clipping_ratio,
            audio_delta_db,
            vvoid_ml: metrics.vvoid_ml,
            event_confidence: window.map(|w| w.confidence),
            flags: *flags,
        }
    }

    /// Whether an event window was found
    pub fn event_found(&self) -> bool {
        self.event_confidence.is_some()
    }
}

/// Score, status and reasons for one capture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityVerdict {
    /// Score in `[0, 100]`
    pub score: f64,
    /// Classification
    pub status: QualityStatus,
    /// Every crossed threshold, in [`QualityReason`] order
    pub reasons: BoundedVec<QualityReason, MAX_QUALITY_REASONS>,
    /// What the verdict was computed from
    pub inputs: QualityInputs,
}

impl QualityVerdict {
    /// Whether `reason` contributed to the verdict
    pub fn has_reason(&self, reason: QualityReason) -> bool {
        self.reasons.contains(&reason)
    }
}

struct Scorecard {
    score: f64,
    reasons: BoundedVec<QualityReason, MAX_QUALITY_REASONS>,
}

impl Scorecard {
    fn penalize(&mut self, reason: QualityReason, penalty: f64) {
        self.score -= penalty.max(0.0);
        if !self.reasons.contains(&reason) && self.reasons.push(reason).is_err() {
            log_warn!("quality: reason list full, dropping {:?}", reason);
        }
    }
}

/// `cap * excess / (1 - limit)`, bounded by `cap`
fn scaled_excess(value: f64, limit: f64, cap: f64) -> f64 {
    let span = (1.0 - limit).max(1e-9);
    (cap * (value - limit) / span).min(cap)
}

/// Score and classify a capture.
pub fn evaluate(inputs: &QualityInputs, config: &QualityConfig) -> QualityVerdict {
    use QualityReason::*;

    let mut card = Scorecard { score: QUALITY_SCORE_MAX, reasons: BoundedVec::new() };

    if inputs.roi_valid_ratio < config.repeat_roi_ratio {
        let deficit = config.repeat_roi_ratio - inputs.roi_valid_ratio;
        card.penalize(RoiLost, (config.roi_penalty_per_unit * deficit).min(config.roi_penalty_cap));
    }

    if inputs.low_confidence_ratio > config.low_confidence_onset_ratio {
        card.penalize(
            LowConfidenceRatio,
            scaled_excess(
                inputs.low_confidence_ratio,
                config.low_confidence_onset_ratio,
                config.low_confidence_penalty_cap,
            ),
        );
    }

    if let Some(motion) = inputs.high_motion_ratio {
        if motion > config.max_high_motion_ratio {
            card.penalize(
                HighMotion,
                scaled_excess(motion, config.max_high_motion_ratio, config.motion_penalty_cap),
            );
        }
    }

    if inputs.flags.noisy_level {
        card.penalize(LowSnr, config.low_snr_penalty);
    }

    if inputs.vvoid_ml < config.min_volume_ml {
        let deficit = (config.min_volume_ml - inputs.vvoid_ml) / config.min_volume_ml;
        card.penalize(
            LowVolume,
            (config.low_volume_penalty_cap * deficit).min(config.low_volume_penalty_cap),
        );
    }

    if inputs.mode == CaptureMode::WaterImpact && inputs.audio_coverage >= config.min_audio_coverage {
        if let Some(delta) = inputs.audio_delta_db {
            if delta < config.min_audio_delta_db {
                card.penalize(NotInWater, config.not_in_water_penalty);
            }
        }
    }

    if let Some(clipping) = inputs.audio_clipping_ratio {
        if clipping > config.max_audio_clipping_ratio {
            card.penalize(
                AudioClipping,
                scaled_excess(clipping, config.max_audio_clipping_ratio, config.audio_clipping_penalty_cap),
            );
        }
    }

    match inputs.event_confidence {
        None => card.penalize(EventNotFound, config.event_not_found_penalty),
        Some(confidence) if confidence < config.min_event_confidence => {
            let deficit = (config.min_event_confidence - confidence) / config.min_event_confidence.max(1e-9);
            card.penalize(
                LowEventConfidence,
                (config.low_event_confidence_penalty_cap * deficit).min(config.low_event_confidence_penalty_cap),
            );
        }
        Some(_) => {}
    }

    let flags = &inputs.flags;
    if flags.volume_mismatch {
        card.penalize(VolumeMismatch, config.volume_mismatch_penalty);
    }
    if flags.long_gap {
        card.penalize(LongGap, config.long_gap_penalty);
    }
    if flags.rgb_fallback_samples > 0 {
        card.penalize(RgbFallback, config.rgb_fallback_penalty);
    }
    if flags.missing_rgb_fallback {
        card.penalize(MissingRgbFallback, config.missing_rgb_fallback_penalty);
    }

    let score = card.score.max(0.0).min(QUALITY_SCORE_MAX);
    let status = classify(
        score,
        inputs.roi_valid_ratio,
        inputs.low_confidence_ratio,
        inputs.event_found(),
        config,
    );

    let mut reasons = card.reasons;
    reasons.sort_unstable();

    if status != QualityStatus::Valid {
        log_warn!("quality: {} at {:.1} ({:?})", status.as_str(), score, reasons.as_slice());
    } else {
        log_debug!("quality: valid at {:.1}", score);
    }

    QualityVerdict { score, status, reasons, inputs: *inputs }
}

/// Map a score and the hard ratios onto a status.
pub fn classify(
    score: f64,
    roi_valid_ratio: f64,
    low_confidence_ratio: f64,
    event_found: bool,
    config: &QualityConfig,
) -> QualityStatus {
    if !event_found || score <= config.reject_score || roi_valid_ratio <= config.reject_roi_ratio {
        QualityStatus::Reject
    } else if score < config.valid_score
        || roi_valid_ratio < config.repeat_roi_ratio
        || low_confidence_ratio > config.repeat_low_confidence_ratio
    {
        QualityStatus::Repeat
    } else {
        QualityStatus::Valid
    }
}

/// Linear-interpolated percentile (`pct` in `[0, 100]`); `None` when empty.
pub fn percentile(values: &[f64], pct: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable_by(f64::total_cmp);
    let rank = (pct.max(0.0).min(100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lower = rank as usize;
    let upper = (lower + 1).min(sorted.len() - 1);
    let fraction = rank - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}
