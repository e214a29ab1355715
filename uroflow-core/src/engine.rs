//! Capture Analysis Entry Point
//!
//! ## Overview
//!
//! The engine is a fixed sequence of pure stages. Each stage takes the
//! previous stage's output by reference and produces a fresh value; nothing
//! is cached between calls, so the same payload and configuration always
//! give the same analysis.
//!
//! ```text
//! CapturePayload
//!      │ check_samples        (may fail: bad format)
//!      ▼
//! CapturePayload
//!      │ normalize            (may fail: bad data)
//!      ▼
//! NormalizedCapture
//!      │ fuse                 (never fails, raises FusionFlags)
//!      ▼
//! LevelSeries + FlowSeries
//!      │ detect
//!      ▼
//! Option<EventWindow>
//!      │ summarize
//!      ▼
//! MetricsSummary
//!      │ evaluate
//!      ▼
//! QualityVerdict ──> CaptureAnalysis
//! ```
//!
//! JSON contract validation happens before this point, in `uroflow-contract`.
//! The per-sample rules are checked again here so that a hand-built payload
//! with regressing time or an out-of-range confidence never reaches fusion.

use alloc::string::String;
use alloc::vec::Vec;
use libm::fabs;
use serde::{Deserialize, Serialize};

use crate::capture::{CaptureMode, CapturePayload, RuntimeHints};
use crate::config::EngineConfig;
use crate::errors::EngineResult;
use crate::events::{detect, EventWindow};
use crate::fusion::{fuse, FlowSeries, FusionFlags, LevelSeries, VolumeCheck};
use crate::metrics::{summarize, MetricsSummary};
use crate::normalize::normalize;
use crate::quality::{evaluate, QualityInputs, QualityStatus, QualityVerdict};

/// Disagreement between the on-device approximation and the engine
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct HintDrift {
    /// `|Qmax_device - Qmax_engine|` (mL/s)
    pub qmax_abs_diff_ml_s: Option<f64>,
    /// `|Vvoid_device - Vvoid_engine|` (mL)
    pub vvoid_abs_diff_ml: Option<f64>,
    /// Whether the device verdict matches
    pub status_agrees: Option<bool>,
}

impl HintDrift {
    /// Compare device hints against engine results.
    pub fn compare(hints: &RuntimeHints, metrics: &MetricsSummary, status: QualityStatus) -> Self {
        Self {
            qmax_abs_diff_ml_s: hints.qmax_ml_s.map(|q| fabs(q - metrics.qmax_ml_s)),
            vvoid_abs_diff_ml: hints.vvoid_ml.map(|v| fabs(v - metrics.vvoid_ml)),
            status_agrees: hints.quality_status.map(|s| s == status),
        }
    }
}

/// Plot-ready series for the review UI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesExport {
    /// Timestamp axis (s)
    pub t_s: Vec<f64>,
    /// Fused level (mm)
    pub level_mm: Vec<f64>,
    /// Level uncertainty (mm)
    pub sigma_level_mm: Vec<f64>,
    /// Smoothed flow (mL/s)
    pub flow_ml_s: Vec<f64>,
    /// Flow uncertainty (mL/s)
    pub sigma_flow_ml_s: Vec<f64>,
}

/// Full result of analyzing one capture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureAnalysis {
    /// Session identifier
    pub session_id: String,
    /// Offline queue pairing identifier
    pub sync_id: Option<String>,
    /// Capture geometry
    pub mode: CaptureMode,
    /// Calibration used for volume conversion
    pub ml_per_mm: f64,
    /// Depth confidence gate actually applied
    pub min_depth_confidence: f64,
    /// Fused level
    pub level: LevelSeries,
    /// Volume and flow
    pub flow: FlowSeries,
    /// Voiding window
    pub window: Option<EventWindow>,
    /// Integral cross-check
    pub volume_check: VolumeCheck,
    /// Clinical metrics
    pub metrics: MetricsSummary,
    /// Degraded fusion conditions
    pub fusion_flags: FusionFlags,
    /// Quality verdict
    pub quality: QualityVerdict,
    /// Drift against on-device hints, when present
    pub hint_drift: Option<HintDrift>,
}

impl CaptureAnalysis {
    /// Verdict shortcut
    pub fn status(&self) -> QualityStatus {
        self.quality.status
    }

    /// Level and flow series with uncertainty bands
    pub fn export(&self) -> SeriesExport {
        SeriesExport {
            t_s: self.level.t_s.clone(),
            level_mm: self.level.level_mm.clone(),
            sigma_level_mm: self.level.sigma_mm.clone(),
            flow_ml_s: self.flow.flow_ml_s.clone(),
            sigma_flow_ml_s: self.flow.sigma_flow_ml_s.clone(),
        }
    }
}

/// Analyze a typed capture.
///
/// Fails on a sample that breaks the contract or when normalization finds
/// too little usable data. The configuration is used as given; call
/// [`EngineConfig::validate`] when it comes from an untrusted source.
pub fn analyze(payload: &CapturePayload, config: &EngineConfig) -> EngineResult<CaptureAnalysis> {
    let session = &payload.session;
    payload.check_samples()?;
    let capture = normalize(payload)?;

    let ml_per_mm = session.calibration.ml_per_mm;
    let min_depth_confidence = payload.min_depth_confidence(config.fusion.min_depth_confidence);
    let fused = fuse(&capture, ml_per_mm, min_depth_confidence, &config.fusion);

    let window = detect(&fused.flow.t_s, &fused.flow.flow_ml_s, &capture.roi_valid, &config.events);
    let metrics = summarize(
        &fused.flow,
        window.as_ref(),
        config.fusion.flow_smoothing_window,
        &config.events,
    );

    let inputs = QualityInputs::gather(
        &capture,
        session.mode,
        min_depth_confidence,
        &fused.flags,
        window.as_ref(),
        &metrics,
        &config.quality,
    );
    let quality = evaluate(&inputs, &config.quality);

    let hint_drift = payload
        .analysis
        .as_ref()
        .map(|hints| HintDrift::compare(hints, &metrics, quality.status));

    log_debug!(
        "engine: session {} -> {} (Qmax {:.2} mL/s, Vvoid {:.1} mL)",
        session.session_id,
        quality.status.as_str(),
        metrics.qmax_ml_s,
        metrics.vvoid_ml
    );

    Ok(CaptureAnalysis {
        session_id: session.session_id.clone(),
        sync_id: session.sync_id.clone(),
        mode: session.mode,
        ml_per_mm,
        min_depth_confidence,
        level: fused.level,
        flow: fused.flow,
        window,
        volume_check: fused.volume_check,
        metrics,
        fusion_flags: fused.flags,
        quality,
        hint_drift,
    })
}
