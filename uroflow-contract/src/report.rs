//! Capture Report
//!
//! A cheap pre-flight summary of a validated capture, computed from the raw
//! samples before any fusion work. Clients use it to tell the user early that
//! a recording will probably have to be repeated.

use serde::Serialize;
use uroflow_core::CapturePayload;

/// ROI-valid fraction below which a repeat is likely
pub const LIKELY_REPEAT_ROI_RATIO: f64 = 0.85;

/// Low-confidence fraction above which RGB fallback will carry the capture
pub const FALLBACK_RELIANCE_RATIO: f64 = 0.25;

/// Early warning raised by the report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureWarning {
    /// ROI tracking was lost often enough that the capture will likely be repeated
    LowRoiRatio,
    /// Depth confidence is low often enough that RGB will stand in for depth
    FallbackRelianceExpected,
}

impl CaptureWarning {
    /// Human-readable message
    pub const fn message(&self) -> &'static str {
        match self {
            CaptureWarning::LowRoiRatio => "ROI valid ratio is low; likely repeat",
            CaptureWarning::FallbackRelianceExpected => {
                "depth confidence is often below the gate; fallback reliance expected"
            }
        }
    }
}

/// Ratios and warnings for one capture
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaptureReport {
    /// Number of samples in the capture
    pub sample_count: usize,
    /// Fraction of samples with a tracked ROI
    pub roi_valid_ratio: f64,
    /// Fraction of samples whose depth confidence is under the capture's gate
    pub low_depth_confidence_ratio: f64,
    /// Early warnings, in a fixed order
    pub warnings: Vec<CaptureWarning>,
}

impl CaptureReport {
    /// Build the report. The session's confidence override is honoured.
    pub fn from_payload(payload: &CapturePayload) -> Self {
        let sample_count = payload.samples.len();
        let low_depth_confidence_ratio =
            payload.low_depth_confidence_ratio(payload.default_min_depth_confidence());
        let roi_valid_ratio = payload.roi_valid_ratio();

        let mut warnings = Vec::new();
        if roi_valid_ratio < LIKELY_REPEAT_ROI_RATIO {
            warnings.push(CaptureWarning::LowRoiRatio);
        }
        if low_depth_confidence_ratio > FALLBACK_RELIANCE_RATIO {
            warnings.push(CaptureWarning::FallbackRelianceExpected);
        }

        Self { sample_count, roi_valid_ratio, low_depth_confidence_ratio, warnings }
    }

    /// Whether the report raised no warning
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}
