//! Level Fusion and Flow Estimation
//!
//! ## Overview
//!
//! Two independent sensors observe the same receptacle level:
//!
//! - **Depth map**: accurate when confident, but fails on reflective water
//!   and steep viewing angles
//! - **RGB meniscus tracker**: always available when the ROI is tracked,
//!   but noisier
//!
//! Fusion picks one trusted reading per timestamp, bridges holes, converts
//! the level into volume, and differentiates to flow. Uncertainty is carried
//! through every step:
//!
//! ```text
//! depth ──┐
//!         ├─> gate ─> bridge ─> h(t), σ_h ─> V(t), σ_V ─> Q(t), σ_Q
//! rgb   ──┘                                     │
//!                                               └─> ∫Q dt  vs  V_final
//! ```
//!
//! ## Degraded Conditions
//!
//! Fusion never fails. Everything that went less than ideally is counted in
//! [`FusionFlags`], which the quality policy turns into penalties:
//!
//! | Flag                   | Raised when                                      |
//! |------------------------|--------------------------------------------------|
//! | `rgb_fallback_samples` | depth was untrusted or missing and RGB was used  |
//! | `interpolated_samples` | no channel was usable and the point was bridged  |
//! | `long_gap`             | a bridged gap exceeded `max_bridgeable_gap_s`    |
//! | `missing_rgb_fallback` | a point had neither trusted depth nor RGB        |
//! | `noisy_level`          | residual level noise exceeded the SNR limit      |
//! | `volume_mismatch`      | `∫Q dt` disagrees with the final volume          |

pub mod flow;
pub mod level;

use libm::fabs;
use serde::{Deserialize, Serialize};

pub use flow::{derive_flow, trapezoid, FlowSeries};
pub use level::{fuse_levels, level_noise_mm, LevelFusion, LevelSeries, LevelSource};

use crate::config::FusionConfig;
use crate::normalize::NormalizedCapture;

/// Degraded-condition bookkeeping for one capture
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FusionFlags {
    /// Points taken from the RGB channel
    pub rgb_fallback_samples: usize,
    /// Points bridged between defined neighbours
    pub interpolated_samples: usize,
    /// Points held flat at a series edge
    pub held_edge_samples: usize,
    /// Longest bridged gap (s)
    pub longest_gap_s: f64,
    /// A gap longer than the bridgeable limit was bridged
    pub long_gap: bool,
    /// Some point had neither trusted depth nor RGB
    pub missing_rgb_fallback: bool,
    /// Non-increasing timestamp steps
    pub duplicate_timestamps: usize,
    /// Residual level noise (mm)
    pub level_noise_mm: f64,
    /// Level noise above the SNR limit
    pub noisy_level: bool,
    /// Integrated flow disagrees with the final volume
    pub volume_mismatch: bool,
}

/// Agreement between integrated flow and the volume curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolumeCheck {
    /// `∫Q dt` over the smoothed flow (mL)
    pub integrated_volume_ml: f64,
    /// Last point of the volume curve (mL)
    pub final_volume_ml: f64,
    /// Allowed disagreement (mL)
    pub tolerance_ml: f64,
}

impl VolumeCheck {
    /// Absolute disagreement (mL)
    pub fn difference_ml(&self) -> f64 {
        fabs(self.integrated_volume_ml - self.final_volume_ml)
    }

    /// Whether the disagreement is within tolerance
    pub fn is_consistent(&self) -> bool {
        self.difference_ml() <= self.tolerance_ml
    }
}

/// Everything fusion produces for one capture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusedCapture {
    /// Fused level
    pub level: LevelSeries,
    /// Volume and flow
    pub flow: FlowSeries,
    /// Integral cross-check
    pub volume_check: VolumeCheck,
    /// Degraded conditions
    pub flags: FusionFlags,
}

/// Fuse level channels and derive flow.
pub fn fuse(
    capture: &NormalizedCapture,
    ml_per_mm: f64,
    min_depth_confidence: f64,
    config: &FusionConfig,
) -> FusedCapture {
    let LevelFusion { series: level, longest_gap_s, missing_rgb_fallback } =
        fuse_levels(capture, min_depth_confidence, config);
    let (flow, duplicate_timestamps) = derive_flow(&level, ml_per_mm, config.flow_smoothing_window);

    let last = flow.len().saturating_sub(1);
    let final_volume_ml = flow.volume_ml.last().copied().unwrap_or(0.0);
    let volume_check = VolumeCheck {
        integrated_volume_ml: trapezoid(&flow.t_s, &flow.flow_ml_s, 0, last),
        final_volume_ml,
        tolerance_ml: config.volume_tolerance_ml.max(config.volume_tolerance_rel * fabs(final_volume_ml)),
    };

    let noise = level_noise_mm(&level.level_mm, config.level_noise_window);
    let flags = FusionFlags {
        rgb_fallback_samples: level.count(LevelSource::RgbFallback),
        interpolated_samples: level.count(LevelSource::Interpolated),
        held_edge_samples: level.count(LevelSource::HeldEdge),
        longest_gap_s,
        long_gap: longest_gap_s > config.max_bridgeable_gap_s,
        missing_rgb_fallback,
        duplicate_timestamps,
        level_noise_mm: noise,
        noisy_level: noise > config.max_level_noise_mm,
        volume_mismatch: !volume_check.is_consistent(),
    };

    if flags.long_gap {
        log_warn!("fusion: bridged a {:.2} s gap", longest_gap_s);
    }
    if flags.volume_mismatch {
        log_warn!(
            "fusion: integrated volume {:.1} mL vs final {:.1} mL",
            volume_check.integrated_volume_ml,
            volume_check.final_volume_ml
        );
    }
    log_debug!(
        "fusion: {} points, {} rgb, {} interpolated, noise {:.2} mm",
        level.len(),
        flags.rgb_fallback_samples,
        flags.interpolated_samples,
        noise
    );

    FusedCapture { level, flow, volume_check, flags }
}
