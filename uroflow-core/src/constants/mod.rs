//! Constants for Uroflow Core
//!
//! Centralized, documented defaults for every tunable used by the engine.
//! [`crate::config::EngineConfig::default`] is built entirely from these
//! values, so a deployment that wants different thresholds passes an explicit
//! configuration object instead of editing globals.
//!
//! ## Organization
//!
//! - **Fusion**: channel gating, uncertainty model, smoothing
//! - **Events**: voiding onset/offset thresholds and ROI gating
//! - **Quality**: penalty caps and classification bands
//!
//! ## Usage Guidelines
//!
//! 1. Always use these constants instead of magic numbers
//! 2. Include units in the name (`_MM`, `_ML_S`, `_S`)
//! 3. The on-device approximation must use the same values; change them
//!    here and in the mobile client together

/// Level fusion, volume conversion and flow differentiation parameters.
pub mod fusion;

/// Event boundary detection thresholds.
pub mod events;

/// Quality scoring penalties and classification thresholds.
pub mod quality;

pub use fusion::{
    DEFAULT_MIN_DEPTH_CONFIDENCE, DEPTH_BASE_SIGMA_MM, RGB_BASE_SIGMA_MM,
    FLOW_SMOOTHING_WINDOW, MAX_BRIDGEABLE_GAP_S,
};

pub use events::{START_THRESHOLD_ML_S, STOP_THRESHOLD_ML_S, ROI_GATE_MIN_RATIO};

pub use quality::{
    QUALITY_SCORE_MAX, REJECT_SCORE, VALID_SCORE, REJECT_ROI_RATIO, REPEAT_ROI_RATIO,
    REPEAT_LOW_CONFIDENCE_RATIO,
};
