//! Fusion and quality engine for smartphone uroflowmetry
//!
//! Turns a validated `ios_capture_v1` capture into a flow curve, clinical
//! metrics and a quality verdict.
//!
//! Key constraints:
//! - Pure, synchronous and deterministic: no clock, randomness or I/O
//! - Missing channel readings are never treated as zero
//! - Degraded data lowers the quality score; only unusable data is an error
//! - `no_std` + `alloc` capable so the same engine can run on-device
//!
//! ```no_run
//! use uroflow_core::{analyze, CapturePayload, EngineConfig, QualityStatus};
//!
//! fn review(payload: &CapturePayload) {
//!     match analyze(payload, &EngineConfig::default()) {
//!         Ok(analysis) if analysis.status() == QualityStatus::Valid => {
//!             let _qmax = analysis.metrics.qmax_ml_s;
//!         }
//!         Ok(_) => {}, // Ask the patient to record again
//!         Err(_) => {}, // Unusable capture
//!     }
//! }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

extern crate alloc;

#[macro_use]
mod macros;

pub mod capture;
pub mod config;
pub mod constants;
pub mod engine;
pub mod errors;
pub mod events;
pub mod fusion;
pub mod metrics;
pub mod normalize;
pub mod quality;
pub mod traits;

// Public API
pub use capture::{
    check_samples, Calibration, CaptureMode, CapturePayload, CaptureSession, Channel,
    PrivacyFlags, RuntimeHints, Sample, SCHEMA_VERSION,
};
pub use config::{EngineConfig, EventConfig, FusionConfig, QualityConfig};
pub use engine::{analyze, CaptureAnalysis, HintDrift, SeriesExport};
pub use errors::{
    ConfigError, ContractError, ContractResult, EngineError, EngineResult, NormalizationError,
};
pub use events::EventWindow;
pub use fusion::{FlowSeries, FusionFlags, LevelSeries, LevelSource};
pub use metrics::MetricsSummary;
pub use quality::{QualityReason, QualityStatus, QualityVerdict};
pub use traits::Validatable;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
