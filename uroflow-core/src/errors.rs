//! Error Types for Capture Processing
//!
//! ## Design Philosophy
//!
//! The engine distinguishes "bad format" from "bad data", and both from
//! "bad measurement":
//!
//! 1. **Contract errors** (`ContractError`): the payload itself is malformed.
//!    Always fatal, surfaced verbatim with the offending field or sample index.
//!
//! 2. **Normalization errors** (`NormalizationError`): the payload is well-formed
//!    but has too little usable data after channel alignment.
//!
//! 3. **Degraded conditions** (RGB fallback, interpolated gaps, volume mismatch)
//!    are *not* errors. They are recorded in [`crate::fusion::FusionFlags`] and
//!    feed the quality policy.
//!
//! 4. **Quality rejection** is not an error either: a `reject` verdict is a
//!    successful computation that carries full metrics for audit.
//!
//! Only stages up to normalization can abort a request. Everything after that
//! accumulates flags.
//!
//! ## Error Handling Strategy
//!
//! ```rust
//! use uroflow_core::{EngineError, ContractError};
//!
//! fn render(err: &EngineError) -> &'static str {
//!     match err {
//!         EngineError::Contract(ContractError::NonMonotonicTime { .. }) => "timestamps out of order",
//!         EngineError::Contract(_) => "malformed capture",
//!         EngineError::Normalization(_) => "capture has no usable level data",
//!     }
//! }
//! ```

use alloc::string::String;
use thiserror_no_std::Error;

/// Result type for contract validation
pub type ContractResult<T> = Result<T, ContractError>;

/// Result type for the full engine
pub type EngineResult<T> = Result<T, EngineError>;

/// The capture payload violates the `ios_capture_v1` contract.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ContractError {
    /// Missing or unknown `schema_version`
    #[error("unsupported schema version {found:?}, expected \"ios_capture_v1\"")]
    UnsupportedSchema {
        /// The tag that was found, if any
        found: Option<String>,
    },

    /// A session-level field is missing or invalid
    #[error("session.{field}: {reason}")]
    InvalidSession {
        /// Dotted path below `session`, e.g. `calibration.ml_per_mm`
        field: &'static str,
        /// What was wrong with it
        reason: &'static str,
    },

    /// `samples` is not an array
    #[error("samples must be an array")]
    SamplesNotAnArray,

    /// Fewer than two samples
    #[error("at least two samples are required, got {count}")]
    TooFewSamples {
        /// Number of samples received
        count: usize,
    },

    /// A sample field has the wrong type or a non-finite value
    #[error("samples[{index}].{field} is invalid")]
    InvalidSample {
        /// Sample position
        index: usize,
        /// Field name
        field: &'static str,
    },

    /// `t_s` decreased relative to the previous sample
    #[error("samples[{index}].t_s decreases relative to the previous sample")]
    NonMonotonicTime {
        /// First offending sample
        index: usize,
    },

    /// `depth_confidence` outside `[0, 1]`
    #[error("samples[{index}].depth_confidence {value} outside [0, 1]")]
    ConfidenceOutOfRange {
        /// Offending sample
        index: usize,
        /// The reported confidence
        value: f64,
    },

    /// Neither `depth_level_mm` nor `rgb_level_mm` is present
    #[error("samples[{index}] must include depth_level_mm or rgb_level_mm")]
    MissingLevelChannel {
        /// Offending sample
        index: usize,
    },
}

/// The payload is well-formed but lacks usable level data.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizationError {
    /// Fewer than two samples in a payload built without the contract validator
    #[error("a capture needs at least two samples, got {count}")]
    EmptyPayload {
        /// Number of samples received
        count: usize,
    },

    /// Fewer than two timestamps carry any usable channel after alignment
    #[error("need {required} timestamps with a usable level channel, have {usable}")]
    InsufficientUsableSamples {
        /// Minimum number of usable timestamps
        required: usize,
        /// Number found
        usable: usize,
    },
}

/// An engine configuration is internally inconsistent.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum ConfigError {
    /// A value that must be strictly positive is not
    #[error("{field} must be positive, got {value}")]
    NotPositive {
        /// Configuration field
        field: &'static str,
        /// Offending value
        value: f64,
    },

    /// A ratio or confidence outside `[0, 1]`
    #[error("{field} must be within [0, 1], got {value}")]
    NotAFraction {
        /// Configuration field
        field: &'static str,
        /// Offending value
        value: f64,
    },

    /// Event thresholds without hysteresis
    #[error("stop threshold {stop} exceeds start threshold {start}")]
    ThresholdOrder {
        /// Onset threshold (mL/s)
        start: f64,
        /// Completion threshold (mL/s)
        stop: f64,
    },

    /// Quality score bands overlap
    #[error("reject score {reject} must be below valid score {valid}")]
    ScoreBands {
        /// Score at or below which a capture is rejected
        reject: f64,
        /// Score from which a capture is valid
        valid: f64,
    },

    /// Smoothing window must be odd so it stays centered
    #[error("smoothing window {0} must be odd and at least 1")]
    SmoothingWindow(usize),
}

/// Any error that aborts a capture analysis.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Bad format
    #[error("contract violation: {0}")]
    Contract(#[from] ContractError),

    /// Bad data
    #[error("normalization failed: {0}")]
    Normalization(#[from] NormalizationError),
}

impl ContractError {
    /// Sample index the error points at, if it concerns one sample
    pub fn sample_index(&self) -> Option<usize> {
        match self {
            Self::InvalidSample { index, .. }
            | Self::NonMonotonicTime { index }
            | Self::ConfidenceOutOfRange { index, .. }
            | Self::MissingLevelChannel { index } => Some(*index),
            _ => None,
        }
    }
}
