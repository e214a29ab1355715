//! Typed Capture Payload (`ios_capture_v1`)
//!
//! ## Overview
//!
//! A capture is one voiding attempt recorded by the phone: session metadata
//! plus an ordered sequence of low-rate samples, each summarizing the depth
//! and RGB level estimates, the depth confidence, ROI tracking state and
//! optional audio/motion proxies.
//!
//! ```text
//! CapturePayload
//! ├── schema_version   "ios_capture_v1"
//! ├── session          id, start time, mode, calibration, privacy flags
//! ├── samples[]        t_s, depth/rgb level, confidence, roi, audio, motion
//! └── analysis?        on-device approximation hints (never used as input)
//! ```
//!
//! ## Missing Is Not Zero
//!
//! Level channels are [`Channel`] values rather than floats with a sentinel.
//! A missing depth reading must never enter the fusion arithmetic as a level
//! of 0 mm, so the type forces every consumer to handle `Missing` explicitly.
//! On the wire a `Channel` is a nullable number: `null` or an absent key
//! both map to `Missing`.
//!
//! The payload is immutable once received. The contract validator in
//! `uroflow-contract` is the normal way to build one from JSON. Payloads
//! constructed directly (replay tools, tests) go through the same per-sample
//! rules in [`check_samples`] before the engine touches them.

use alloc::string::String;
use alloc::vec::Vec;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::constants::fusion::DEFAULT_MIN_DEPTH_CONFIDENCE;
use crate::errors::{ContractError, ContractResult};
use crate::quality::QualityStatus;
use crate::traits::Validatable;

/// The only supported contract tag
pub const SCHEMA_VERSION: &str = "ios_capture_v1";

/// A per-sample channel value that may be absent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Channel<T> {
    /// The channel produced a reading
    Present(T),
    /// The channel produced nothing for this sample
    Missing,
}

impl<T> Default for Channel<T> {
    fn default() -> Self {
        Channel::Missing
    }
}

impl<T> From<Option<T>> for Channel<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Channel::Present(v),
            None => Channel::Missing,
        }
    }
}

impl<T: Copy> Channel<T> {
    /// The reading, if present
    pub fn value(&self) -> Option<T> {
        match self {
            Channel::Present(v) => Some(*v),
            Channel::Missing => None,
        }
    }

    /// Whether the channel produced a reading
    pub fn is_present(&self) -> bool {
        matches!(self, Channel::Present(_))
    }
}

impl Channel<f64> {
    /// Demote non-finite readings to `Missing`
    pub fn finite(self) -> Self {
        match self {
            Channel::Present(v) if v.is_valid() => Channel::Present(v),
            _ => Channel::Missing,
        }
    }
}

impl<T: Serialize> Serialize for Channel<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Channel::Present(v) => serializer.serialize_some(v),
            Channel::Missing => serializer.serialize_none(),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Channel<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<T>::deserialize(deserializer).map(Channel::from)
    }
}

/// How the phone was positioned relative to the stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureMode {
    /// Stream lands in the toilet water; level and impact sound both observable
    WaterImpact,
    /// Stream filmed in free fall
    JetInAir,
    /// Stream lands on the porcelain wall above the water line
    PorcelainWall,
}

impl CaptureMode {
    /// All recognized modes
    pub const ALL: [CaptureMode; 3] = [
        CaptureMode::WaterImpact,
        CaptureMode::JetInAir,
        CaptureMode::PorcelainWall,
    ];

    /// Wire name of the mode
    pub const fn as_str(&self) -> &'static str {
        match self {
            CaptureMode::WaterImpact => "water_impact",
            CaptureMode::JetInAir => "jet_in_air",
            CaptureMode::PorcelainWall => "porcelain_wall",
        }
    }

    /// Parse a wire name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|mode| mode.as_str() == name)
    }
}

/// Receptacle calibration declared by the session.
///
/// Unit convention: `level_mm * ml_per_mm = volume_ml`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    /// Volume per millimetre of level rise
    pub ml_per_mm: f64,

    /// Session override for the depth confidence gate
    #[serde(default)]
    pub min_depth_confidence: Option<f64>,
}

/// Privacy settings recorded with the capture; carried through untouched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PrivacyFlags {
    /// Whether full camera frames were persisted
    #[serde(default)]
    pub full_frame_storage: bool,
    /// Whether raw audio was persisted
    #[serde(default)]
    pub audio_stored: bool,
}

/// Session metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureSession {
    /// Non-empty session identifier
    pub session_id: String,
    /// Identifier used by the mobile offline queue to pair uploads
    #[serde(default)]
    pub sync_id: Option<String>,
    /// ISO-8601 start time, as sent
    pub started_at: String,
    /// Capture geometry
    pub mode: CaptureMode,
    /// Receptacle calibration
    pub calibration: Calibration,
    /// Privacy flags
    #[serde(default)]
    pub privacy: PrivacyFlags,
}

/// One synchronized multi-channel sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Seconds since capture start; non-decreasing across the sequence
    pub t_s: f64,
    /// Level from the depth map
    #[serde(default)]
    pub depth_level_mm: Channel<f64>,
    /// Level from the RGB meniscus tracker
    #[serde(default)]
    pub rgb_level_mm: Channel<f64>,
    /// Depth map confidence in `[0, 1]`
    pub depth_confidence: f64,
    /// Whether the receptacle ROI was tracked for this sample
    pub roi_valid: bool,
    /// Microphone RMS level
    #[serde(default)]
    pub audio_rms_dbfs: Option<f64>,
    /// Normalized device motion, `>= 0`
    #[serde(default)]
    pub motion_norm: Option<f64>,
}

impl Sample {
    /// Sample with level channels only; audio and motion absent
    pub fn new(
        t_s: f64,
        depth_level_mm: Option<f64>,
        rgb_level_mm: Option<f64>,
        depth_confidence: f64,
        roi_valid: bool,
    ) -> Self {
        Self {
            t_s,
            depth_level_mm: depth_level_mm.into(),
            rgb_level_mm: rgb_level_mm.into(),
            depth_confidence,
            roi_valid,
            audio_rms_dbfs: None,
            motion_norm: None,
        }
    }

    /// Attach audio and motion proxies
    pub fn with_proxies(mut self, audio_rms_dbfs: Option<f64>, motion_norm: Option<f64>) -> Self {
        self.audio_rms_dbfs = audio_rms_dbfs;
        self.motion_norm = motion_norm;
        self
    }
}

/// Pre-computed results from the on-device approximation
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RuntimeHints {
    /// On-device Qmax
    #[serde(default)]
    pub qmax_ml_s: Option<f64>,
    /// On-device voided volume
    #[serde(default)]
    pub vvoid_ml: Option<f64>,
    /// On-device verdict
    #[serde(default)]
    pub quality_status: Option<QualityStatus>,
}

/// A complete capture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapturePayload {
    /// Contract tag, always [`SCHEMA_VERSION`] once validated
    pub schema_version: String,
    /// Session metadata
    pub session: CaptureSession,
    /// Ordered samples
    pub samples: Vec<Sample>,
    /// Optional on-device hints
    #[serde(default)]
    pub analysis: Option<RuntimeHints>,
}

impl CapturePayload {
    /// Depth confidence gate for this capture.
    ///
    /// The session override wins when it lies in `(0, 1]`; anything else
    /// falls back to `default`.
    pub fn min_depth_confidence(&self, default: f64) -> f64 {
        match self.session.calibration.min_depth_confidence {
            Some(value) if value.is_valid() && value > 0.0 && value <= 1.0 => value,
            _ => default,
        }
    }

    /// Gate using the engine default
    pub fn default_min_depth_confidence(&self) -> f64 {
        self.min_depth_confidence(DEFAULT_MIN_DEPTH_CONFIDENCE)
    }

    /// Fraction of samples whose ROI was tracked
    pub fn roi_valid_ratio(&self) -> f64 {
        ratio(self.samples.iter().filter(|s| s.roi_valid).count(), self.samples.len())
    }

    /// Fraction of samples whose depth confidence is below `gate`
    pub fn low_depth_confidence_ratio(&self, gate: f64) -> f64 {
        ratio(
            self.samples.iter().filter(|s| s.depth_confidence < gate).count(),
            self.samples.len(),
        )
    }

    /// Per-sample contract rules, see [`check_samples`]
    pub fn check_samples(&self) -> ContractResult<()> {
        check_samples(&self.samples)
    }
}

/// Check the per-sample contract rules on a typed sequence.
///
/// Each rule runs over the whole sequence before the next one starts, and
/// the first violation is returned:
///
/// ```text
/// 1. t_s finite and non-decreasing    ─> InvalidSample / NonMonotonicTime
/// 2. depth_confidence within [0, 1]   ─> InvalidSample / ConfidenceOutOfRange
/// 3. depth or rgb level present       ─> MissingLevelChannel
/// ```
///
/// A present but non-finite level still counts as present here; the
/// normalizer treats it as unusable data.
pub fn check_samples(samples: &[Sample]) -> ContractResult<()> {
    let mut previous: Option<f64> = None;
    for (index, sample) in samples.iter().enumerate() {
        if !sample.t_s.is_valid() {
            return Err(ContractError::InvalidSample { index, field: "t_s" });
        }
        if previous.map_or(false, |t| sample.t_s < t) {
            return Err(ContractError::NonMonotonicTime { index });
        }
        previous = Some(sample.t_s);
    }

    for (index, sample) in samples.iter().enumerate() {
        let value = sample.depth_confidence;
        if !value.is_valid() {
            return Err(ContractError::InvalidSample { index, field: "depth_confidence" });
        }
        if !(0.0..=1.0).contains(&value) {
            return Err(ContractError::ConfidenceOutOfRange { index, value });
        }
    }

    match samples
        .iter()
        .position(|s| !s.depth_level_mm.is_present() && !s.rgb_level_mm.is_present())
    {
        Some(index) => Err(ContractError::MissingLevelChannel { index }),
        None => Ok(()),
    }
}

/// `part / total`, zero for an empty population
pub(crate) fn ratio(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64
    }
}
