//! Level Normalizer
//!
//! Turns the sample sequence into column arrays aligned on one timestamp
//! axis, one array per channel. No fusion happens here: the depth and RGB
//! columns keep explicit [`Channel::Missing`] markers (non-finite readings are
//! demoted to `Missing`, never to zero), and confidences are clamped into
//! `[0, 1]`. [`crate::analyze`] has already rejected out-of-range
//! confidences by then; the clamp only matters when `normalize` is called
//! on its own.
//!
//! ```text
//! samples[i] ──┬─> t_s[i]
//!              ├─> depth[i]       Present(mm) | Missing
//!              ├─> rgb[i]         Present(mm) | Missing
//!              ├─> confidence[i]
//!              ├─> roi_valid[i]
//!              └─> audio[i], motion[i]   Option
//! ```
//!
//! The only failure is a capture where fewer than two timestamps carry a
//! usable level channel. That is bad *data*, distinct from a bad *format*.

use alloc::vec::Vec;

use crate::capture::{Channel, CapturePayload};
use crate::errors::NormalizationError;
use crate::traits::Validatable;

/// Minimum number of timestamps with any usable channel
pub const MIN_USABLE_SAMPLES: usize = 2;

/// Channel-aligned columns for one capture
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedCapture {
    /// Timestamp axis (s)
    pub t_s: Vec<f64>,
    /// Depth-map level per timestamp
    pub depth: Vec<Channel<f64>>,
    /// RGB level per timestamp
    pub rgb: Vec<Channel<f64>>,
    /// Depth confidence per timestamp, in `[0, 1]`
    pub confidence: Vec<f64>,
    /// ROI tracking flag per timestamp
    pub roi_valid: Vec<bool>,
    /// Audio RMS per timestamp (dBFS)
    pub audio_rms_dbfs: Vec<Option<f64>>,
    /// Device motion per timestamp
    pub motion_norm: Vec<Option<f64>>,
}

impl NormalizedCapture {
    /// Number of aligned timestamps
    pub fn len(&self) -> usize {
        self.t_s.len()
    }

    /// Whether there are no timestamps
    pub fn is_empty(&self) -> bool {
        self.t_s.is_empty()
    }

    /// Whether any timestamp carries a depth reading
    pub fn has_depth(&self) -> bool {
        self.depth.iter().any(Channel::is_present)
    }

    /// Whether any timestamp carries an RGB reading
    pub fn has_rgb(&self) -> bool {
        self.rgb.iter().any(Channel::is_present)
    }

    /// Number of timestamps with at least one usable level channel
    pub fn usable_count(&self) -> usize {
        self.depth
            .iter()
            .zip(&self.rgb)
            .filter(|(d, r)| d.is_present() || r.is_present())
            .count()
    }
}

/// Align a capture into per-channel columns.
pub fn normalize(payload: &CapturePayload) -> Result<NormalizedCapture, NormalizationError> {
    let n = payload.samples.len();
    if n < MIN_USABLE_SAMPLES {
        return Err(NormalizationError::EmptyPayload { count: n });
    }

    let mut out = NormalizedCapture {
        t_s: Vec::with_capacity(n),
        depth: Vec::with_capacity(n),
        rgb: Vec::with_capacity(n),
        confidence: Vec::with_capacity(n),
        roi_valid: Vec::with_capacity(n),
        audio_rms_dbfs: Vec::with_capacity(n),
        motion_norm: Vec::with_capacity(n),
    };

    let mut dropped = 0usize;
    for sample in &payload.samples {
        // A sample without a usable timestamp cannot be placed on the axis
        if !sample.t_s.is_valid() {
            dropped += 1;
            continue;
        }
        out.t_s.push(sample.t_s);
        out.depth.push(sample.depth_level_mm.finite());
        out.rgb.push(sample.rgb_level_mm.finite());
        out.confidence.push(clamp_confidence(sample.depth_confidence));
        out.roi_valid.push(sample.roi_valid);
        out.audio_rms_dbfs.push(sample.audio_rms_dbfs.filter(|v| v.is_valid()));
        out.motion_norm.push(sample.motion_norm.filter(|v| v.is_valid() && *v >= 0.0));
    }

    if dropped > 0 {
        log_warn!("normalize: dropped {} samples without a finite timestamp", dropped);
    }

    let usable = out.usable_count();
    if usable < MIN_USABLE_SAMPLES {
        log_warn!("normalize: only {} usable samples", usable);
        return Err(NormalizationError::InsufficientUsableSamples {
            required: MIN_USABLE_SAMPLES,
            usable,
        });
    }

    log_debug!(
        "normalize: {} samples, depth={}, rgb={}",
        out.len(),
        out.has_depth(),
        out.has_rgb()
    );
    Ok(out)
}

fn clamp_confidence(value: f64) -> f64 {
    if value.is_valid() {
        value.max(0.0).min(1.0)
    } else {
        0.0
    }
}
