//! Confidence-Gated Level Fusion
//!
//! ## Gating Rule
//!
//! For every timestamp the fused level comes from exactly one place:
//!
//! ```text
//! depth present && confidence >= gate  ──> Depth
//! else rgb present                     ──> RgbFallback
//! else                                 ──> undefined, bridged later:
//!        between two defined points    ──> Interpolated (linear in time)
//!        before first / after last     ──> HeldEdge (nearest value, no slope)
//! ```
//!
//! A depth reading below the gate never reaches the fused series while a
//! single gated point exists to bridge or hold from. Only when nothing at all
//! passes the gate are low-confidence depth readings admitted
//! (`LowConfidenceDepth`).
//!
//! Any timestamp with neither trusted depth nor RGB raises
//! `missing_rgb_fallback`, whether it was bridged or filled from
//! low-confidence depth.
//!
//! ## Uncertainty
//!
//! ```text
//! sigma_h(depth)        = depth_sigma * max(1 - c, floor)
//! sigma_h(rgb)          = rgb_sigma   * max(1 - c, floor) * widening
//! sigma_h(interpolated) = max(sigma_left, sigma_right) + gap_rate * gap_s
//! sigma_h(held edge)    = sigma_nearest + gap_rate * distance_s
//! ```

use alloc::vec::Vec;
use libm::sqrt;
use serde::{Deserialize, Serialize};

use crate::config::FusionConfig;
use crate::normalize::NormalizedCapture;

/// Where a fused level point came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelSource {
    /// Trusted depth reading
    Depth,
    /// RGB reading standing in for untrusted or missing depth
    RgbFallback,
    /// Linear bridge between defined neighbours
    Interpolated,
    /// Nearest defined value held at a series edge
    HeldEdge,
    /// Depth below the gate, used because nothing else was available
    LowConfidenceDepth,
}

/// Fused level `h(t)` with uncertainty; never mutated after creation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelSeries {
    /// Timestamp axis (s)
    pub t_s: Vec<f64>,
    /// Fused level (mm)
    pub level_mm: Vec<f64>,
    /// Level uncertainty (mm)
    pub sigma_mm: Vec<f64>,
    /// Depth confidence reported at each point
    pub confidence: Vec<f64>,
    /// Provenance of each point
    pub source: Vec<LevelSource>,
}

impl LevelSeries {
    /// Number of points
    pub fn len(&self) -> usize {
        self.t_s.len()
    }

    /// Whether the series is empty
    pub fn is_empty(&self) -> bool {
        self.t_s.is_empty()
    }

    /// Number of points with the given provenance
    pub fn count(&self, source: LevelSource) -> usize {
        self.source.iter().filter(|s| **s == source).count()
    }
}

/// Level fusion output plus the gap bookkeeping the quality policy needs
#[derive(Debug, Clone, PartialEq)]
pub struct LevelFusion {
    /// The fused series
    pub series: LevelSeries,
    /// Longest bridged gap (s)
    pub longest_gap_s: f64,
    /// Whether some timestamp had neither trusted depth nor RGB
    pub missing_rgb_fallback: bool,
}

type Point = (f64, f64, LevelSource);

/// Fuse depth and RGB columns into one level series.
pub fn fuse_levels(
    capture: &NormalizedCapture,
    min_depth_confidence: f64,
    config: &FusionConfig,
) -> LevelFusion {
    let n = capture.len();
    let mut points: Vec<Option<Point>> = (0..n)
        .map(|i| gated_point(capture, i, min_depth_confidence, config))
        .collect();

    let missing_rgb_fallback = points.iter().any(Option::is_none);
    if points.iter().all(Option::is_none) {
        for (i, slot) in points.iter_mut().enumerate() {
            if slot.is_none() {
                if let Some(depth) = capture.depth[i].value() {
                    let factor = uncertainty_factor(capture.confidence[i], config);
                    let sigma = config.depth_sigma_mm * factor * config.rgb_fallback_widening;
                    *slot = Some((depth, sigma, LevelSource::LowConfidenceDepth));
                }
            }
        }
        log_warn!("fusion: no trusted channel, admitting low-confidence depth");
    } else if missing_rgb_fallback {
        log_warn!("fusion: untrusted depth without RGB, bridging from gated points");
    }

    let (filled, longest_gap_s) = bridge_gaps(&capture.t_s, &points, config);

    let mut series = LevelSeries {
        t_s: capture.t_s.clone(),
        level_mm: Vec::with_capacity(n),
        sigma_mm: Vec::with_capacity(n),
        confidence: capture.confidence.clone(),
        source: Vec::with_capacity(n),
    };
    for (level, sigma, source) in filled {
        series.level_mm.push(level);
        series.sigma_mm.push(sigma);
        series.source.push(source);
    }

    LevelFusion { series, longest_gap_s, missing_rgb_fallback }
}

fn uncertainty_factor(confidence: f64, config: &FusionConfig) -> f64 {
    (1.0 - confidence).max(config.min_uncertainty_factor)
}

fn gated_point(
    capture: &NormalizedCapture,
    i: usize,
    min_depth_confidence: f64,
    config: &FusionConfig,
) -> Option<Point> {
    let confidence = capture.confidence[i];
    let factor = uncertainty_factor(confidence, config);

    match (capture.depth[i].value(), capture.rgb[i].value()) {
        (Some(depth), _) if confidence >= min_depth_confidence => {
            Some((depth, config.depth_sigma_mm * factor, LevelSource::Depth))
        }
        (_, Some(rgb)) => Some((
            rgb,
            config.rgb_sigma_mm * factor * config.rgb_fallback_widening,
            LevelSource::RgbFallback,
        )),
        _ => None,
    }
}

/// Fill undefined points. Returns the filled points and the longest gap.
///
/// Callers guarantee at least one defined point.
fn bridge_gaps(t_s: &[f64], points: &[Option<Point>], config: &FusionConfig) -> (Vec<Point>, f64) {
    let n = points.len();
    let mut out: Vec<Point> = Vec::with_capacity(n);
    let mut longest_gap_s = 0.0f64;

    let defined: Vec<usize> = (0..n).filter(|&i| points[i].is_some()).collect();
    let (first, last) = match (defined.first(), defined.last()) {
        (Some(&f), Some(&l)) => (f, l),
        // Nothing to anchor on; normalization makes this unreachable
        _ => return ((0..n).map(|_| (0.0, 0.0, LevelSource::HeldEdge)).collect(), 0.0),
    };

    let mut next_defined = 0usize;
    for i in 0..n {
        if let Some(point) = points[i] {
            out.push(point);
            next_defined += 1;
            continue;
        }

        if i < first {
            let (level, sigma, _) = points[first].unwrap_or((0.0, 0.0, LevelSource::Depth));
            let distance = t_s[first] - t_s[i];
            longest_gap_s = longest_gap_s.max(t_s[first] - t_s[0]);
            out.push((level, sigma + config.gap_sigma_mm_per_s * distance.max(0.0), LevelSource::HeldEdge));
        } else if i > last {
            let (level, sigma, _) = points[last].unwrap_or((0.0, 0.0, LevelSource::Depth));
            let distance = t_s[i] - t_s[last];
            longest_gap_s = longest_gap_s.max(t_s[n - 1] - t_s[last]);
            out.push((level, sigma + config.gap_sigma_mm_per_s * distance.max(0.0), LevelSource::HeldEdge));
        } else {
            // `next_defined` indexes the first defined point after `i`
            let left = defined[next_defined - 1];
            let right = defined[next_defined];
            let (l_level, l_sigma, _) = points[left].unwrap_or((0.0, 0.0, LevelSource::Depth));
            let (r_level, r_sigma, _) = points[right].unwrap_or((0.0, 0.0, LevelSource::Depth));

            let span = t_s[right] - t_s[left];
            let weight = if span > 0.0 { (t_s[i] - t_s[left]) / span } else { 0.0 };
            let level = l_level + (r_level - l_level) * weight;
            let sigma = l_sigma.max(r_sigma) + config.gap_sigma_mm_per_s * span.max(0.0);
            longest_gap_s = longest_gap_s.max(span);
            out.push((level, sigma, LevelSource::Interpolated));
        }
    }

    (out, longest_gap_s)
}

/// Centered moving average with edge-renormalized windows.
///
/// `window` is odd; near the edges the window shrinks instead of padding.
pub fn centered_moving_average(values: &[f64], window: usize) -> Vec<f64> {
    if window <= 1 {
        return values.to_vec();
    }
    let half = window / 2;
    let n = values.len();
    (0..n)
        .map(|i| {
            let lo = i.saturating_sub(half);
            let hi = (i + half).min(n.saturating_sub(1));
            let segment = &values[lo..=hi];
            segment.iter().sum::<f64>() / segment.len() as f64
        })
        .collect()
}

/// Residual noise of the level signal: population standard deviation of
/// `level - centered_moving_average(level)`.
pub fn level_noise_mm(level_mm: &[f64], window: usize) -> f64 {
    if level_mm.len() < 2 {
        return 0.0;
    }
    let smooth = centered_moving_average(level_mm, window);
    let residual: Vec<f64> = level_mm.iter().zip(&smooth).map(|(raw, s)| raw - s).collect();
    let n = residual.len() as f64;
    let mean = residual.iter().sum::<f64>() / n;
    let variance = residual.iter().map(|r| (r - mean) * (r - mean)).sum::<f64>() / n;
    sqrt(variance)
}
