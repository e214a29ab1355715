//! Volume and Flow Derivation
//!
//! ## Pipeline
//!
//! ```text
//! h(t), sigma_h ──> V = max((h - h0) * k, 0)      sigma_V = sigma_h * k
//!                    │
//!                    ├─> Q_raw[i]  centered difference (one-sided at ends)
//!                    │   sigma_Q = sqrt(sigma_V[a]^2 + sigma_V[b]^2) / dt
//!                    │
//!                    └─> Q[i]      centered moving average, window w
//!                        sigma = sqrt(sum sigma_Q^2) / m
//! ```
//!
//! `k` is the calibration `ml_per_mm`. All series have the same length as
//! the level series. A non-positive time delta (duplicate timestamp) yields
//! zero flow rather than an infinite or negative rate.

use alloc::vec::Vec;
use libm::sqrt;
use serde::{Deserialize, Serialize};

use super::level::{centered_moving_average, LevelSeries};

/// Volume and flow over the level time axis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowSeries {
    /// Timestamp axis (s)
    pub t_s: Vec<f64>,
    /// Cumulative voided volume (mL)
    pub volume_ml: Vec<f64>,
    /// Volume uncertainty (mL)
    pub sigma_volume_ml: Vec<f64>,
    /// Smoothed flow (mL/s)
    pub flow_ml_s: Vec<f64>,
    /// Smoothed flow uncertainty (mL/s)
    pub sigma_flow_ml_s: Vec<f64>,
    /// Unsmoothed finite-difference flow (mL/s)
    pub raw_flow_ml_s: Vec<f64>,
}

impl FlowSeries {
    /// Number of points
    pub fn len(&self) -> usize {
        self.t_s.len()
    }

    /// Whether the series is empty
    pub fn is_empty(&self) -> bool {
        self.t_s.is_empty()
    }
}

/// Convert a level series into volume and flow.
///
/// Returns the series and the number of non-increasing timestamp steps.
pub fn derive_flow(level: &LevelSeries, ml_per_mm: f64, smoothing_window: usize) -> (FlowSeries, usize) {
    let (volume_ml, sigma_volume_ml) = volume_curve(&level.level_mm, &level.sigma_mm, ml_per_mm);
    let (raw_flow_ml_s, raw_sigma) = differentiate(&level.t_s, &volume_ml, &sigma_volume_ml);
    let duplicates = level.t_s.windows(2).filter(|w| w[1] <= w[0]).count();

    let flow_ml_s = centered_moving_average(&raw_flow_ml_s, smoothing_window)
        .into_iter()
        .map(|q| q.max(0.0))
        .collect();
    let sigma_flow_ml_s = smooth_sigma(&raw_sigma, smoothing_window);

    let series = FlowSeries {
        t_s: level.t_s.clone(),
        volume_ml,
        sigma_volume_ml,
        flow_ml_s,
        sigma_flow_ml_s,
        raw_flow_ml_s,
    };
    (series, duplicates)
}

/// Baseline-relative volume, clamped at zero, with linear sigma conversion.
pub fn volume_curve(level_mm: &[f64], sigma_mm: &[f64], ml_per_mm: f64) -> (Vec<f64>, Vec<f64>) {
    let baseline = level_mm.first().copied().unwrap_or(0.0);
    let volume = level_mm
        .iter()
        .map(|h| ((h - baseline) * ml_per_mm).max(0.0))
        .collect();
    let sigma = sigma_mm.iter().map(|s| s * ml_per_mm).collect();
    (volume, sigma)
}

/// Finite-difference flow and its uncertainty.
pub fn differentiate(t_s: &[f64], volume_ml: &[f64], sigma_volume_ml: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let n = t_s.len();
    let mut flow = Vec::with_capacity(n);
    let mut sigma = Vec::with_capacity(n);
    if n < 2 {
        flow.resize(n, 0.0);
        sigma.resize(n, 0.0);
        return (flow, sigma);
    }

    for i in 0..n {
        let (a, b) = if i == 0 {
            (0, 1)
        } else if i == n - 1 {
            (n - 2, n - 1)
        } else {
            (i - 1, i + 1)
        };
        let dt = t_s[b] - t_s[a];
        if dt > 0.0 {
            flow.push(((volume_ml[b] - volume_ml[a]) / dt).max(0.0));
            let sa = sigma_volume_ml[a];
            let sb = sigma_volume_ml[b];
            sigma.push(sqrt(sa * sa + sb * sb) / dt);
        } else {
            flow.push(0.0);
            sigma.push(0.0);
        }
    }
    (flow, sigma)
}

/// Propagate independent uncertainties through the moving average.
pub fn smooth_sigma(sigma: &[f64], window: usize) -> Vec<f64> {
    if window <= 1 {
        return sigma.to_vec();
    }
    let half = window / 2;
    let n = sigma.len();
    (0..n)
        .map(|i| {
            let lo = i.saturating_sub(half);
            let hi = (i + half).min(n.saturating_sub(1));
            let segment = &sigma[lo..=hi];
            let sum_sq: f64 = segment.iter().map(|s| s * s).sum();
            sqrt(sum_sq) / segment.len() as f64
        })
        .collect()
}

/// Trapezoid integral of `values` over `t_s[start..=end]`.
///
/// Steps with non-positive time delta contribute nothing.
pub fn trapezoid(t_s: &[f64], values: &[f64], start: usize, end: usize) -> f64 {
    if end <= start || end >= t_s.len() {
        return 0.0;
    }
    (start..end)
        .map(|i| {
            let dt = t_s[i + 1] - t_s[i];
            if dt > 0.0 {
                0.5 * (values[i] + values[i + 1]) * dt
            } else {
                0.0
            }
        })
        .sum()
}
