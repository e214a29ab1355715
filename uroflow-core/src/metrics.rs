//! Clinical Flow Metrics
//!
//! Summarizes the smoothed flow curve over the detected event window:
//!
//! | Metric          | Definition                                   |
//! |-----------------|----------------------------------------------|
//! | `qmax_ml_s`     | maximum flow inside the window               |
//! | `qavg_ml_s`     | arithmetic mean of in-window flow samples    |
//! | `vvoid_ml`      | trapezoid integral of flow over the window   |
//! | `flow_time_s`   | window duration                              |
//! | `tqmax_s`       | time of the first maximum minus window start |
//! | `interruptions` | pauses inside the window followed by flow    |
//!
//! Without a window every metric is zero.

use serde::{Deserialize, Serialize};

use crate::config::EventConfig;
use crate::events::EventWindow;
use crate::fusion::{trapezoid, FlowSeries};

/// Which flow curve the metrics were computed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesKind {
    /// Moving-average smoothed flow
    Smoothed,
    /// Finite-difference flow without smoothing
    Raw,
}

/// Where the metrics came from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricsProvenance {
    /// Window start index, if an event was found
    pub start_index: Option<usize>,
    /// Window end index, if an event was found
    pub end_index: Option<usize>,
    /// Flow curve used
    pub series: SeriesKind,
    /// Smoothing window applied to that curve
    pub smoothing_window: usize,
}

/// Clinical metrics for one capture
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    /// Maximum flow rate (mL/s)
    pub qmax_ml_s: f64,
    /// Average flow rate (mL/s)
    pub qavg_ml_s: f64,
    /// Voided volume (mL)
    pub vvoid_ml: f64,
    /// Duration of measurable flow (s)
    pub flow_time_s: f64,
    /// Time to maximum flow (s)
    pub tqmax_s: f64,
    /// Total voiding time including pauses (s)
    pub voiding_time_s: f64,
    /// Number of in-window pauses followed by resumed flow
    pub interruptions: usize,
    /// Computation provenance
    pub provenance: MetricsProvenance,
}

impl MetricsSummary {
    /// All-zero summary for a capture without an event
    pub fn empty(smoothing_window: usize) -> Self {
        Self {
            qmax_ml_s: 0.0,
            qavg_ml_s: 0.0,
            vvoid_ml: 0.0,
            flow_time_s: 0.0,
            tqmax_s: 0.0,
            voiding_time_s: 0.0,
            interruptions: 0,
            provenance: MetricsProvenance {
                start_index: None,
                end_index: None,
                series: SeriesKind::Smoothed,
                smoothing_window,
            },
        }
    }
}

/// Summarize the smoothed flow over the event window.
pub fn summarize(
    flow: &FlowSeries,
    window: Option<&EventWindow>,
    smoothing_window: usize,
    config: &EventConfig,
) -> MetricsSummary {
    let window = match window {
        Some(w) if w.end_index < flow.len() => w,
        _ => return MetricsSummary::empty(smoothing_window),
    };
    let (start, end) = (window.start_index, window.end_index);
    let values = &flow.flow_ml_s[start..=end];

    // First maximum wins on ties
    let (peak_offset, qmax_ml_s) = values
        .iter()
        .copied()
        .enumerate()
        .fold((0usize, f64::MIN), |best, (i, q)| if q > best.1 { (i, q) } else { best });
    let qmax_ml_s = qmax_ml_s.max(0.0);
    let qavg_ml_s = values.iter().sum::<f64>() / values.len() as f64;
    let duration = window.duration_s();

    MetricsSummary {
        qmax_ml_s,
        qavg_ml_s,
        vvoid_ml: trapezoid(&flow.t_s, &flow.flow_ml_s, start, end),
        flow_time_s: duration,
        tqmax_s: (flow.t_s[start + peak_offset] - window.t_start_s).max(0.0),
        voiding_time_s: duration,
        interruptions: count_interruptions(&flow.t_s[start..=end], values, config),
        provenance: MetricsProvenance {
            start_index: Some(start),
            end_index: Some(end),
            series: SeriesKind::Smoothed,
            smoothing_window,
        },
    }
}

/// Count pauses below the pause threshold lasting at least `min_pause_s`
/// that end with resumed flow.
///
/// A pause lasts from its first quiet sample to the first flowing sample
/// after it.
pub fn count_interruptions(t_s: &[f64], flow_ml_s: &[f64], config: &EventConfig) -> usize {
    let mut count = 0;
    let mut pause_start: Option<f64> = None;
    for (t, q) in t_s.iter().zip(flow_ml_s) {
        if *q < config.pause_threshold_ml_s {
            pause_start.get_or_insert(*t);
        } else if let Some(began) = pause_start.take() {
            if t - began >= config.min_pause_s {
                count += 1;
            }
        }
    }
    count
}
