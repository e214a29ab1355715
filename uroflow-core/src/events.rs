//! Voiding Event Boundary Detection
//!
//! ## Overview
//!
//! A capture usually starts and ends with the phone pointed at a still
//! receptacle. The event window is the part of the recording where urine
//! actually flows. It is found with two thresholds (hysteresis) so a noisy
//! tail does not cut the event short:
//!
//! ```text
//! Q(t)
//!  │          ╭──────╮
//!  │        ╭─╯      ╰──╮
//!  │ start ─┼───────────┼────────  0.5 mL/s
//!  │ stop  ─┼───────────┼───╮────  0.2 mL/s
//!  │ ───────╯           │   ╰───
//!  └────────┴───────────┴───┴────> t
//!        forward     backward
//!         scan         scan
//! ```
//!
//! - **Start**: first sample with `Q >= start_threshold`
//! - **End**: last sample with `Q >= stop_threshold`
//!
//! ## ROI Gating
//!
//! When the receptacle ROI was tracked for a meaningful share of the capture,
//! samples with a lost ROI cannot open or close the window. When tracking is
//! mostly lost the gate would reject everything, so it is switched off and
//! the ROI problem is left to the quality policy.

use serde::{Deserialize, Serialize};

use crate::capture::ratio;
use crate::config::EventConfig;

/// Detected voiding window, inclusive on both ends
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EventWindow {
    /// First sample of the window
    pub start_index: usize,
    /// Last sample of the window
    pub end_index: usize,
    /// Time of the first sample (s)
    pub t_start_s: f64,
    /// Time of the last sample (s)
    pub t_end_s: f64,
    /// Whether ROI validity constrained the boundaries
    pub roi_gated: bool,
    /// Heuristic confidence in `[0, 1]`
    pub confidence: f64,
}

impl EventWindow {
    /// Window duration (s)
    pub fn duration_s(&self) -> f64 {
        (self.t_end_s - self.t_start_s).max(0.0)
    }

    /// Number of samples in the window
    pub fn sample_count(&self) -> usize {
        self.end_index - self.start_index + 1
    }

    /// Whether `index` falls inside the window
    pub fn contains(&self, index: usize) -> bool {
        (self.start_index..=self.end_index).contains(&index)
    }
}

/// Find the voiding window on a flow series.
///
/// `t_s`, `flow_ml_s` and `roi_valid` are aligned. Returns `None` when no
/// sample reaches the start threshold.
pub fn detect(
    t_s: &[f64],
    flow_ml_s: &[f64],
    roi_valid: &[bool],
    config: &EventConfig,
) -> Option<EventWindow> {
    let n = t_s.len().min(flow_ml_s.len()).min(roi_valid.len());
    let roi_ratio = ratio(roi_valid[..n].iter().filter(|v| **v).count(), n);
    let roi_gated = roi_ratio >= config.roi_gate_min_ratio;
    let admissible = |i: usize| !roi_gated || roi_valid[i];

    let start_index = match (0..n).find(|&i| admissible(i) && flow_ml_s[i] >= config.start_threshold_ml_s) {
        Some(i) => i,
        None => {
            log_debug!("events: no sample reached {} mL/s", config.start_threshold_ml_s);
            return None;
        }
    };

    // The start sample itself satisfies the stop threshold
    let end_index = (start_index..n)
        .rev()
        .find(|&i| admissible(i) && flow_ml_s[i] >= config.stop_threshold_ml_s)
        .unwrap_or(start_index);

    let window = &flow_ml_s[start_index..=end_index];
    let peak = window.iter().copied().fold(0.0f64, f64::max);
    let roi_in_window = ratio(
        roi_valid[start_index..=end_index].iter().filter(|v| **v).count(),
        window.len(),
    );
    let strength = (peak / (config.flow_strength_multiple * config.start_threshold_ml_s)).min(1.0);
    let confidence = (0.5 * roi_in_window + 0.5 * strength).max(0.0).min(1.0);

    log_debug!(
        "events: window [{}, {}] gated={} confidence={:.2}",
        start_index,
        end_index,
        roi_gated,
        confidence
    );

    Some(EventWindow {
        start_index,
        end_index,
        t_start_s: t_s[start_index],
        t_end_s: t_s[end_index],
        roi_gated,
        confidence,
    })
}
