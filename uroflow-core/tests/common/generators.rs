//! Synthetic uroflow bench
//!
//! Generates captures with a known ground-truth flow curve and a simulated
//! phone observing it. The flow profile is scaled so it integrates exactly
//! to the target volume; the receptacle level follows from the calibration.
//! Each sensor channel then sees that level through its own noise model:
//!
//! - depth: Gaussian noise, occasional low-confidence frames with triple
//!   noise, motion spikes and dropped frames
//! - RGB: smaller Gaussian noise, always present
//! - ROI: occasional tracking loss
//! - audio: noise floor plus an impact component that follows the flow
//! - motion: small jitter with spikes on shaken frames
//!
//! Every draw comes from one seeded `StdRng`, so a config always yields the
//! same capture.

use std::f64::consts::PI;

use rand::{rngs::StdRng, Rng, SeedableRng};
use uroflow_core::{CaptureMode, CapturePayload, Sample};

use super::payload;

/// Shape of the ground-truth flow curve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowProfile {
    /// Single smooth hump
    Bell,
    /// Fast ramp, long steady flow, fast decay
    Plateau,
    /// Bell with two complete stops
    Intermittent,
    /// Bell modulated by a fast ripple
    Staccato,
}

impl FlowProfile {
    /// All profiles
    pub const ALL: [FlowProfile; 4] =
        [FlowProfile::Bell, FlowProfile::Plateau, FlowProfile::Intermittent, FlowProfile::Staccato];

    /// Relative flow at normalized time `u` in `[0, 1]`
    pub fn envelope(&self, u: f64) -> f64 {
        if !(0.0..=1.0).contains(&u) {
            return 0.0;
        }
        let hump = |power: f64| (PI * u).sin().max(0.0).powf(power);
        match self {
            FlowProfile::Bell => hump(1.8),
            FlowProfile::Plateau => {
                let ramp = 0.18;
                if u < ramp {
                    u / ramp
                } else if u > 1.0 - ramp {
                    (1.0 - u) / ramp
                } else {
                    1.0
                }
            }
            FlowProfile::Intermittent => {
                let stopped = (0.28..=0.37).contains(&u) || (0.62..=0.72).contains(&u);
                if stopped {
                    0.0
                } else {
                    hump(1.5)
                }
            }
            FlowProfile::Staccato => {
                let ripple = 0.55 + 0.45 * (0.5 * (1.0 + (2.0 * PI * 8.0 * u).sin()));
                hump(1.3) * ripple
            }
        }
    }
}

/// Noise and artifact envelope of the simulated phone
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BenchScenario {
    pub name: &'static str,
    pub depth_noise_mm: f64,
    pub rgb_noise_mm: f64,
    pub low_confidence_probability: f64,
    pub missing_depth_probability: f64,
    pub motion_spike_probability: f64,
    pub motion_spike_mm: f64,
    pub roi_loss_probability: f64,
}

impl BenchScenario {
    /// Noise-free observation of the ground truth
    pub fn ideal() -> Self {
        Self {
            name: "ideal",
            depth_noise_mm: 0.0,
            rgb_noise_mm: 0.0,
            low_confidence_probability: 0.0,
            missing_depth_probability: 0.0,
            motion_spike_probability: 0.0,
            motion_spike_mm: 0.0,
            roi_loss_probability: 0.0,
        }
    }

    /// Still phone, matte receptacle
    pub fn quiet_lab() -> Self {
        Self {
            name: "quiet_lab",
            depth_noise_mm: 0.25,
            rgb_noise_mm: 0.18,
            low_confidence_probability: 0.04,
            ..Self::ideal()
        }
    }

    /// Glossy bowl: depth frequently unreliable or missing
    pub fn reflective_bowl() -> Self {
        Self {
            name: "reflective_bowl",
            depth_noise_mm: 0.55,
            rgb_noise_mm: 0.35,
            low_confidence_probability: 0.22,
            missing_depth_probability: 0.08,
            motion_spike_probability: 0.05,
            motion_spike_mm: 2.8,
            roi_loss_probability: 0.02,
        }
    }

    /// Hand-held phone
    pub fn phone_motion() -> Self {
        Self {
            name: "phone_motion",
            depth_noise_mm: 0.45,
            rgb_noise_mm: 0.28,
            low_confidence_probability: 0.16,
            missing_depth_probability: 0.03,
            motion_spike_probability: 0.16,
            motion_spike_mm: 4.2,
            roi_loss_probability: 0.05,
        }
    }

    /// The three named field scenarios
    pub fn all() -> [BenchScenario; 3] {
        [Self::quiet_lab(), Self::reflective_bowl(), Self::phone_motion()]
    }
}

/// Bench generation parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BenchConfig {
    pub profile: FlowProfile,
    pub scenario: BenchScenario,
    /// Duration of the voiding itself (s)
    pub duration_s: f64,
    /// Still receptacle before and after the voiding (s)
    pub lead_s: f64,
    pub tail_s: f64,
    pub sample_rate_hz: f64,
    pub target_volume_ml: f64,
    pub ml_per_mm: f64,
    /// Level of the receptacle before voiding (mm)
    pub base_level_mm: f64,
    pub mode: CaptureMode,
    pub seed: u64,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            profile: FlowProfile::Bell,
            scenario: BenchScenario::quiet_lab(),
            duration_s: 18.0,
            lead_s: 2.0,
            tail_s: 2.0,
            sample_rate_hz: 10.0,
            target_volume_ml: 320.0,
            ml_per_mm: 8.0,
            base_level_mm: 20.0,
            mode: CaptureMode::WaterImpact,
            seed: 42,
        }
    }
}

/// A generated capture with its ground truth
#[derive(Debug, Clone)]
pub struct BenchCapture {
    pub payload: CapturePayload,
    pub true_flow_ml_s: Vec<f64>,
    pub true_volume_ml: Vec<f64>,
    pub true_level_mm: Vec<f64>,
}

impl BenchCapture {
    /// Peak of the ground-truth flow
    pub fn true_qmax_ml_s(&self) -> f64 {
        self.true_flow_ml_s.iter().copied().fold(0.0, f64::max)
    }

    /// Total ground-truth volume
    pub fn true_vvoid_ml(&self) -> f64 {
        self.true_volume_ml.last().copied().unwrap_or(0.0)
    }
}

/// Standard normal draw (Box-Muller)
fn gaussian(rng: &mut StdRng, sigma: f64) -> f64 {
    if sigma == 0.0 {
        return 0.0;
    }
    let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
    let u2: f64 = rng.gen();
    sigma * (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}

fn cumulative_trapezoid(t: &[f64], values: &[f64]) -> Vec<f64> {
    let mut total = 0.0;
    let mut out = vec![0.0];
    for i in 1..t.len() {
        total += 0.5 * (values[i] + values[i - 1]) * (t[i] - t[i - 1]);
        out.push(total);
    }
    out
}

/// Generate one bench capture.
pub fn generate(config: &BenchConfig) -> BenchCapture {
    let total_s = config.lead_s + config.duration_s + config.tail_s;
    let n = (total_s * config.sample_rate_hz).round() as usize + 1;
    let t: Vec<f64> = (0..n).map(|i| i as f64 / config.sample_rate_hz).collect();

    let raw: Vec<f64> = t
        .iter()
        .map(|x| config.profile.envelope((x - config.lead_s) / config.duration_s))
        .collect();
    let raw_volume = cumulative_trapezoid(&t, &raw).last().copied().unwrap_or(0.0);
    let scale = config.target_volume_ml / raw_volume;
    let true_flow_ml_s: Vec<f64> = raw.iter().map(|q| q * scale).collect();
    let true_volume_ml = cumulative_trapezoid(&t, &true_flow_ml_s);
    let true_level_mm: Vec<f64> = true_volume_ml
        .iter()
        .map(|v| config.base_level_mm + v / config.ml_per_mm)
        .collect();
    let peak = true_flow_ml_s.iter().copied().fold(0.0, f64::max);

    let sc = &config.scenario;
    let mut rng = StdRng::seed_from_u64(config.seed);
    let samples = (0..n)
        .map(|i| {
            let level = true_level_mm[i];
            let (mut confidence, noise): (f64, f64) = if rng.gen::<f64>() < sc.low_confidence_probability {
                (rng.gen_range(0.05..0.45), sc.depth_noise_mm * 3.0)
            } else {
                (rng.gen_range(0.82..0.99), sc.depth_noise_mm)
            };

            let mut depth = Some(level + gaussian(&mut rng, noise));
            let mut motion = 0.03 + gaussian(&mut rng, 0.01).abs();
            if rng.gen::<f64>() < sc.motion_spike_probability {
                let direction = if rng.gen::<f64>() < 0.5 { -1.0 } else { 1.0 };
                depth = depth.map(|d| d + direction * sc.motion_spike_mm);
                confidence = confidence.min(0.35);
                motion = 0.35 + gaussian(&mut rng, 0.05).abs();
            }
            if rng.gen::<f64>() < sc.missing_depth_probability {
                depth = None;
                confidence = 0.0;
            }

            let rgb = level + gaussian(&mut rng, sc.rgb_noise_mm);
            let roi_valid = rng.gen::<f64>() >= sc.roi_loss_probability;
            let impact = if peak > 0.0 { 25.0 * true_flow_ml_s[i] / peak } else { 0.0 };
            let audio = -52.0 + impact + gaussian(&mut rng, 1.5);

            Sample::new(t[i], depth, Some(rgb), confidence, roi_valid)
                .with_proxies(Some(audio), Some(motion))
        })
        .collect();

    BenchCapture {
        payload: payload(samples, config.mode, config.ml_per_mm),
        true_flow_ml_s,
        true_volume_ml,
        true_level_mm,
    }
}
