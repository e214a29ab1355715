//! End-to-end tests for the analysis engine
//!
//! Runs complete captures through normalize -> fuse -> detect -> summarize
//! -> evaluate and checks the clinical outputs against ground truth.

#![cfg(test)]

mod common;

use uroflow_core::{
    analyze, CaptureMode, EngineConfig, EngineError, NormalizationError, QualityReason,
    QualityStatus, Sample,
};

use common::{
    generators::{generate, BenchConfig, BenchScenario, FlowProfile},
    payload, relative_error,
    scenarios::{flat_capture, scenario_a, scenario_b, SCENARIO_VOLUME_ML},
    ML_PER_MM,
};

#[test]
fn test_scenario_a_is_valid() {
    let analysis = analyze(&scenario_a(), &EngineConfig::default()).unwrap();

    assert_eq!(analysis.status(), QualityStatus::Valid);
    assert!(relative_error(analysis.metrics.vvoid_ml, SCENARIO_VOLUME_ML) <= 0.05);
    assert!(analysis.metrics.qmax_ml_s > 0.0);
    assert!(analysis.metrics.qavg_ml_s <= analysis.metrics.qmax_ml_s);
    assert!(analysis.metrics.tqmax_s <= analysis.metrics.flow_time_s);
    assert!(analysis.quality.reasons.is_empty());
}

#[test]
fn test_scenario_b_rejects_but_keeps_metrics() {
    let analysis = analyze(&scenario_b(), &EngineConfig::default()).unwrap();

    assert_eq!(analysis.status(), QualityStatus::Reject);
    assert!(analysis.quality.has_reason(QualityReason::RoiLost));

    // The ROI gate is off, so the window is the same as scenario A's
    let window = analysis.window.expect("window found without the ROI gate");
    assert!(!window.roi_gated);
    assert!(analysis.metrics.vvoid_ml > 0.0);
    assert!(analysis.metrics.qmax_ml_s > 0.0);

    let reference = analyze(&scenario_a(), &EngineConfig::default()).unwrap();
    assert_eq!(analysis.metrics.vvoid_ml, reference.metrics.vvoid_ml);
}

#[test]
fn test_flat_capture_has_no_event() {
    let analysis = analyze(&flat_capture(), &EngineConfig::default()).unwrap();

    assert!(analysis.window.is_none());
    assert_eq!(analysis.status(), QualityStatus::Reject);
    assert!(analysis.quality.has_reason(QualityReason::EventNotFound));
    assert_eq!(analysis.metrics.qmax_ml_s, 0.0);
    assert_eq!(analysis.metrics.provenance.start_index, None);
}

#[test]
fn test_analysis_is_deterministic() {
    let bench = generate(&BenchConfig { scenario: BenchScenario::phone_motion(), ..BenchConfig::default() });
    let config = EngineConfig::default();

    let first = analyze(&bench.payload, &config).unwrap();
    let second = analyze(&bench.payload, &config).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn test_ideal_bench_matches_ground_truth() {
    for profile in [FlowProfile::Bell, FlowProfile::Plateau, FlowProfile::Staccato] {
        let bench = generate(&BenchConfig { profile, scenario: BenchScenario::ideal(), ..BenchConfig::default() });
        let analysis = analyze(&bench.payload, &EngineConfig::default()).unwrap();

        assert_eq!(analysis.status(), QualityStatus::Valid, "{:?}", profile);
        assert!(
            relative_error(analysis.metrics.vvoid_ml, bench.true_vvoid_ml()) <= 0.05,
            "{:?}: {} vs {}",
            profile,
            analysis.metrics.vvoid_ml,
            bench.true_vvoid_ml()
        );
        assert!(relative_error(analysis.metrics.qmax_ml_s, bench.true_qmax_ml_s()) <= 0.1);
        assert!(!analysis.fusion_flags.volume_mismatch);
    }
}

#[test]
fn test_ideal_bell_window_brackets_the_voiding() {
    let config = BenchConfig { scenario: BenchScenario::ideal(), ..BenchConfig::default() };
    let bench = generate(&config);
    let analysis = analyze(&bench.payload, &EngineConfig::default()).unwrap();

    let window = analysis.window.unwrap();
    assert!(window.t_start_s >= config.lead_s && window.t_start_s <= config.lead_s + 1.0);
    let voiding_end = config.lead_s + config.duration_s;
    assert!(window.t_end_s >= voiding_end - 1.0 && window.t_end_s <= voiding_end + 0.3);
    assert!(window.roi_gated);
    assert!(window.confidence > 0.9);
}

#[test]
fn test_intermittent_profile_counts_interruptions() {
    let bench = generate(&BenchConfig {
        profile: FlowProfile::Intermittent,
        scenario: BenchScenario::ideal(),
        ..BenchConfig::default()
    });
    let analysis = analyze(&bench.payload, &EngineConfig::default()).unwrap();
    assert_eq!(analysis.metrics.interruptions, 2);

    let single = generate(&BenchConfig { scenario: BenchScenario::ideal(), ..BenchConfig::default() });
    let analysis = analyze(&single.payload, &EngineConfig::default()).unwrap();
    assert_eq!(analysis.metrics.interruptions, 0);
}

#[test]
fn test_noisy_scenarios_still_find_the_event() {
    for scenario in BenchScenario::all() {
        for profile in FlowProfile::ALL {
            let bench = generate(&BenchConfig { profile, scenario, ..BenchConfig::default() });
            let analysis = analyze(&bench.payload, &EngineConfig::default()).unwrap();

            assert!(analysis.window.is_some(), "{} {:?}", scenario.name, profile);
            assert!(analysis.metrics.qmax_ml_s > 0.0);
            // Clamping noise at zero only ever adds volume
            assert!(analysis.metrics.vvoid_ml >= 0.9 * bench.true_vvoid_ml());
            assert!(!analysis.quality.has_reason(QualityReason::LowSnr));
            assert!(!analysis.quality.has_reason(QualityReason::NotInWater));
            assert!((0.0..=100.0).contains(&analysis.quality.score));
        }
    }
}

#[test]
fn test_reflective_bowl_reports_rgb_fallback() {
    let bench = generate(&BenchConfig { scenario: BenchScenario::reflective_bowl(), ..BenchConfig::default() });
    let analysis = analyze(&bench.payload, &EngineConfig::default()).unwrap();
    assert!(analysis.quality.has_reason(QualityReason::RgbFallback));
    assert!(analysis.fusion_flags.rgb_fallback_samples > 0);
}

#[test]
fn test_silent_water_impact_is_flagged() {
    let mut bench = generate(&BenchConfig { scenario: BenchScenario::ideal(), ..BenchConfig::default() });
    for sample in &mut bench.payload.samples {
        sample.audio_rms_dbfs = Some(-50.0);
    }
    let analysis = analyze(&bench.payload, &EngineConfig::default()).unwrap();
    assert!(analysis.quality.has_reason(QualityReason::NotInWater));

    bench.payload.session.mode = CaptureMode::JetInAir;
    let analysis = analyze(&bench.payload, &EngineConfig::default()).unwrap();
    assert!(!analysis.quality.has_reason(QualityReason::NotInWater));
}

#[test]
fn test_shaken_phone_is_penalized() {
    let mut bench = generate(&BenchConfig { scenario: BenchScenario::ideal(), ..BenchConfig::default() });
    for (i, sample) in bench.payload.samples.iter_mut().enumerate() {
        if i % 2 == 0 {
            sample.motion_norm = Some(0.5);
        }
    }
    let analysis = analyze(&bench.payload, &EngineConfig::default()).unwrap();
    assert!(analysis.quality.has_reason(QualityReason::HighMotion));
    assert!(analysis.quality.score < 100.0);
}

#[test]
fn test_no_usable_level_is_an_error_not_a_verdict() {
    let samples = vec![
        Sample::new(0.0, Some(f64::NAN), None, 0.9, true),
        Sample::new(0.5, None, Some(f64::INFINITY), 0.9, true),
        Sample::new(1.0, Some(12.0), None, 0.9, true),
    ];
    let err = analyze(&payload(samples, CaptureMode::WaterImpact, ML_PER_MM), &EngineConfig::default())
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::Normalization(NormalizationError::InsufficientUsableSamples { required: 2, usable: 1 })
    );
}

#[test]
fn test_partial_config_overrides_apply() {
    let config: EngineConfig =
        serde_json::from_str(r#"{ "events": { "start_threshold_ml_s": 1000.0, "stop_threshold_ml_s": 0.2 } }"#)
            .unwrap();
    assert!(config.validate().is_ok());
    assert_eq!(config.fusion, EngineConfig::default().fusion);

    let analysis = analyze(&scenario_a(), &config).unwrap();
    assert!(analysis.window.is_none());
    assert_eq!(analysis.status(), QualityStatus::Reject);
}
