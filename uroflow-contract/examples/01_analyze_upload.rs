//! Analyze a Capture Upload
//!
//! Reads an `ios_capture_v1` JSON document, prints the pre-flight report,
//! then runs the full engine and prints the clinical metrics and verdict.
//!
//! ## Running the Example
//!
//! ```bash
//! cargo run --example 01_analyze_upload -- capture.json
//! cargo run --example 01_analyze_upload -- capture.json config.json
//! ```
//!
//! Without arguments a short synthetic capture is analyzed.

use std::error::Error;
use std::fs;

use serde_json::{json, Value};
use uroflow_contract::{analyze_json, config_from_json, inspect};
use uroflow_core::EngineConfig;

fn demo_upload() -> Value {
    // Steady 10 mL/s into a receptacle calibrated at 8 mL/mm
    let samples: Vec<Value> = (0..40)
        .map(|i| {
            let t = i as f64 * 0.25;
            let filling = (1.0..=8.0).contains(&t);
            let level = 30.0 + (t.clamp(1.0, 8.0) - 1.0) * 10.0 / 8.0;
            json!({
                "t_s": t,
                "depth_level_mm": level,
                "rgb_level_mm": level + 0.1,
                "depth_confidence": 0.9,
                "roi_valid": true,
                "audio_rms_dbfs": if filling { -30.0 } else { -50.0 },
                "motion_norm": 0.03
            })
        })
        .collect();

    json!({
        "schema_version": "ios_capture_v1",
        "session": {
            "session_id": "demo",
            "started_at": "2026-02-24T10:00:00Z",
            "mode": "water_impact",
            "calibration": { "ml_per_mm": 8.0 }
        },
        "samples": samples
    })
}

fn main() -> Result<(), Box<dyn Error>> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let upload: Value = match args.first() {
        Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
        None => demo_upload(),
    };
    let config = match args.get(1) {
        Some(path) => config_from_json(&fs::read_to_string(path)?)?,
        None => EngineConfig::default(),
    };

    println!("=== Capture Report ===");
    let report = inspect(&upload)?;
    println!("samples:              {}", report.sample_count);
    println!("roi valid ratio:      {:.2}", report.roi_valid_ratio);
    println!("low depth confidence: {:.2}", report.low_depth_confidence_ratio);
    for warning in &report.warnings {
        println!("warning:              {}", warning.message());
    }

    println!("\n=== Analysis ===");
    let analysis = analyze_json(&upload, &config)?;
    let m = &analysis.metrics;
    println!("Qmax:          {:.2} mL/s", m.qmax_ml_s);
    println!("Qavg:          {:.2} mL/s", m.qavg_ml_s);
    println!("Vvoid:         {:.1} mL", m.vvoid_ml);
    println!("flow time:     {:.2} s", m.flow_time_s);
    println!("TQmax:         {:.2} s", m.tqmax_s);
    println!("interruptions: {}", m.interruptions);
    println!(
        "quality:       {} (score {:.1})",
        analysis.status().as_str(),
        analysis.quality.score
    );
    for reason in &analysis.quality.reasons {
        println!("reason:        {:?}", reason);
    }

    Ok(())
}
