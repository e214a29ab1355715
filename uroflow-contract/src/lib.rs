//! JSON Front Door for the Uroflow Engine
//!
//! ## Overview
//!
//! `uroflow-core` works on typed captures and never sees JSON. This crate is
//! the boundary where untyped uploads become typed values:
//!
//! ```text
//!  JSON upload ──> contract::validate_payload ──> CapturePayload ──> uroflow_core::analyze
//!                         │                             │
//!                         └─ ContractError              └─ report::CaptureReport
//!
//!  JSON config ──> config_from_json ──> EngineConfig (validated)
//! ```
//!
//! A rejected contract stops the request before any numeric stage runs.
//! Everything the engine returns serializes back to JSON with `serde_json`,
//! and identical inputs produce byte-identical output.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use uroflow_contract::{analyze_json, config_from_json};
//!
//! let upload: serde_json::Value = serde_json::from_str(r#"{ "schema_version": "ios_capture_v1" }"#).unwrap();
//! let config = config_from_json(r#"{ "events": { "start_threshold_ml_s": 0.6 } }"#).unwrap();
//! match analyze_json(&upload, &config) {
//!     Ok(analysis) => println!("{}", analysis.status().as_str()),
//!     Err(err) => eprintln!("rejected: {}", err),
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod contract;
pub mod report;

pub use contract::validate_payload;
pub use report::{CaptureReport, CaptureWarning};

use log::debug;
use serde_json::Value;
use thiserror_no_std::Error;
use uroflow_core::{
    analyze, CaptureAnalysis, ConfigError, ContractResult, EngineConfig, EngineResult,
};

/// Failure to load an engine configuration
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoadError {
    /// The text is not a JSON engine configuration
    #[error("invalid configuration JSON: {0}")]
    Json(String),

    /// The configuration parsed but is internally inconsistent
    #[error("inconsistent configuration: {0}")]
    Config(#[from] ConfigError),
}

/// Validate a JSON upload and analyze it.
pub fn analyze_json(document: &Value, config: &EngineConfig) -> EngineResult<CaptureAnalysis> {
    let payload = validate_payload(document)?;
    analyze(&payload, config)
}

/// Validate a JSON upload and summarize it without running the engine.
pub fn inspect(document: &Value) -> ContractResult<CaptureReport> {
    validate_payload(document).map(|payload| CaptureReport::from_payload(&payload))
}

/// Parse and validate an engine configuration.
///
/// Missing sections and fields keep their defaults.
pub fn config_from_json(text: &str) -> Result<EngineConfig, LoadError> {
    let config: EngineConfig =
        serde_json::from_str(text).map_err(|err| LoadError::Json(err.to_string()))?;
    config.validate()?;
    debug!("config: loaded engine configuration");
    Ok(config)
}
