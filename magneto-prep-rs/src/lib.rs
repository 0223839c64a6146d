//! Calibration input preparation for the magneto calibration tool.
//!
//! This crate provides tools for:
//! - Splitting a combined accelerometer/magnetometer CSV log into capped,
//!   per-sensor CSV files in the exact layout magneto expects
//! - Running the external magneto executable on each file
//! - Chaining both into a single abort-on-first-failure pipeline
//!
//! # Example
//!
//! ```no_run
//! use magneto_prep::{run_pipeline, CalibrationConfig, MagnetoTool};
//!
//! let config = CalibrationConfig::default();
//! let tool = MagnetoTool::from_config(&config.magneto);
//! let report = run_pipeline(&config, &tool).unwrap();
//! println!("{} rows calibrated", report.rows);
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod processors;

pub use config::{CalibrationConfig, MagnetoConfig, PathsConfig, SplitConfig};
pub use crate::core::loaders::CalibrationDataset;
pub use processors::{run_pipeline, split_calibration, CalibrationTool, MagnetoTool, PipelineReport};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
