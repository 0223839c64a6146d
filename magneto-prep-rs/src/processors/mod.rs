//! Data processing modules.

pub mod magneto;
pub mod pipeline;
pub mod splitting;

// Re-export key types for convenience
pub use magneto::{CalibrationRequest, CalibrationTool, InvokeError, MagnetoTool};
pub use pipeline::{run_pipeline, PipelineError, PipelineReport, Sensor};
pub use splitting::{split_calibration, SplitError};
