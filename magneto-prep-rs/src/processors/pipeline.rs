//! The fixed three-step calibration pipeline: split, then calibrate the
//! accelerometer file, then calibrate the magnetometer file.

use std::fmt;
use std::path::PathBuf;

use log::info;
use thiserror::Error;

use crate::config::CalibrationConfig;
use crate::processors::magneto::{CalibrationRequest, CalibrationTool, InvokeError};
use crate::processors::splitting::{split_calibration, SplitError};

/// Which sensor a pipeline step belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sensor {
    Accelerometer,
    Magnetometer,
}

impl fmt::Display for Sensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sensor::Accelerometer => write!(f, "accelerometer"),
            Sensor::Magnetometer => write!(f, "magnetometer"),
        }
    }
}

/// Errors that abort the pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("split failed: {0}")]
    Split(#[from] SplitError),

    #[error("{sensor} calibration failed: {source}")]
    Calibrate {
        sensor: Sensor,
        #[source]
        source: InvokeError,
    },
}

/// Outcome of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineReport {
    pub rows: usize,
    pub accel_corrected: PathBuf,
    pub mag_corrected: PathBuf,
}

/// Run split and both calibrations in order, stopping at the first failure.
pub fn run_pipeline(
    config: &CalibrationConfig,
    tool: &dyn CalibrationTool,
) -> Result<PipelineReport, PipelineError> {
    let paths = &config.paths;

    let rows = split_calibration(
        &paths.input,
        &paths.accel_split,
        &paths.mag_split,
        config.split.max_rows,
    )?;

    let steps = [
        (Sensor::Accelerometer, &paths.accel_split, &paths.accel_corrected),
        (Sensor::Magnetometer, &paths.mag_split, &paths.mag_corrected),
    ];
    for (sensor, input, output) in steps {
        info!("Calibrating {} data", sensor);
        let request = CalibrationRequest::new(input, output, &config.magneto);
        tool.calibrate(&request)
            .map_err(|source| PipelineError::Calibrate { sensor, source })?;
    }

    Ok(PipelineReport {
        rows,
        accel_corrected: paths.accel_corrected.clone(),
        mag_corrected: paths.mag_corrected.clone(),
    })
}
