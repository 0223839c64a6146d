//! Invocation of the external magneto calibration executable.
//!
//! The tool is a black box with a fixed command line:
//!
//! ```text
//! <executable> <input_csv> <reject_threshold> <Hm> <output_csv>
//! ```
//!
//! Exit status 0 means the corrected file was written; anything else aborts
//! the run.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

use log::{debug, info};
use thiserror::Error;

use crate::config::MagnetoConfig;

/// Errors raised when the calibration tool cannot complete.
#[derive(Debug, Error)]
pub enum InvokeError {
    #[error("failed to launch '{program}': {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{program}' exited with status {code}")]
    NonZeroExit { program: String, code: i32 },

    #[error("'{program}' was terminated by a signal")]
    Signal { program: String },
}

/// Result type for invocation.
pub type Result<T> = std::result::Result<T, InvokeError>;

/// Arguments for one calibration run, in the tool's positional order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalibrationRequest {
    pub input: PathBuf,
    pub reject_threshold: String,
    pub hm: String,
    pub output: PathBuf,
}

impl CalibrationRequest {
    pub fn new(input: &Path, output: &Path, config: &MagnetoConfig) -> Self {
        Self {
            input: input.to_path_buf(),
            reject_threshold: config.reject_threshold.clone(),
            hm: config.hm.clone(),
            output: output.to_path_buf(),
        }
    }

    /// The four positional arguments passed to the tool.
    pub fn args(&self) -> [OsString; 4] {
        [
            self.input.clone().into_os_string(),
            OsString::from(&self.reject_threshold),
            OsString::from(&self.hm),
            self.output.clone().into_os_string(),
        ]
    }

    /// Human-readable command line, for progress output only.
    pub fn command_line(&self, program: &Path) -> String {
        let mut parts = vec![program.display().to_string()];
        parts.extend(self.args().iter().map(|a| a.to_string_lossy().into_owned()));
        parts.join(" ")
    }
}

/// A synchronous calibration backend.
pub trait CalibrationTool {
    /// Run one calibration and block until it finishes.
    fn calibrate(&self, request: &CalibrationRequest) -> Result<()>;
}

/// Runs the magneto executable as a child process.
///
/// The child inherits stdout and stderr. There is no timeout: a hung child
/// hangs the caller.
#[derive(Debug, Clone)]
pub struct MagnetoTool {
    executable: PathBuf,
}

impl MagnetoTool {
    pub fn new<P: Into<PathBuf>>(executable: P) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    pub fn from_config(config: &MagnetoConfig) -> Self {
        Self::new(config.executable.clone())
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    fn program_name(&self) -> String {
        self.executable.display().to_string()
    }
}

impl CalibrationTool for MagnetoTool {
    fn calibrate(&self, request: &CalibrationRequest) -> Result<()> {
        println!("Running command: {}", request.command_line(&self.executable));

        let status = Command::new(&self.executable)
            .args(request.args())
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|e| InvokeError::Launch {
                program: self.program_name(),
                source: e,
            })?;

        debug!("{} finished with {}", self.program_name(), status);
        check_status(&self.program_name(), status)?;

        info!("Calibrated {} -> {}", request.input.display(), request.output.display());
        println!("Finished processing {}.\n", request.input.display());
        Ok(())
    }
}

/// Map a child exit status onto the error taxonomy.
fn check_status(program: &str, status: ExitStatus) -> Result<()> {
    if status.success() {
        return Ok(());
    }
    match status.code() {
        Some(code) => Err(InvokeError::NonZeroExit {
            program: program.to_string(),
            code,
        }),
        None => Err(InvokeError::Signal {
            program: program.to_string(),
        }),
    }
}
