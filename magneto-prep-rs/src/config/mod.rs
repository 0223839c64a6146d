//! Configuration types for the calibration preparation pipeline.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File locations used by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Combined accelerometer/magnetometer log
    #[serde(default = "default_input")]
    pub input: PathBuf,

    /// Accelerometer split written by the splitter
    #[serde(default = "default_accel_split")]
    pub accel_split: PathBuf,

    /// Magnetometer split written by the splitter
    #[serde(default = "default_mag_split")]
    pub mag_split: PathBuf,

    /// Corrected accelerometer data produced by the calibration tool
    #[serde(default = "default_accel_corrected")]
    pub accel_corrected: PathBuf,

    /// Corrected magnetometer data produced by the calibration tool
    #[serde(default = "default_mag_corrected")]
    pub mag_corrected: PathBuf,
}

fn default_input() -> PathBuf {
    Path::new("input").join("calib.csv")
}

fn default_accel_split() -> PathBuf {
    Path::new("input").join("out_acc.csv")
}

fn default_mag_split() -> PathBuf {
    Path::new("input").join("out_mag.csv")
}

fn default_accel_corrected() -> PathBuf {
    Path::new("output").join("corr_acc.csv")
}

fn default_mag_corrected() -> PathBuf {
    Path::new("output").join("corr_mag.csv")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            input: default_input(),
            accel_split: default_accel_split(),
            mag_split: default_mag_split(),
            accel_corrected: default_accel_corrected(),
            mag_corrected: default_mag_corrected(),
        }
    }
}

/// Configuration for splitting the combined log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitConfig {
    /// Maximum number of non-blank rows to retain
    #[serde(default = "default_max_rows")]
    pub max_rows: usize,
}

fn default_max_rows() -> usize {
    300
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            max_rows: default_max_rows(),
        }
    }
}

/// Configuration for the external magneto executable.
///
/// `reject_threshold` and `hm` are handed to the tool verbatim; "0" asks the
/// tool for its own defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MagnetoConfig {
    /// Program name or path of the calibration executable
    #[serde(default = "default_executable")]
    pub executable: PathBuf,

    /// Outlier reject threshold
    #[serde(default = "default_passthrough")]
    pub reject_threshold: String,

    /// Expected field norm (Hm)
    #[serde(default = "default_passthrough")]
    pub hm: String,
}

fn default_executable() -> PathBuf {
    PathBuf::from("magneto.exe")
}

fn default_passthrough() -> String {
    "0".to_string()
}

impl Default for MagnetoConfig {
    fn default() -> Self {
        Self {
            executable: default_executable(),
            reject_threshold: default_passthrough(),
            hm: default_passthrough(),
        }
    }
}

/// Main pipeline configuration combining all sub-configs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalibrationConfig {
    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub split: SplitConfig,

    #[serde(default)]
    pub magneto: MagnetoConfig,
}

impl CalibrationConfig {
    /// Load configuration from a YAML file. Missing keys take their defaults.
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: CalibrationConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Save configuration to a YAML file.
    pub fn to_yaml<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = serde_yaml::to_string(self).context("Failed to serialize config")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_default_calibration_config() {
        let config = CalibrationConfig::default();
        assert_eq!(config.split.max_rows, 300);
        assert_eq!(config.magneto.reject_threshold, "0");
        assert_eq!(config.magneto.hm, "0");
        assert_eq!(config.magneto.executable, PathBuf::from("magneto.exe"));
        assert_eq!(config.paths.input, Path::new("input").join("calib.csv"));
        assert_eq!(config.paths.mag_corrected, Path::new("output").join("corr_mag.csv"));
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "split:").unwrap();
        writeln!(file, "  max_rows: 50").unwrap();
        writeln!(file, "magneto:").unwrap();
        writeln!(file, "  hm: \"48.5\"").unwrap();
        file.flush().unwrap();

        let config = CalibrationConfig::from_yaml(file.path()).unwrap();
        assert_eq!(config.split.max_rows, 50);
        assert_eq!(config.magneto.hm, "48.5");
        assert_eq!(config.magneto.reject_threshold, "0");
        assert_eq!(config.paths, PathsConfig::default());
    }

    #[test]
    fn test_yaml_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("calib.yaml");

        let mut config = CalibrationConfig::default();
        config.magneto.executable = PathBuf::from("/opt/magneto/magneto");
        config.to_yaml(&path).unwrap();

        let loaded = CalibrationConfig::from_yaml(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_config_file_is_error() {
        let dir = TempDir::new().unwrap();
        let result = CalibrationConfig::from_yaml(dir.path().join("absent.yaml"));
        assert!(result.is_err());
    }
}
