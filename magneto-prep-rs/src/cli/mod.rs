//! Command-line interface for the calibration preparation pipeline.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info};
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::config::CalibrationConfig;
use crate::processors::magneto::{CalibrationRequest, CalibrationTool, MagnetoTool};
use crate::processors::{run_pipeline, split_calibration};

#[derive(Parser)]
#[command(name = "magneto-prep")]
#[command(about = "Split IMU calibration logs and run magneto on each sensor", version)]
pub struct Cli {
    /// Path to YAML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Split the combined log and calibrate both sensors (default)
    Run {
        /// Combined accelerometer/magnetometer CSV
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Maximum number of rows to keep
        #[arg(long)]
        max_rows: Option<usize>,
        /// Calibration executable
        #[arg(long)]
        magneto: Option<PathBuf>,
        /// Reject threshold passed to the calibration tool
        #[arg(long)]
        reject_threshold: Option<String>,
        /// Hm value passed to the calibration tool
        #[arg(long)]
        hm: Option<String>,
    },

    /// Only split the combined log into per-sensor files
    Split {
        /// Combined accelerometer/magnetometer CSV
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Accelerometer output CSV
        #[arg(long)]
        acc: Option<PathBuf>,
        /// Magnetometer output CSV
        #[arg(long)]
        mag: Option<PathBuf>,
        /// Maximum number of rows to keep
        #[arg(long)]
        max_rows: Option<usize>,
    },

    /// Run the calibration tool on a single sensor file
    Calibrate {
        /// Sensor CSV to calibrate
        input: PathBuf,
        /// Corrected output CSV
        output: PathBuf,
        /// Calibration executable
        #[arg(long)]
        magneto: Option<PathBuf>,
        /// Reject threshold passed to the calibration tool
        #[arg(long)]
        reject_threshold: Option<String>,
        /// Hm value passed to the calibration tool
        #[arg(long)]
        hm: Option<String>,
    },

    /// Write the default configuration to a YAML file
    InitConfig {
        /// Destination path
        path: PathBuf,
    },
}

/// Create a spinner for indeterminate operations
fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Print a summary box
fn print_summary(title: &str, items: &[(&str, String)]) {
    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║ {:<62} ║", title);
    println!("╠══════════════════════════════════════════════════════════════╣");
    for (key, value) in items {
        let display_value = if value.chars().count() > 39 {
            let head: String = value.chars().take(36).collect();
            format!("{}...", head)
        } else {
            value.clone()
        };
        println!("║ {:<20}: {:<39} ║", key, display_value);
    }
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();
}

/// Apply command-line overrides for the calibration tool.
fn apply_magneto_overrides(
    config: &mut CalibrationConfig,
    magneto: Option<PathBuf>,
    reject_threshold: Option<String>,
    hm: Option<String>,
) {
    if let Some(exe) = magneto {
        config.magneto.executable = exe;
    }
    if let Some(threshold) = reject_threshold {
        config.magneto.reject_threshold = threshold;
    }
    if let Some(hm) = hm {
        config.magneto.hm = hm;
    }
}

pub fn run() {
    let cli = Cli::parse();

    // Initialize logging based on verbosity (must come first)
    env_logger::Builder::new()
        .filter_level(match cli.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .format_timestamp_secs()
        .init();

    if let Err(e) = dispatch(cli) {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn dispatch(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => {
            let cfg = CalibrationConfig::from_yaml(path)?;
            info!("Loaded config from: {}", path.display());
            cfg
        }
        None => CalibrationConfig::default(),
    };

    let command = cli.command.unwrap_or(Commands::Run {
        input: None,
        max_rows: None,
        magneto: None,
        reject_threshold: None,
        hm: None,
    });

    match command {
        Commands::Run { input, max_rows, magneto, reject_threshold, hm } => {
            if let Some(input) = input {
                config.paths.input = input;
            }
            if let Some(max_rows) = max_rows {
                config.split.max_rows = max_rows;
            }
            apply_magneto_overrides(&mut config, magneto, reject_threshold, hm);
            cmd_run(&config)
        }
        Commands::Split { input, acc, mag, max_rows } => {
            if let Some(input) = input {
                config.paths.input = input;
            }
            if let Some(acc) = acc {
                config.paths.accel_split = acc;
            }
            if let Some(mag) = mag {
                config.paths.mag_split = mag;
            }
            if let Some(max_rows) = max_rows {
                config.split.max_rows = max_rows;
            }
            cmd_split(&config)
        }
        Commands::Calibrate { input, output, magneto, reject_threshold, hm } => {
            apply_magneto_overrides(&mut config, magneto, reject_threshold, hm);
            cmd_calibrate(&input, &output, &config)
        }
        Commands::InitConfig { path } => cmd_init_config(&path),
    }
}

fn cmd_run(config: &CalibrationConfig) -> Result<()> {
    let start = Instant::now();
    let tool = MagnetoTool::from_config(&config.magneto);

    println!("Preparing calibration data...");
    println!("Input: {}", config.paths.input.display());
    println!("Calibration tool: {}", tool.executable().display());

    let report = run_pipeline(config, &tool)?;

    println!("Calibration data has been processed.");
    println!("Corrected accelerometer data is in: {}", report.accel_corrected.display());
    println!("Corrected magnetometer data is in: {}", report.mag_corrected.display());

    print_summary(
        "Calibration Complete",
        &[
            ("Input file", config.paths.input.display().to_string()),
            ("Rows processed", report.rows.to_string()),
            ("Accelerometer out", report.accel_corrected.display().to_string()),
            ("Magnetometer out", report.mag_corrected.display().to_string()),
            ("Duration", format!("{:.2?}", start.elapsed())),
        ],
    );
    Ok(())
}

fn cmd_split(config: &CalibrationConfig) -> Result<()> {
    let start = Instant::now();
    let paths = &config.paths;

    let spinner = create_spinner("Splitting calibration log...");
    let result = split_calibration(
        &paths.input,
        &paths.accel_split,
        &paths.mag_split,
        config.split.max_rows,
    );
    spinner.finish_and_clear();
    let rows = result?;

    print_summary(
        "Split Complete",
        &[
            ("Input file", paths.input.display().to_string()),
            ("Accelerometer CSV", paths.accel_split.display().to_string()),
            ("Magnetometer CSV", paths.mag_split.display().to_string()),
            ("Rows kept", rows.to_string()),
            ("Max rows", config.split.max_rows.to_string()),
            ("Duration", format!("{:.2?}", start.elapsed())),
        ],
    );
    Ok(())
}

fn cmd_calibrate(input: &Path, output: &Path, config: &CalibrationConfig) -> Result<()> {
    let start = Instant::now();
    let tool = MagnetoTool::from_config(&config.magneto);
    let request = CalibrationRequest::new(input, output, &config.magneto);

    tool.calibrate(&request)
        .with_context(|| format!("Calibration of {} failed", input.display()))?;

    print_summary(
        "Calibration Complete",
        &[
            ("Input file", input.display().to_string()),
            ("Output file", output.display().to_string()),
            ("Reject threshold", request.reject_threshold.clone()),
            ("Hm", request.hm.clone()),
            ("Duration", format!("{:.2?}", start.elapsed())),
        ],
    );
    Ok(())
}

fn cmd_init_config(path: &Path) -> Result<()> {
    CalibrationConfig::default().to_yaml(path)?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("magneto-prep").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_no_subcommand_defaults_to_run() {
        let cli = parse(&[]);
        assert!(cli.command.is_none());

        let cli = parse(&["run", "--max-rows", "10", "--hm", "48"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Run { max_rows: Some(10), .. })
        ));
    }

    #[test]
    fn test_missing_config_is_fatal() {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("absent.yaml");
        let input = dir.path().join("calib.csv");
        fs::write(&input, "1,2,3,4,5,6\n").unwrap();

        let cli = parse(&[
            "--config",
            config.to_str().unwrap(),
            "split",
            "--input",
            input.to_str().unwrap(),
            "--acc",
            dir.path().join("acc.csv").to_str().unwrap(),
            "--mag",
            dir.path().join("mag.csv").to_str().unwrap(),
        ]);

        let err = dispatch(cli).unwrap_err();
        assert!(format!("{:#}", err).contains("absent.yaml"));
        assert!(!dir.path().join("acc.csv").exists());
    }

    #[test]
    fn test_default_run_uses_config_paths() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("calib.yaml");
        let mut config = CalibrationConfig::default();
        config.paths.input = dir.path().join("missing.csv");
        config.to_yaml(&config_path).unwrap();

        let cli = parse(&["--config", config_path.to_str().unwrap()]);

        let err = dispatch(cli).unwrap_err();
        assert!(format!("{:#}", err).contains("missing.csv"));
    }

    #[test]
    fn test_split_command_with_overrides() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("calib.csv");
        let acc = dir.path().join("acc.csv");
        let mag = dir.path().join("mag.csv");
        fs::write(&input, "1,2,3,4,5,6\n7,8,9,10,11,12\n").unwrap();

        let cli = parse(&[
            "split",
            "--input",
            input.to_str().unwrap(),
            "--acc",
            acc.to_str().unwrap(),
            "--mag",
            mag.to_str().unwrap(),
            "--max-rows",
            "1",
        ]);

        dispatch(cli).unwrap();
        assert_eq!(fs::read_to_string(&acc).unwrap(), "1,2,3");
        assert_eq!(fs::read_to_string(&mag).unwrap(), "4,5,6");
    }

    #[test]
    fn test_init_config_writes_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("default.yaml");

        dispatch(parse(&["init-config", path.to_str().unwrap()])).unwrap();

        let loaded = CalibrationConfig::from_yaml(&path).unwrap();
        assert_eq!(loaded, CalibrationConfig::default());
    }
}
