//! Split a combined calibration log into per-sensor files.

use std::path::Path;

use log::info;
use thiserror::Error;

use crate::core::loaders::{load_calibration_csv, LoaderError};
use crate::core::writers::{write_records_csv, WriteError};

/// Errors that can occur while splitting.
#[derive(Debug, Error)]
pub enum SplitError {
    #[error(transparent)]
    Load(#[from] LoaderError),

    #[error(transparent)]
    Write(#[from] WriteError),
}

/// Split the combined log at `input` into accelerometer and magnetometer files.
///
/// Keeps the first `max_rows` non-blank rows. For each kept row, fields 0..3
/// go to `accel_out` and fields 3..6 go to `mag_out`; short rows produce
/// short (or empty) records rather than an error. Both outputs are always
/// written, even when no rows were kept.
///
/// # Returns
///
/// The number of rows kept.
pub fn split_calibration(
    input: &Path,
    accel_out: &Path,
    mag_out: &Path,
    max_rows: usize,
) -> Result<usize, SplitError> {
    let dataset = load_calibration_csv(input, max_rows)?;

    write_records_csv(accel_out, &dataset.accel_records())?;
    write_records_csv(mag_out, &dataset.mag_records())?;

    info!(
        "Split {} rows from {} into {} and {}",
        dataset.len(),
        input.display(),
        accel_out.display(),
        mag_out.display()
    );
    println!("Processed {} rows (maximum {} rows).", dataset.len(), max_rows);

    Ok(dataset.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        input: PathBuf,
        acc: PathBuf,
        mag: PathBuf,
    }

    fn fixture(content: &str) -> Fixture {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("calib.csv");
        fs::write(&input, content).unwrap();
        Fixture {
            input,
            acc: dir.path().join("out_acc.csv"),
            mag: dir.path().join("out_mag.csv"),
            _dir: dir,
        }
    }

    #[test]
    fn test_split_basic_example() {
        let f = fixture("1,2,3,4,5,6\n\n7,8,9,10,11,12\n");

        let count = split_calibration(&f.input, &f.acc, &f.mag, 300).unwrap();

        assert_eq!(count, 2);
        assert_eq!(fs::read_to_string(&f.acc).unwrap(), "1,2,3\n7,8,9");
        assert_eq!(fs::read_to_string(&f.mag).unwrap(), "4,5,6\n10,11,12");
    }

    #[test]
    fn test_split_empty_input() {
        let f = fixture("");

        let count = split_calibration(&f.input, &f.acc, &f.mag, 300).unwrap();

        assert_eq!(count, 0);
        assert_eq!(fs::metadata(&f.acc).unwrap().len(), 0);
        assert_eq!(fs::metadata(&f.mag).unwrap().len(), 0);
    }

    #[test]
    fn test_split_blank_rows_anywhere() {
        let f = fixture(",,,\n1,2,3,4,5,6\n  \n , , , , , \n7,8,9,10,11,12\n,,\n");

        let count = split_calibration(&f.input, &f.acc, &f.mag, 300).unwrap();

        assert_eq!(count, 2);
        assert_eq!(fs::read_to_string(&f.acc).unwrap(), "1,2,3\n7,8,9");
    }

    #[test]
    fn test_split_caps_rows_in_order() {
        let content: String = (0..500)
            .map(|i| format!("a{i},b{i},c{i},d{i},e{i},f{i}\n"))
            .collect();
        let f = fixture(&content);

        let count = split_calibration(&f.input, &f.acc, &f.mag, 300).unwrap();
        assert_eq!(count, 300);

        let acc = fs::read_to_string(&f.acc).unwrap();
        let lines: Vec<&str> = acc.split('\n').collect();
        assert_eq!(lines.len(), 300);
        assert_eq!(lines[0], "a0,b0,c0");
        assert_eq!(lines[299], "a299,b299,c299");
        assert!(!acc.ends_with('\n'));

        let mag = fs::read_to_string(&f.mag).unwrap();
        assert_eq!(mag.split('\n').count(), 300);
        assert!(mag.ends_with("d299,e299,f299"));
    }

    #[test]
    fn test_split_four_field_row() {
        let f = fixture("1,2,3,4\n");

        split_calibration(&f.input, &f.acc, &f.mag, 300).unwrap();

        assert_eq!(fs::read_to_string(&f.acc).unwrap(), "1,2,3");
        assert_eq!(fs::read_to_string(&f.mag).unwrap(), "4");
    }

    #[test]
    fn test_split_extra_columns_dropped() {
        let f = fixture("1,2,3,4,5,6,99,100\n");

        split_calibration(&f.input, &f.acc, &f.mag, 300).unwrap();

        assert_eq!(fs::read_to_string(&f.mag).unwrap(), "4,5,6");
    }

    #[test]
    fn test_split_is_idempotent() {
        let f = fixture("1, 2, 3, 4, 5, 6\n7,8\n9,10,11,12,13,14\n");

        split_calibration(&f.input, &f.acc, &f.mag, 300).unwrap();
        let acc_first = fs::read(&f.acc).unwrap();
        let mag_first = fs::read(&f.mag).unwrap();

        split_calibration(&f.input, &f.acc, &f.mag, 300).unwrap();
        assert_eq!(fs::read(&f.acc).unwrap(), acc_first);
        assert_eq!(fs::read(&f.mag).unwrap(), mag_first);
    }

    #[test]
    fn test_split_missing_input() {
        let dir = TempDir::new().unwrap();
        let result = split_calibration(
            &dir.path().join("missing.csv"),
            &dir.path().join("acc.csv"),
            &dir.path().join("mag.csv"),
            300,
        );

        assert!(matches!(result, Err(SplitError::Load(_))));
        assert!(!dir.path().join("acc.csv").exists());
    }

    #[test]
    fn test_split_unwritable_output() {
        let f = fixture("1,2,3,4,5,6\n");
        let dir_as_file = f.input.parent().unwrap().to_path_buf();

        let result = split_calibration(&f.input, &dir_as_file, &f.mag, 300);

        assert!(matches!(result, Err(SplitError::Write(_))));
    }

    #[test]
    fn test_split_missing_output_directory() {
        let f = fixture("1,2,3,4,5,6\n");
        let missing = f.input.parent().unwrap().join("absent");

        let result = split_calibration(&f.input, &missing.join("acc.csv"), &f.mag, 300);

        assert!(matches!(result, Err(SplitError::Write(WriteError::CreateFile { .. }))));
        assert!(!missing.exists());
    }

    #[test]
    fn test_split_quoted_field_after_space() {
        let f = fixture("1, \"2,5\", 3,4,5,6\n");

        split_calibration(&f.input, &f.acc, &f.mag, 300).unwrap();

        assert_eq!(fs::read_to_string(&f.acc).unwrap(), "1,\"2,5\",3");
        assert_eq!(fs::read_to_string(&f.mag).unwrap(), "4,5,6");
    }
}
