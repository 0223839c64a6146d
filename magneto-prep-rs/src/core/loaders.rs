//! Loader for combined accelerometer/magnetometer calibration logs.
//!
//! Each line of the log is one sample. The first three fields are the
//! accelerometer axes and the next three the magnetometer axes. Fields are
//! kept as opaque text; nothing here parses numbers.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord};
use log::debug;
use thiserror::Error;

/// Number of fields belonging to each sensor in a combined row.
pub const AXES_PER_SENSOR: usize = 3;

/// Errors that can occur while reading the input log.
#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("failed to open input file '{path}': {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read input file '{path}': {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// Result type for loader operations.
pub type Result<T> = std::result::Result<T, LoaderError>;

/// Ordered, capped set of non-blank rows read from a calibration log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CalibrationDataset {
    /// Retained rows in file order.
    pub rows: Vec<Vec<String>>,
    /// Cap that was applied while reading.
    pub max_rows: usize,
}

impl CalibrationDataset {
    /// Creates an empty dataset with the given row cap.
    pub fn new(max_rows: usize) -> Self {
        Self {
            rows: Vec::new(),
            max_rows,
        }
    }

    /// Returns the number of retained rows.
    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if no rows were retained.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns true once the cap has been reached.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.rows.len() >= self.max_rows
    }

    /// Appends a row unless it is blank or the cap is reached.
    ///
    /// Returns whether the row was retained.
    pub fn push_row(&mut self, row: Vec<String>) -> bool {
        if self.is_full() || is_blank_row(&row) {
            return false;
        }
        self.rows.push(row);
        true
    }

    /// Accelerometer records, one per retained row.
    pub fn accel_records(&self) -> Vec<&[String]> {
        self.rows.iter().map(|row| accel_slice(row)).collect()
    }

    /// Magnetometer records, one per retained row.
    pub fn mag_records(&self) -> Vec<&[String]> {
        self.rows.iter().map(|row| mag_slice(row)).collect()
    }
}

/// First three fields of a row, or fewer if the row is short.
pub fn accel_slice(row: &[String]) -> &[String] {
    &row[..row.len().min(AXES_PER_SENSOR)]
}

/// Fields 3..6 of a row. Short rows give a shorter (possibly empty) slice.
pub fn mag_slice(row: &[String]) -> &[String] {
    let start = row.len().min(AXES_PER_SENSOR);
    let end = row.len().min(2 * AXES_PER_SENSOR);
    &row[start..end]
}

/// A row is blank when every field is empty after trimming.
pub fn is_blank_row<S: AsRef<str>>(row: &[S]) -> bool {
    row.iter().all(|field| field.as_ref().trim().is_empty())
}

/// Position of a byte relative to CSV field boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldState {
    /// Start of a line or just after a delimiter.
    Start,
    Unquoted,
    Quoted,
    /// A quote seen inside a quoted field: either the closing quote or the
    /// first half of an escaped `""`.
    QuoteInQuoted,
}

/// Reader adapter that drops spaces at the start of every field.
///
/// The spaces are removed before the CSV parser sees them, so a field such
/// as ` "2,5"` is still recognised as quoted. Spaces inside quotes and
/// anywhere after the first non-space byte of a field are kept.
pub struct SkipInitialSpace<R> {
    inner: R,
    state: FieldState,
}

impl<R: Read> SkipInitialSpace<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            state: FieldState::Start,
        }
    }

    /// Advance the state machine by one byte; returns whether to keep it.
    fn keep(&mut self, byte: u8) -> bool {
        use FieldState::*;

        let is_boundary = matches!(byte, b',' | b'\n' | b'\r');
        self.state = match (self.state, byte) {
            (Start, b' ') => return false,
            (Start, b'"') => Quoted,
            (Quoted, b'"') => QuoteInQuoted,
            (Quoted, _) => Quoted,
            (QuoteInQuoted, b'"') => Quoted,
            (_, _) if is_boundary => Start,
            _ => Unquoted,
        };
        true
    }
}

impl<R: Read> Read for SkipInitialSpace<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            let n = self.inner.read(buf)?;
            if n == 0 {
                return Ok(0);
            }
            let mut kept = 0;
            for i in 0..n {
                let byte = buf[i];
                if self.keep(byte) {
                    buf[kept] = byte;
                    kept += 1;
                }
            }
            // A chunk made only of dropped spaces is not end of input.
            if kept > 0 {
                return Ok(kept);
            }
        }
    }
}

/// Load up to `max_rows` non-blank rows from a headerless calibration CSV.
///
/// Reading stops as soon as the cap is reached, so later lines are never
/// parsed. Rows of any length are accepted.
///
/// # Arguments
///
/// * `path` - Path to the combined calibration log
/// * `max_rows` - Maximum number of non-blank rows to retain
///
/// # Errors
///
/// Returns an error if the file cannot be opened or a record cannot be read
/// (for example, invalid UTF-8).
pub fn load_calibration_csv<P: AsRef<Path>>(path: P, max_rows: usize) -> Result<CalibrationDataset> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| LoaderError::Open {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(SkipInitialSpace::new(BufReader::new(file)));

    let mut dataset = CalibrationDataset::new(max_rows);
    let mut record = StringRecord::new();
    let mut skipped = 0usize;

    while !dataset.is_full() {
        let more = reader.read_record(&mut record).map_err(|e| LoaderError::Csv {
            path: path.to_path_buf(),
            source: e,
        })?;
        if !more {
            break;
        }
        let row: Vec<String> = record.iter().map(str::to_string).collect();
        if !dataset.push_row(row) {
            skipped += 1;
        }
    }

    debug!(
        "Loaded {} rows from {} ({} blank rows skipped)",
        dataset.len(),
        path.display(),
        skipped
    );

    Ok(dataset)
}
