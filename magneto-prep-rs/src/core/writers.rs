//! Writers for per-sensor calibration CSV files.
//!
//! The calibration tool reads these files back line by line, so the layout is
//! exact: comma separated fields, records separated by a single `\n`, and no
//! terminator after the last record. An empty record set produces a
//! zero-byte file. Output directories are not created; a missing one is an
//! error.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use csv::{QuoteStyle, Terminator, WriterBuilder};
use thiserror::Error;

/// Separator placed between records.
const RECORD_SEPARATOR: u8 = b'\n';

/// Errors that can occur during write operations.
#[derive(Error, Debug)]
pub enum WriteError {
    /// Failed to create or open file for writing.
    #[error("failed to create file '{path}': {source}")]
    CreateFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write data to file.
    #[error("failed to write to file '{path}': {source}")]
    WriteFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// CSV encoding error.
    #[error("CSV write error for '{path}': {source}")]
    CsvError {
        path: String,
        #[source]
        source: csv::Error,
    },
}

/// Result type for write operations.
pub type Result<T> = std::result::Result<T, WriteError>;

/// Creates a buffered writer for the given path.
fn create_buffered_writer(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path).map_err(|e| WriteError::CreateFile {
        path: path.display().to_string(),
        source: e,
    })?;
    Ok(BufWriter::new(file))
}

/// Whether a field has to be quoted: it holds a delimiter, a quote or the
/// record separator. A bare `\r` is written as is.
fn needs_quotes(field: &str) -> bool {
    field
        .bytes()
        .any(|b| b == b',' || b == b'"' || b == RECORD_SEPARATOR)
}

/// Encode a single field, quoting and escaping only when required.
fn encode_field(field: &str, out: &mut Vec<u8>) -> std::result::Result<(), csv::Error> {
    if !needs_quotes(field) {
        out.extend_from_slice(field.as_bytes());
        return Ok(());
    }

    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(RECORD_SEPARATOR))
        .from_writer(Vec::with_capacity(field.len() + 3));
    writer.write_record([field])?;
    let mut quoted = writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))?;
    if quoted.last() == Some(&RECORD_SEPARATOR) {
        quoted.pop();
    }
    out.extend_from_slice(&quoted);
    Ok(())
}

/// Encode one record as a single CSV line without its terminator.
///
/// A record made of one empty field is written as `""` so it stays
/// distinguishable from a zero-field record, which encodes to an empty line.
pub fn encode_record(fields: &[String]) -> std::result::Result<Vec<u8>, csv::Error> {
    match fields {
        [] => return Ok(Vec::new()),
        [only] if only.is_empty() => return Ok(b"\"\"".to_vec()),
        _ => {}
    }

    let mut line = Vec::with_capacity(fields.iter().map(|f| f.len() + 1).sum());
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            line.push(b',');
        }
        encode_field(field, &mut line)?;
    }
    Ok(line)
}

/// Encode records into the exact on-disk byte layout.
pub fn encode_records<R: AsRef<[String]>>(records: &[R]) -> std::result::Result<Vec<u8>, csv::Error> {
    let mut out = Vec::with_capacity(records.len() * 32);
    for (i, record) in records.iter().enumerate() {
        if i > 0 {
            out.push(RECORD_SEPARATOR);
        }
        out.extend_from_slice(&encode_record(record.as_ref())?);
    }
    Ok(out)
}

/// Write records to a CSV file with no trailing newline.
///
/// # Arguments
///
/// * `path` - Output file path (its directory must already exist)
/// * `records` - Records in output order; each may have any number of fields
///
/// # Errors
///
/// Returns an error if:
/// - The parent directory is missing
/// - File cannot be created or written to
///
/// # Example
///
/// ```no_run
/// use magneto_prep::core::writers::write_records_csv;
/// use std::path::Path;
///
/// let records = vec![vec!["1".to_string(), "2".to_string(), "3".to_string()]];
/// write_records_csv(Path::new("out_acc.csv"), &records).unwrap();
/// ```
pub fn write_records_csv<R: AsRef<[String]>>(path: &Path, records: &[R]) -> Result<()> {
    let path_str = path.display().to_string();

    let bytes = encode_records(records).map_err(|e| WriteError::CsvError {
        path: path_str.clone(),
        source: e,
    })?;

    let mut writer = create_buffered_writer(path)?;

    writer.write_all(&bytes).map_err(|e| WriteError::WriteFile {
        path: path_str.clone(),
        source: e,
    })?;
    writer.flush().map_err(|e| WriteError::WriteFile {
        path: path_str,
        source: e,
    })?;

    Ok(())
}
