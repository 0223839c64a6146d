//! Core data types and I/O operations.

pub mod loaders;
pub mod writers;

pub use loaders::{load_calibration_csv, CalibrationDataset, LoaderError};
pub use writers::{write_records_csv, WriteError};
