//! CSV export of ranked records.

mod csv_writer;
mod path;

pub use csv_writer::{columns, record_row, write_records, WriteMode};
pub use path::{safe_filename, OutputCategory, OutputPlan};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Cannot append to {path}: existing header does not match ({found})")]
    HeaderMismatch { path: String, found: String },
}
