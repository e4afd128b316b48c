//! Error types for ip2l.

use std::path::PathBuf;
use thiserror::Error;

/// Error type for ip2l operations.
///
/// Only load-time failures are errors. Conditions found while answering a
/// query are reported through [`crate::Status`] instead.
#[derive(Error, Debug)]
pub enum Error {
    /// No database path was given
    #[error("must specify path to database")]
    MissingPath,

    /// File is shorter than the fixed header
    #[error("invalid header size: expected at least {expected} bytes, got {actual}")]
    HeaderTooShort { expected: usize, actual: usize },

    /// File starts with a ZIP signature
    #[error("database is a ZIP archive; decompress it before loading")]
    CompressedDatabase,

    /// Product code does not match a current BIN release
    #[error(
        "incorrect BIN file format (product code {product_code}, year {year}); \
         use the latest IP2Location BIN file"
    )]
    IncorrectFormat { product_code: u8, year: u8 },

    /// Schema variant not known to the column layout table
    #[error("unsupported database type: {0}")]
    UnsupportedDatabaseType(u8),

    /// Index table runs past the end of the file
    #[error("index table at offset {offset} is truncated")]
    TruncatedIndex { offset: u32 },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// CSV side table is missing required columns
    #[error("CSV database {path:?} does not have expected headings: missing {missing:?}")]
    MissingCsvHeaders { path: PathBuf, missing: Vec<String> },

    /// File watcher error
    #[error("file watch error: {0}")]
    Watch(#[from] notify::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type alias for ip2l operations.
pub type Result<T> = std::result::Result<T, Error>;
