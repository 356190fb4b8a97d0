//! Error types for the KeePass CSV importer

use thiserror::Error;

/// Main error type for import operations
#[derive(Error, Debug)]
pub enum ImportError {
    /// `--columns` was not given at all
    #[error("No columns specified. Use --columns to specify columns.")]
    NoColumns,

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// CSV input could not be read
    #[error("CSV error: {0}")]
    CsvError(String),

    /// XML input could not be turned into a document at all
    #[error("XML error: {0}")]
    XmlError(String),

    /// Invalid operation
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvError(err.to_string())
    }
}

impl From<quick_xml::Error> for ImportError {
    fn from(err: quick_xml::Error) -> Self {
        ImportError::XmlError(err.to_string())
    }
}

/// Result type alias for import operations
pub type Result<T> = std::result::Result<T, ImportError>;
