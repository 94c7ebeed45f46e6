/// Error type shared by ingestion, cleaning, conversion and the HTTP layer.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SweepError {
    #[error("Unsupported file type: {0}")]
    UnsupportedExtension(String),

    #[error("Failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to read spreadsheet: {0}")]
    Spreadsheet(#[from] calamine::XlsxError),

    #[error("Failed to write spreadsheet: {0}")]
    Workbook(#[from] rust_xlsxwriter::XlsxError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed table: {0}")]
    Malformed(String),

    #[error("No columns to parse from file")]
    EmptyFile,

    #[error("Column '{0}' not found")]
    UnknownColumn(String),

    #[error("{0}")]
    Table(String),

    #[error("No columns selected")]
    NoColumns,

    #[error("Failed to render chart: {0}")]
    Chart(String),

    #[error("File {0} is not part of this session")]
    FileNotFound(u64),

    #[error("Invalid upload '{name}': {reason}")]
    InvalidUpload { name: String, reason: String },

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl From<String> for SweepError {
    fn from(message: String) -> Self {
        SweepError::Table(message)
    }
}

pub type Result<T> = std::result::Result<T, SweepError>;
