/// Uploaded files: name, raw bytes and the extension that decides the codec.
use crate::error::{Result, SweepError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tabular encodings accepted on upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    Csv,
    Xlsx,
}

impl FileFormat {
    /// Detect the format from a lower-cased extension such as `.csv`.
    pub fn from_extension(ext: &str) -> Result<Self> {
        match ext.to_ascii_lowercase().as_str() {
            ".csv" => Ok(FileFormat::Csv),
            ".xlsx" => Ok(FileFormat::Xlsx),
            _ => Err(SweepError::UnsupportedExtension(ext.to_string())),
        }
    }
}

/// A file handed to the sweeper. Lives in memory only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        UploadedFile {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Lower-cased extension with its leading dot, or an empty string.
    ///
    /// ```
    /// use datasweeper::UploadedFile;
    ///
    /// assert_eq!(UploadedFile::new("Sales.CSV", "").extension(), ".csv");
    /// assert_eq!(UploadedFile::new("notes", "").extension(), "");
    /// assert_eq!(UploadedFile::new(".hidden", "").extension(), "");
    /// ```
    pub fn extension(&self) -> String {
        Path::new(&self.name)
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
            .unwrap_or_default()
    }

    pub fn format(&self) -> Result<FileFormat> {
        FileFormat::from_extension(&self.extension())
    }
}

/// Human-readable size: bytes below 1 KiB, otherwise KB/MB/GB with two decimals.
///
/// ```
/// use datasweeper::format_file_size;
///
/// assert_eq!(format_file_size(500), "500 B");
/// assert_eq!(format_file_size(2048), "2.00 KB");
/// ```
pub fn format_file_size(size_in_bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size_in_bytes < KB {
        format!("{} B", size_in_bytes)
    } else if size_in_bytes < MB {
        format!("{:.2} KB", size_in_bytes as f64 / KB as f64)
    } else if size_in_bytes < GB {
        format!("{:.2} MB", size_in_bytes as f64 / MB as f64)
    } else {
        format!("{:.2} GB", size_in_bytes as f64 / GB as f64)
    }
}
