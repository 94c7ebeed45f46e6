/// Request and response bodies for the HTTP API
use crate::error::{Result, SweepError};
use crate::export::OutputFormat;
use crate::sweep::{FileInfo, Rejection, SweepOptions};
use crate::upload::{FileFormat, UploadedFile};
use base64::prelude::BASE64_STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// Batch of files sent by the browser
#[derive(Debug, Deserialize)]
pub struct UploadRequest {
    pub files: Vec<UploadPayload>,
}

/// One file: its name and base64-encoded contents
#[derive(Debug, Deserialize)]
pub struct UploadPayload {
    pub name: String,
    pub data: String,
}

impl UploadPayload {
    /// Decode the payload. A data URL prefix (`data:...;base64,`) is accepted.
    pub fn decode(self) -> Result<UploadedFile> {
        let encoded = match self.data.split_once(";base64,") {
            Some((prefix, rest)) if prefix.starts_with("data:") => rest,
            _ => self.data.as_str(),
        };
        let bytes = BASE64_STANDARD
            .decode(encoded.trim())
            .map_err(|e| SweepError::InvalidUpload {
                name: self.name.clone(),
                reason: e.to_string(),
            })?;
        Ok(UploadedFile::new(self.name, bytes))
    }
}

/// A file held by the session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileSummary {
    pub id: u64,
    pub name: String,
    pub size: u64,
    pub size_label: String,
    pub format: FileFormat,
}

impl FileSummary {
    pub fn new(id: u64, info: &FileInfo) -> Self {
        FileSummary {
            id,
            name: info.name.clone(),
            size: info.size,
            size_label: info.size_label.clone(),
            format: info.format,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub accepted: Vec<FileSummary>,
    pub rejected: Vec<Rejection>,
}

#[derive(Debug, Serialize)]
pub struct FileList {
    pub files: Vec<FileSummary>,
}

/// Pipeline options plus the target format
#[derive(Debug, Deserialize)]
pub struct ConvertRequest {
    #[serde(flatten)]
    pub options: SweepOptions,
    pub format: OutputFormat,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_payload() {
        let payload = UploadPayload {
            name: "a.csv".to_string(),
            data: BASE64_STANDARD.encode("x,y\n1,2\n"),
        };
        let file = payload.decode().unwrap();
        assert_eq!(file.name, "a.csv");
        assert_eq!(file.bytes, b"x,y\n1,2\n");
    }

    #[test]
    fn test_decode_data_url() {
        let payload = UploadPayload {
            name: "a.csv".to_string(),
            data: format!("data:text/csv;base64,{}", BASE64_STANDARD.encode("x\n1\n")),
        };
        assert_eq!(payload.decode().unwrap().bytes, b"x\n1\n");
    }

    #[test]
    fn test_decode_invalid() {
        let payload = UploadPayload {
            name: "bad.csv".to_string(),
            data: "not base64!".to_string(),
        };
        let err = payload.decode().unwrap_err();
        assert!(matches!(err, SweepError::InvalidUpload { name, .. } if name == "bad.csv"));
    }

    #[test]
    fn test_convert_request() {
        let request: ConvertRequest = serde_json::from_value(json!({
            "remove_duplicates": true,
            "columns": ["a", "b"],
            "format": "excel"
        }))
        .unwrap();
        assert!(request.options.remove_duplicates);
        assert!(!request.options.fill_missing);
        assert_eq!(request.options.columns, Some(vec!["a".to_string(), "b".to_string()]));
        assert_eq!(request.format, OutputFormat::Excel);
    }
}
