//! Supporting documents attached to a record

use crate::model::row::RowId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;

pub const DEFAULT_STORAGE_TYPE: &str = "LOCAL";

/// One uploaded document as listed by the document service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct DocumentEntry {
    pub id: Option<i64>,
    #[serde(alias = "documentName", alias = "originalFileName")]
    pub file_name: Option<String>,
    pub module: Option<String>,
    pub record_id: Option<i64>,
    pub storage_type: Option<String>,
    pub file_size: Option<u64>,
    #[serde(alias = "uploadDate", alias = "createdDate")]
    pub uploaded_at: Option<DateTime<Utc>>,
}

impl DocumentEntry {
    /// Lenient decode; unknown shapes become an empty entry
    pub fn from_value(value: &Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or_default()
    }

    pub fn display_name(&self) -> String {
        match (&self.file_name, self.id) {
            (Some(name), _) if !name.trim().is_empty() => name.clone(),
            (_, Some(id)) => format!("document #{}", id),
            _ => "unnamed document".to_string(),
        }
    }

    pub fn uploaded_display(&self) -> String {
        self.uploaded_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string())
    }
}

/// A pending multipart upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentUpload {
    pub module: String,
    pub record_id: RowId,
    pub storage_type: String,
    pub path: PathBuf,
}

impl DocumentUpload {
    pub fn new(module: &str, record_id: RowId, path: impl Into<PathBuf>) -> Self {
        Self {
            module: module.to_string(),
            record_id,
            storage_type: DEFAULT_STORAGE_TYPE.to_string(),
            path: path.into(),
        }
    }

    /// File name sent in the multipart part
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "upload".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entry_decodes_aliases() {
        let entry = DocumentEntry::from_value(&json!({
            "id": 3,
            "documentName": "deed.pdf",
            "module": "ESCROW_AGREEMENT",
            "recordId": 12,
            "uploadDate": "2024-05-01T10:30:00Z"
        }));
        assert_eq!(entry.display_name(), "deed.pdf");
        assert_eq!(entry.record_id, Some(12));
        assert_eq!(entry.uploaded_display(), "2024-05-01 10:30");
    }

    #[test]
    fn test_entry_tolerates_garbage() {
        let entry = DocumentEntry::from_value(&json!("nope"));
        assert_eq!(entry, DocumentEntry::default());
        assert_eq!(entry.display_name(), "unnamed document");
        assert_eq!(entry.uploaded_display(), "-");
    }

    #[test]
    fn test_upload_file_name() {
        let upload = DocumentUpload::new("PARTY", 4, "/tmp/docs/passport.png");
        assert_eq!(upload.file_name(), "passport.png");
        assert_eq!(upload.storage_type, "LOCAL");
    }
}
