//! Stored document types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Document formats the text extractor understands
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// PDF document
    Pdf,
    /// Microsoft Word document (.docx)
    Docx,
    /// Plain text file
    Txt,
    /// Anything else; extracts to empty text
    Unknown,
}

impl FileType {
    /// Extensions accepted on upload
    pub const ALLOWED_EXTENSIONS: &'static [&'static str] = &[".pdf", ".docx", ".txt"];

    /// Detect file type from extension (with or without leading dot)
    pub fn from_extension(ext: &str) -> Self {
        match ext.trim_start_matches('.').to_lowercase().as_str() {
            "pdf" => Self::Pdf,
            "docx" => Self::Docx,
            "txt" | "text" => Self::Txt,
            _ => Self::Unknown,
        }
    }

    /// Detect file type from a storage path or filename
    pub fn from_path(path: &str) -> Self {
        match path.rsplit_once('.') {
            Some((_, ext)) => Self::from_extension(ext),
            None => Self::Unknown,
        }
    }

    /// Detect file type from a MIME type
    pub fn from_content_type(content_type: &str) -> Self {
        let essence = content_type.split(';').next().unwrap_or("").trim();
        match essence {
            "application/pdf" => Self::Pdf,
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => {
                Self::Docx
            }
            "text/plain" => Self::Txt,
            _ => Self::Unknown,
        }
    }

    /// Resolve the format hint for a stored document: extension first, then MIME type
    pub fn detect(path: &str, content_type: Option<&str>) -> Self {
        match Self::from_path(path) {
            Self::Unknown => content_type
                .map(Self::from_content_type)
                .unwrap_or(Self::Unknown),
            known => known,
        }
    }

    /// Check if this is a supported file type
    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unknown)
    }

    /// Get display name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Pdf => "PDF",
            Self::Docx => "Word Document (.docx)",
            Self::Txt => "Text File",
            Self::Unknown => "Unknown",
        }
    }
}

/// Metadata attached to an upload
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentMetadata {
    /// Uploader identity (email label)
    pub uploaded_by: String,
    /// Filename as provided by the uploader
    pub original_name: String,
    /// Upload timestamp, `YYYYmmdd_HHMMSS`
    pub upload_time: String,
    /// Optional free-text description or type tag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl DocumentMetadata {
    /// Flatten into the string map blob stores carry
    pub fn to_map(&self) -> HashMap<String, String> {
        let mut map = HashMap::new();
        map.insert("uploaded_by".to_string(), self.uploaded_by.clone());
        map.insert("original_name".to_string(), self.original_name.clone());
        map.insert("upload_time".to_string(), self.upload_time.clone());
        if let Some(description) = &self.description {
            map.insert("description".to_string(), description.clone());
        }
        map
    }

    /// Rebuild from a blob store's string map; missing keys become empty
    pub fn from_map(map: &HashMap<String, String>) -> Self {
        let get = |key: &str| map.get(key).cloned().unwrap_or_default();
        Self {
            uploaded_by: get("uploaded_by"),
            original_name: get("original_name"),
            upload_time: get("upload_time"),
            description: map.get("description").cloned(),
        }
    }
}

/// A document as listed by the document store. Identity is the storage path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredDocument {
    /// Storage path (e.g. `uploads/20250101_120000_policy.pdf`)
    pub path: String,
    /// Size in bytes
    pub size: u64,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// MIME type, when known
    pub content_type: Option<String>,
    /// Upload metadata, when recorded
    #[serde(default)]
    pub metadata: Option<DocumentMetadata>,
}

impl StoredDocument {
    /// Name shown to users: the path with the upload prefix removed
    pub fn display_name(&self, prefix: &str) -> String {
        self.path
            .strip_prefix(prefix)
            .unwrap_or(&self.path)
            .to_string()
    }

    /// Format hint for the text extractor
    pub fn file_type(&self) -> FileType {
        FileType::detect(&self.path, self.content_type.as_deref())
    }
}
