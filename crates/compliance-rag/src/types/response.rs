//! Response types for the query and file endpoints

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::retrieval::ContextMode;

/// Outcome of one query pipeline run. Never persisted.
#[derive(Debug, Clone)]
pub struct QueryResult {
    /// Request id used in logs
    pub request_id: Uuid,
    /// Internal compliance section
    pub compliance_summary: String,
    /// Customer-facing section; never empty
    pub customer_answer: String,
    /// Display names of the documents actually placed in the prompt, in prompt order
    pub sources: Vec<String>,
    /// Whether semantic retrieval supplied the context
    pub used_retrieval: bool,
    /// How the context block was produced
    pub context_mode: ContextMode,
    /// Whether the no-context fallback generation was used
    pub used_fallback: bool,
    /// Whether the model output carried both section labels
    pub parsed_ok: bool,
    /// Requester email label
    pub requested_by: String,
    /// Completion time
    pub timestamp: DateTime<Utc>,
}

/// JSON body returned by the query endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    /// Internal compliance section
    pub compliance_summary: String,
    /// Customer-facing section
    pub customer_answer: String,
    /// Source documents used
    pub sources: Vec<String>,
    /// Whether semantic retrieval supplied the context
    pub used_retrieval: bool,
    /// False when the answer needs human review
    pub parsed_ok: bool,
    /// Requester email label
    pub user: String,
    /// Number of sources used
    pub documents_used: usize,
    /// RFC 3339 completion time
    pub timestamp: DateTime<Utc>,
}

impl From<QueryResult> for QueryResponse {
    fn from(result: QueryResult) -> Self {
        Self {
            documents_used: result.sources.len(),
            compliance_summary: result.compliance_summary,
            customer_answer: result.customer_answer,
            sources: result.sources,
            used_retrieval: result.used_retrieval,
            parsed_ok: result.parsed_ok,
            user: result.requested_by,
            timestamp: result.timestamp,
        }
    }
}

/// One entry of the file listing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    /// Name with the upload prefix removed
    pub name: String,
    /// Size in bytes
    pub size: u64,
    /// Creation time
    pub created: DateTime<Utc>,
    /// MIME type
    pub content_type: Option<String>,
}

/// Response for listing files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileListResponse {
    /// Files under the upload prefix
    pub files: Vec<FileInfo>,
    /// Total count
    pub count: usize,
}

/// Response for a successful upload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub success: bool,
    /// Stored filename (timestamp-prefixed)
    pub filename: String,
    /// Storage URI of the object
    pub uri: String,
    pub uploaded_by: String,
    /// Upload timestamp, `YYYYmmdd_HHMMSS`
    pub timestamp: String,
}

/// Response for a successful delete
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
    pub deleted_by: String,
}
