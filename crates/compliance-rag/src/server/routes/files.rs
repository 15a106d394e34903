//! Knowledge base file endpoints

use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use bytes::Bytes;
use chrono::Utc;

use super::AuthenticatedUser;
use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::{
    response::{DeleteResponse, FileInfo, FileListResponse, UploadResponse},
    DocumentMetadata, FileType,
};

/// File part of an upload form
struct UploadedFile {
    filename: String,
    data: Bytes,
}

/// Strip any client-supplied directories from an upload filename
fn base_name(filename: &str) -> &str {
    filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename)
        .trim()
}

/// Whether the filename carries one of the accepted upload extensions
fn is_allowed_upload(filename: &str) -> bool {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| format!(".{}", ext.to_lowercase()))
        .is_some_and(|ext| FileType::ALLOWED_EXTENSIONS.contains(&ext.as_str()))
}

/// POST /upload - Add a document to the knowledge base
pub async fn upload_file(
    AuthenticatedUser(user): AuthenticatedUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    let mut file: Option<UploadedFile> = None;
    let mut description: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::invalid_input(format!("Failed to read multipart field: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or("").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| Error::invalid_input(format!("Failed to read file: {}", e)))?;
                file = Some(UploadedFile { filename, data });
            }
            "description" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| Error::invalid_input(format!("Failed to read description: {}", e)))?;
                description = Some(text).filter(|d| !d.trim().is_empty());
            }
            _ => {}
        }
    }

    let file = file.ok_or_else(|| Error::invalid_input("No file provided"))?;
    let original_name = base_name(&file.filename).to_string();
    if original_name.is_empty() {
        return Err(Error::invalid_input("No file selected"));
    }
    if !is_allowed_upload(&original_name) {
        return Err(Error::UnsupportedFileType(format!(
            "Unsupported file type. Allowed: {}",
            FileType::ALLOWED_EXTENSIONS.join(", ")
        )));
    }

    let timestamp = Utc::now().format("%Y%m%d_%H%M%S").to_string();
    let filename = format!("{}_{}", timestamp, original_name);
    let path = format!("{}{}", state.upload_prefix(), filename);

    let metadata = DocumentMetadata {
        uploaded_by: user.label().to_string(),
        original_name,
        upload_time: timestamp.clone(),
        description,
    };

    let uri = state.store().put(&path, &file.data, &metadata).await?;

    tracing::info!(
        "Uploaded {} ({} bytes) by {}",
        path,
        file.data.len(),
        user.label()
    );

    Ok(Json(UploadResponse {
        success: true,
        filename,
        uri,
        uploaded_by: user.label().to_string(),
        timestamp,
    }))
}

/// GET /files - List uploaded documents
pub async fn list_files(
    AuthenticatedUser(_user): AuthenticatedUser,
    State(state): State<AppState>,
) -> Result<Json<FileListResponse>> {
    let prefix = state.upload_prefix();
    let files: Vec<FileInfo> = state
        .store()
        .list(prefix)
        .await?
        .into_iter()
        .map(|doc| FileInfo {
            name: doc.display_name(prefix),
            size: doc.size,
            created: doc.created_at,
            content_type: doc.content_type,
        })
        .collect();

    Ok(Json(FileListResponse {
        count: files.len(),
        files,
    }))
}

/// DELETE /files/:filename - Remove an uploaded document
pub async fn delete_file(
    AuthenticatedUser(user): AuthenticatedUser,
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Json<DeleteResponse>> {
    if filename.is_empty() || base_name(&filename) != filename || filename.starts_with('.') {
        return Err(Error::invalid_input(format!("Invalid filename: {}", filename)));
    }

    let path = format!("{}{}", state.upload_prefix(), filename);
    state.store().delete(&path).await?;

    tracing::info!("Deleted {} by {}", path, user.label());

    Ok(Json(DeleteResponse {
        success: true,
        message: format!("Deleted {}", filename),
        deleted_by: user.label().to_string(),
    }))
}
