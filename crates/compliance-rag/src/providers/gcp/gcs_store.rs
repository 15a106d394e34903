//! Google Cloud Storage document store
//!
//! Uploads are stored as objects named by their storage path, with upload
//! metadata in the object's custom metadata map.

use async_trait::async_trait;

use google_cloud_storage::client::Client as GcsClient;
use google_cloud_storage::http::buckets::get::GetBucketRequest;
use google_cloud_storage::http::buckets::insert::{
    BucketCreationConfig, InsertBucketParam, InsertBucketRequest,
};
use google_cloud_storage::http::objects::delete::DeleteObjectRequest;
use google_cloud_storage::http::objects::download::Range;
use google_cloud_storage::http::objects::get::GetObjectRequest;
use google_cloud_storage::http::objects::list::ListObjectsRequest;
use google_cloud_storage::http::objects::upload::{UploadObjectRequest, UploadType};
use google_cloud_storage::http::objects::Object;
use google_cloud_storage::http::Error as GcsError;

use crate::error::{Error, Result};
use crate::providers::document_store::DocumentStoreProvider;
use crate::types::{DocumentMetadata, StoredDocument};

/// Google Cloud Storage document store
pub struct GcsDocumentStore {
    client: GcsClient,
    bucket: String,
}

impl GcsDocumentStore {
    /// Create a new GCS document store using application default credentials
    pub async fn new(bucket: String) -> Result<Self> {
        let config = google_cloud_storage::client::ClientConfig::default()
            .with_auth()
            .await
            .map_err(|e| Error::Config(format!("Failed to create GCS client: {}", e)))?;

        Ok(Self {
            client: GcsClient::new(config),
            bucket,
        })
    }

    /// Make sure the bucket exists, creating it in `location` if needed
    pub async fn ensure_bucket(&self, project_id: &str, location: &str) -> Result<()> {
        let existing = self
            .client
            .get_bucket(&GetBucketRequest {
                bucket: self.bucket.clone(),
                ..Default::default()
            })
            .await;

        match existing {
            Ok(_) => Ok(()),
            Err(e) if is_not_found(&e) => {
                tracing::info!("Creating bucket {} in {}", self.bucket, location);
                self.client
                    .insert_bucket(&InsertBucketRequest {
                        name: self.bucket.clone(),
                        param: InsertBucketParam {
                            project: project_id.to_string(),
                            ..Default::default()
                        },
                        bucket: BucketCreationConfig {
                            location: location.to_string(),
                            ..Default::default()
                        },
                    })
                    .await
                    .map(|_| ())
                    .map_err(|e| Error::storage(format!("Failed to create bucket: {}", e)))
            }
            Err(e) => Err(Error::storage(format!("Failed to access bucket: {}", e))),
        }
    }

    fn gcs_uri(&self, path: &str) -> String {
        format!("gs://{}/{}", self.bucket, path)
    }

    fn to_stored_document(object: Object) -> StoredDocument {
        let created_at = object
            .time_created
            .and_then(|t| chrono::DateTime::from_timestamp(t.unix_timestamp(), t.nanosecond()))
            .unwrap_or_default();

        StoredDocument {
            size: object.size.max(0) as u64,
            created_at,
            content_type: object.content_type,
            metadata: object.metadata.as_ref().map(DocumentMetadata::from_map),
            path: object.name,
        }
    }
}

fn is_not_found(error: &GcsError) -> bool {
    matches!(error, GcsError::Response(response) if response.code == 404)
}

#[async_trait]
impl DocumentStoreProvider for GcsDocumentStore {
    async fn put(&self, path: &str, data: &[u8], metadata: &DocumentMetadata) -> Result<String> {
        let content_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .to_string();

        let upload_type = UploadType::Multipart(Box::new(Object {
            name: path.to_string(),
            content_type: Some(content_type),
            metadata: Some(metadata.to_map()),
            ..Default::default()
        }));

        self.client
            .upload_object(
                &UploadObjectRequest {
                    bucket: self.bucket.clone(),
                    ..Default::default()
                },
                data.to_vec(),
                &upload_type,
            )
            .await
            .map_err(|e| Error::storage(format!("Failed to upload to GCS: {}", e)))?;

        Ok(self.gcs_uri(path))
    }

    async fn get(&self, path: &str) -> Result<Vec<u8>> {
        self.client
            .download_object(
                &GetObjectRequest {
                    bucket: self.bucket.clone(),
                    object: path.to_string(),
                    ..Default::default()
                },
                &Range::default(),
            )
            .await
            .map_err(|e| {
                if is_not_found(&e) {
                    Error::DocumentNotFound(path.to_string())
                } else {
                    Error::storage(format!("Failed to download from GCS: {}", e))
                }
            })
    }

    async fn list(&self, prefix: &str) -> Result<Vec<StoredDocument>> {
        let mut docs = Vec::new();
        let mut page_token = None;

        loop {
            let response = self
                .client
                .list_objects(&ListObjectsRequest {
                    bucket: self.bucket.clone(),
                    prefix: Some(prefix.to_string()),
                    page_token: page_token.take(),
                    ..Default::default()
                })
                .await
                .map_err(|e| Error::storage(format!("Failed to list GCS objects: {}", e)))?;

            docs.extend(
                response
                    .items
                    .unwrap_or_default()
                    .into_iter()
                    .map(Self::to_stored_document),
            );

            match response.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(docs)
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.client
            .delete_object(&DeleteObjectRequest {
                bucket: self.bucket.clone(),
                object: path.to_string(),
                ..Default::default()
            })
            .await
            .map_err(|e| {
                if is_not_found(&e) {
                    Error::DocumentNotFound(path.to_string())
                } else {
                    Error::storage(format!("Failed to delete from GCS: {}", e))
                }
            })
    }

    async fn health_check(&self) -> Result<bool> {
        self.client
            .list_objects(&ListObjectsRequest {
                bucket: self.bucket.clone(),
                max_results: Some(1),
                ..Default::default()
            })
            .await
            .map(|_| true)
            .map_err(|e| Error::storage(format!("GCS health check failed: {}", e)))
    }

    fn name(&self) -> &str {
        "gcs"
    }
}
