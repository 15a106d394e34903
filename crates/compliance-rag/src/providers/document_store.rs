//! Document store provider trait for uploaded compliance documents

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{DocumentMetadata, StoredDocument};

/// Trait for durable blob storage keyed by path
///
/// Implementations:
/// - `LocalDocumentStore`: Local filesystem
/// - `GcsDocumentStore`: Google Cloud Storage
#[async_trait]
pub trait DocumentStoreProvider: Send + Sync {
    /// Store a document at `path`
    ///
    /// Returns the storage URI
    async fn put(&self, path: &str, data: &[u8], metadata: &DocumentMetadata) -> Result<String>;

    /// Retrieve document bytes
    async fn get(&self, path: &str) -> Result<Vec<u8>>;

    /// List documents under `prefix`, ordered by path
    async fn list(&self, prefix: &str) -> Result<Vec<StoredDocument>>;

    /// Delete a document
    async fn delete(&self, path: &str) -> Result<()>;

    /// Check if the provider is healthy
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}
