//! Local filesystem document store
//!
//! Each document lives at `<root>/<path>` with a `<path>.meta.json` sidecar that
//! records size, content type, creation time and upload metadata.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};
use crate::types::{DocumentMetadata, StoredDocument};

use super::document_store::DocumentStoreProvider;

const META_SUFFIX: &str = ".meta.json";

/// Local document store using filesystem
pub struct LocalDocumentStore {
    /// Directory to store documents
    root: PathBuf,
}

impl LocalDocumentStore {
    /// Create a new local document store
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Resolve a storage path under the root, rejecting traversal
    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path);
        let clean = !path.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !clean {
            return Err(Error::invalid_input(format!("Invalid document path: {}", path)));
        }
        Ok(self.root.join(relative))
    }

    fn meta_path(data_path: &Path) -> PathBuf {
        let mut name = data_path.as_os_str().to_os_string();
        name.push(META_SUFFIX);
        PathBuf::from(name)
    }

    /// Collect every sidecar under the root
    async fn collect_sidecars(&self) -> Result<Vec<PathBuf>> {
        let mut sidecars = Vec::new();
        let mut pending = vec![self.root.clone()];

        while let Some(dir) = pending.pop() {
            let mut entries = tokio::fs::read_dir(&dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if entry.file_type().await?.is_dir() {
                    pending.push(path);
                } else if path.to_string_lossy().ends_with(META_SUFFIX) {
                    sidecars.push(path);
                }
            }
        }

        Ok(sidecars)
    }
}

#[derive(serde::Serialize, serde::Deserialize)]
struct DocumentMeta {
    path: String,
    size: u64,
    created_at: DateTime<Utc>,
    content_type: String,
    metadata: DocumentMetadata,
}

#[async_trait]
impl DocumentStoreProvider for LocalDocumentStore {
    async fn put(&self, path: &str, data: &[u8], metadata: &DocumentMetadata) -> Result<String> {
        let data_path = self.resolve(path)?;
        if let Some(parent) = data_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(&data_path, data).await?;

        let meta = DocumentMeta {
            path: path.to_string(),
            size: data.len() as u64,
            created_at: Utc::now(),
            content_type: mime_guess::from_path(path).first_or_octet_stream().to_string(),
            metadata: metadata.clone(),
        };
        let meta_json = serde_json::to_string_pretty(&meta)?;
        tokio::fs::write(Self::meta_path(&data_path), meta_json).await?;

        Ok(data_path.to_string_lossy().to_string())
    }

    async fn get(&self, path: &str) -> Result<Vec<u8>> {
        let data_path = self.resolve(path)?;
        match tokio::fs::read(&data_path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::DocumentNotFound(path.to_string()))
            }
            Err(e) => Err(Error::storage(format!("Failed to read {}: {}", path, e))),
        }
    }

    async fn list(&self, prefix: &str) -> Result<Vec<StoredDocument>> {
        let mut docs = Vec::new();

        for sidecar in self.collect_sidecars().await? {
            let content = match tokio::fs::read_to_string(&sidecar).await {
                Ok(content) => content,
                Err(e) => {
                    tracing::warn!("Skipping unreadable sidecar {}: {}", sidecar.display(), e);
                    continue;
                }
            };
            match serde_json::from_str::<DocumentMeta>(&content) {
                Ok(meta) if meta.path.starts_with(prefix) => docs.push(StoredDocument {
                    path: meta.path,
                    size: meta.size,
                    created_at: meta.created_at,
                    content_type: Some(meta.content_type),
                    metadata: Some(meta.metadata),
                }),
                Ok(_) => {}
                Err(e) => tracing::warn!("Skipping invalid sidecar {}: {}", sidecar.display(), e),
            }
        }

        // Match object-store listing: lexicographic by path
        docs.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(docs)
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let data_path = self.resolve(path)?;
        if !tokio::fs::try_exists(&data_path).await? {
            return Err(Error::DocumentNotFound(path.to_string()));
        }

        tokio::fs::remove_file(&data_path).await?;
        let meta_path = Self::meta_path(&data_path);
        if tokio::fs::try_exists(&meta_path).await? {
            tokio::fs::remove_file(&meta_path).await?;
        }

        Ok(())
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(self.root.exists())
    }

    fn name(&self) -> &str {
        "local-filesystem"
    }
}
