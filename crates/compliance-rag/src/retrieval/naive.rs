//! Naive strategy: inject truncated text of the first listed uploads

use async_trait::async_trait;
use futures::future::join_all;
use std::sync::Arc;

use super::{truncate_chars, AssembledContext, ContextMode, ContextStrategy};
use crate::error::Result;
use crate::ingestion::{ExtractedText, ExtractionStatus, TextExtractor};
use crate::providers::DocumentStoreProvider;
use crate::types::StoredDocument;

const DOCUMENTS_HEADER: &str = "\n\n=== KNOWLEDGE BASE DOCUMENTS ===\n\n";
const NO_DOCUMENTS_BLOCK: &str = "\n\n=== NO DOCUMENTS UPLOADED YET ===\n";

/// Naive context strategy
pub struct NaiveStrategy {
    store: Arc<dyn DocumentStoreProvider>,
    prefix: String,
    max_documents: usize,
    max_chars: usize,
}

impl NaiveStrategy {
    pub fn new(
        store: Arc<dyn DocumentStoreProvider>,
        prefix: impl Into<String>,
        max_documents: usize,
        max_chars: usize,
    ) -> Self {
        Self {
            store,
            prefix: prefix.into(),
            max_documents,
            max_chars,
        }
    }

    async fn fetch_and_extract(&self, doc: &StoredDocument) -> ExtractedText {
        match self.store.get(&doc.path).await {
            Ok(data) => TextExtractor::extract_blocking(doc.path.clone(), data, doc.file_type()).await,
            Err(e) => {
                tracing::warn!("Skipping {}: {}", doc.path, e);
                ExtractedText {
                    source: doc.path.clone(),
                    content: String::new(),
                    status: ExtractionStatus::Failed(e.to_string()),
                }
            }
        }
    }

    fn render(&self, docs: &[(String, String)]) -> String {
        if docs.is_empty() {
            return NO_DOCUMENTS_BLOCK.to_string();
        }

        let mut block = String::from(DOCUMENTS_HEADER);
        for (i, (name, text)) in docs.iter().enumerate() {
            block.push_str(&format!("Document {}: {}\n{}\n\n", i + 1, name, text));
        }
        block
    }
}

#[async_trait]
impl ContextStrategy for NaiveStrategy {
    async fn assemble(&self, _question: &str) -> Result<AssembledContext> {
        let listed = self.store.list(&self.prefix).await?;
        let selected: Vec<&StoredDocument> = listed.iter().take(self.max_documents).collect();

        // join_all yields results in input order, so the block follows listing order
        let extracted = join_all(selected.iter().map(|doc| self.fetch_and_extract(doc))).await;

        let docs: Vec<(String, String)> = selected
            .iter()
            .zip(extracted)
            .filter(|(_, text)| text.is_usable())
            .map(|(doc, text)| {
                (
                    doc.display_name(&self.prefix),
                    truncate_chars(&text.content, self.max_chars).to_string(),
                )
            })
            .collect();

        tracing::debug!(
            "Naive context: {} listed, {} selected, {} usable",
            listed.len(),
            selected.len(),
            docs.len()
        );

        Ok(AssembledContext {
            block: self.render(&docs),
            sources: docs.into_iter().map(|(name, _)| name).collect(),
            used_retrieval: false,
            mode: ContextMode::Naive,
        })
    }

    fn name(&self) -> &str {
        "naive"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::local::LocalDocumentStore;
    use crate::types::DocumentMetadata;

    fn metadata(name: &str) -> DocumentMetadata {
        DocumentMetadata {
            uploaded_by: "rep@example.com".to_string(),
            original_name: name.to_string(),
            upload_time: "20250101_120000".to_string(),
            description: None,
        }
    }

    async fn store_with(files: &[(&str, &[u8])]) -> (tempfile::TempDir, Arc<dyn DocumentStoreProvider>) {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalDocumentStore::new(dir.path()).unwrap();
        for (path, data) in files {
            store.put(path, data, &metadata(path)).await.unwrap();
        }
        (dir, Arc::new(store))
    }

    /// Serves text documents, answering later listings faster
    struct SlowFirstStore {
        docs: Vec<(String, String)>,
    }

    #[async_trait]
    impl DocumentStoreProvider for SlowFirstStore {
        async fn put(&self, _path: &str, _data: &[u8], _metadata: &DocumentMetadata) -> Result<String> {
            unreachable!()
        }

        async fn get(&self, path: &str) -> Result<Vec<u8>> {
            let index = self.docs.iter().position(|(p, _)| p == path).unwrap();
            let delay = (self.docs.len() - index) as u64 * 40;
            tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
            Ok(self.docs[index].1.clone().into_bytes())
        }

        async fn list(&self, _prefix: &str) -> Result<Vec<StoredDocument>> {
            Ok(self
                .docs
                .iter()
                .map(|(path, text)| StoredDocument {
                    path: path.clone(),
                    size: text.len() as u64,
                    created_at: chrono::Utc::now(),
                    content_type: Some("text/plain".to_string()),
                    metadata: None,
                })
                .collect())
        }

        async fn delete(&self, _path: &str) -> Result<()> {
            Ok(())
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn name(&self) -> &str {
            "slow-first"
        }
    }

    #[tokio::test]
    async fn test_block_follows_listing_order_not_completion_order() {
        let store = SlowFirstStore {
            docs: ["one", "two", "three"]
                .iter()
                .map(|name| (format!("uploads/{}.txt", name), format!("text {}", name)))
                .collect(),
        };
        let strategy = NaiveStrategy::new(Arc::new(store), "uploads/", 10, 2000);

        let context = strategy.assemble("q").await.unwrap();
        assert_eq!(context.sources, vec!["one.txt", "two.txt", "three.txt"]);
        assert_eq!(
            context.block,
            format!(
                "{}Document 1: one.txt\ntext one\n\nDocument 2: two.txt\ntext two\n\nDocument 3: three.txt\ntext three\n\n",
                DOCUMENTS_HEADER
            )
        );
    }

    #[tokio::test]
    async fn test_no_documents_is_stated_explicitly() {
        let (_dir, store) = store_with(&[]).await;
        let strategy = NaiveStrategy::new(store, "uploads/", 10, 2000);

        let context = strategy.assemble("anything").await.unwrap();
        assert_eq!(context.block, NO_DOCUMENTS_BLOCK);
        assert!(context.sources.is_empty());
        assert_eq!(context.mode, ContextMode::Naive);
    }

    #[tokio::test]
    async fn test_caps_truncates_and_keeps_listing_order() {
        let long = "x".repeat(50);
        let (_dir, store) = store_with(&[
            ("uploads/c.txt", &b"third"[..]),
            ("uploads/a.txt", long.as_bytes()),
            ("uploads/b.txt", &b"second"[..]),
        ])
        .await;
        let strategy = NaiveStrategy::new(store, "uploads/", 2, 10);

        let context = strategy.assemble("q").await.unwrap();
        assert_eq!(context.sources, vec!["a.txt", "b.txt"]);
        assert_eq!(
            context.block,
            format!(
                "{}Document 1: a.txt\n{}\n\nDocument 2: b.txt\nsecond\n\n",
                DOCUMENTS_HEADER,
                "x".repeat(10)
            )
        );
        assert!(!context.used_retrieval);
    }

    #[tokio::test]
    async fn test_unextractable_documents_are_skipped() {
        let (_dir, store) = store_with(&[
            ("uploads/a.pdf", &b"not really a pdf"[..]),
            ("uploads/b.txt", &b"usable"[..]),
            ("uploads/c.txt", &[0xff_u8, 0xfe, 0x00][..]),
        ])
        .await;
        let strategy = NaiveStrategy::new(store, "uploads/", 10, 2000);

        let context = strategy.assemble("q").await.unwrap();
        assert_eq!(context.sources, vec!["b.txt"]);
        assert!(context.block.contains("Document 1: b.txt\nusable"));
    }

    #[tokio::test]
    async fn test_all_unusable_reads_as_no_documents() {
        let (_dir, store) = store_with(&[("uploads/a.txt", &b"   \n"[..])]).await;
        let strategy = NaiveStrategy::new(store, "uploads/", 10, 2000);

        let context = strategy.assemble("q").await.unwrap();
        assert_eq!(context.block, NO_DOCUMENTS_BLOCK);
    }
}
