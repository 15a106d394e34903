//! Semantic retrieval provider trait for managed corpora

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Opaque reference to a corpus held by the retrieval service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusRef(pub String);

impl CorpusRef {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CorpusRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A chunk returned by the retrieval service
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedChunk {
    /// Chunk text
    pub text: String,
    /// Source document reference (URI or name)
    pub source_ref: String,
    /// Similarity score (higher is more similar)
    pub score: f32,
}

/// Trait for indexed semantic retrieval
///
/// Implementations:
/// - `VertexRagRetriever`: Vertex AI RAG Engine
#[async_trait]
pub trait SemanticRetrievalProvider: Send + Sync {
    /// Find the corpus named `display_name`, creating it if absent. Idempotent.
    async fn get_or_create_corpus(&self, display_name: &str) -> Result<CorpusRef>;

    /// Retrieve up to `top_k` chunks scoring at least `threshold`
    async fn retrieve(
        &self,
        corpus: &CorpusRef,
        query: &str,
        top_k: usize,
        threshold: f32,
    ) -> Result<Vec<RetrievedChunk>>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}
