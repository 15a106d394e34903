//! Strategy selection and the shared corpus handle

use std::sync::Arc;
use tokio::sync::OnceCell;

use super::{AssembledContext, ContextStrategy};
use crate::config::RetrievalFallback;
use crate::error::{Error, Result};
use crate::providers::{CorpusRef, SemanticRetrievalProvider};

/// Process-wide handle to the retrieval corpus
///
/// Resolved on first use. Concurrent first calls share a single
/// initialization; a failed attempt leaves the cell empty for the next caller.
pub struct CorpusHandle {
    retriever: Arc<dyn SemanticRetrievalProvider>,
    display_name: String,
    cell: OnceCell<CorpusRef>,
}

impl CorpusHandle {
    pub fn new(retriever: Arc<dyn SemanticRetrievalProvider>, display_name: impl Into<String>) -> Self {
        Self {
            retriever,
            display_name: display_name.into(),
            cell: OnceCell::new(),
        }
    }

    /// Get the corpus, creating it on first use
    pub async fn get(&self) -> Result<CorpusRef> {
        self.cell
            .get_or_try_init(|| async {
                let corpus = self
                    .retriever
                    .get_or_create_corpus(&self.display_name)
                    .await?;
                tracing::info!("Retrieval corpus '{}' resolved to {}", self.display_name, corpus);
                Ok::<_, Error>(corpus)
            })
            .await
            .cloned()
    }

    /// Whether the corpus has been resolved
    pub fn is_initialized(&self) -> bool {
        self.cell.initialized()
    }
}

/// Picks a context strategy per query; never fails
pub struct ContextAssembler {
    semantic: Option<Arc<dyn ContextStrategy>>,
    naive: Arc<dyn ContextStrategy>,
    fallback: RetrievalFallback,
}

impl ContextAssembler {
    /// Create an assembler
    ///
    /// `semantic` is tried first when present. When it fails or is absent,
    /// `fallback` decides between `naive` and no context.
    pub fn new(
        semantic: Option<Arc<dyn ContextStrategy>>,
        naive: Arc<dyn ContextStrategy>,
        fallback: RetrievalFallback,
    ) -> Self {
        Self {
            semantic,
            naive,
            fallback,
        }
    }

    /// Assemble context for `question`
    pub async fn assemble(&self, question: &str) -> AssembledContext {
        if let Some(semantic) = &self.semantic {
            match semantic.assemble(question).await {
                Ok(context) => return context,
                Err(e) => {
                    tracing::warn!(
                        "{} context unavailable, falling back to {:?}: {}",
                        semantic.name(),
                        self.fallback,
                        e
                    );
                    if self.fallback == RetrievalFallback::None {
                        return AssembledContext::empty();
                    }
                }
            }
        }

        match self.naive.assemble(question).await {
            Ok(context) => context,
            Err(e) => {
                tracing::warn!("{} context unavailable, using no context: {}", self.naive.name(), e);
                AssembledContext::empty()
            }
        }
    }
}
