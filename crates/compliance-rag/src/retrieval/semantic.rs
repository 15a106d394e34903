//! Semantic strategy: top chunks from the managed retrieval corpus

use async_trait::async_trait;
use std::sync::Arc;

use super::assembler::CorpusHandle;
use super::{truncate_chars, AssembledContext, ContextMode, ContextStrategy};
use crate::config::ContextConfig;
use crate::error::{Error, Result};
use crate::providers::{RetrievedChunk, SemanticRetrievalProvider};

const EXCERPTS_HEADER: &str = "\n\n=== RELEVANT DOCUMENT EXCERPTS ===\n\n";

/// Semantic context strategy
pub struct SemanticStrategy {
    retriever: Arc<dyn SemanticRetrievalProvider>,
    corpus: Arc<CorpusHandle>,
    top_k: usize,
    keep: usize,
    threshold: f32,
    max_chars: usize,
}

impl SemanticStrategy {
    pub fn new(
        retriever: Arc<dyn SemanticRetrievalProvider>,
        corpus: Arc<CorpusHandle>,
        config: &ContextConfig,
    ) -> Self {
        Self {
            retriever,
            corpus,
            top_k: config.semantic_top_k,
            keep: config.semantic_keep.min(config.semantic_top_k),
            threshold: config.similarity_threshold,
            max_chars: config.chunk_max_chars,
        }
    }

    /// Drop chunks under the threshold, then keep the best `keep` by score
    fn select(&self, mut chunks: Vec<RetrievedChunk>) -> Vec<RetrievedChunk> {
        chunks.retain(|c| c.score >= self.threshold);
        // Stable sort keeps service order among equal scores
        chunks.sort_by(|a, b| b.score.total_cmp(&a.score));
        chunks.truncate(self.keep);
        chunks
    }
}

#[async_trait]
impl ContextStrategy for SemanticStrategy {
    async fn assemble(&self, question: &str) -> Result<AssembledContext> {
        let corpus = self.corpus.get().await?;
        let retrieved = self
            .retriever
            .retrieve(&corpus, question, self.top_k, self.threshold)
            .await?;
        let retrieved_count = retrieved.len();

        let chunks = self.select(retrieved);
        if chunks.is_empty() {
            return Err(Error::retrieval(format!(
                "no chunks above similarity {} ({} retrieved)",
                self.threshold, retrieved_count
            )));
        }

        let mut block = String::from(EXCERPTS_HEADER);
        for (i, chunk) in chunks.iter().enumerate() {
            block.push_str(&format!(
                "[Source {}] {} (similarity {:.2})\n{}\n\n",
                i + 1,
                chunk.source_ref,
                chunk.score,
                truncate_chars(&chunk.text, self.max_chars)
            ));
        }

        Ok(AssembledContext {
            block,
            sources: chunks.into_iter().map(|c| c.source_ref).collect(),
            used_retrieval: true,
            mode: ContextMode::Semantic,
        })
    }

    fn name(&self) -> &str {
        "semantic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::CorpusRef;

    struct FixedRetriever(Vec<RetrievedChunk>);

    #[async_trait]
    impl SemanticRetrievalProvider for FixedRetriever {
        async fn get_or_create_corpus(&self, display_name: &str) -> Result<CorpusRef> {
            Ok(CorpusRef(format!("corpora/{}", display_name)))
        }

        async fn retrieve(
            &self,
            _corpus: &CorpusRef,
            _query: &str,
            top_k: usize,
            _threshold: f32,
        ) -> Result<Vec<RetrievedChunk>> {
            Ok(self.0.iter().take(top_k).cloned().collect())
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    fn chunk(source: &str, score: f32, text: &str) -> RetrievedChunk {
        RetrievedChunk {
            text: text.to_string(),
            source_ref: source.to_string(),
            score,
        }
    }

    fn strategy(chunks: Vec<RetrievedChunk>) -> SemanticStrategy {
        let retriever: Arc<dyn SemanticRetrievalProvider> = Arc::new(FixedRetriever(chunks));
        let corpus = Arc::new(CorpusHandle::new(retriever.clone(), "kb"));
        let config = ContextConfig {
            chunk_max_chars: 8,
            ..Default::default()
        };
        SemanticStrategy::new(retriever, corpus, &config)
    }

    #[tokio::test]
    async fn test_keeps_top_chunks_by_score() {
        let strategy = strategy(vec![
            chunk("a", 0.6, "alpha"),
            chunk("b", 0.9, "bravo"),
            chunk("c", 0.4, "charlie"),
            chunk("d", 0.7, "delta text that is long"),
            chunk("e", 0.8, "echo"),
        ]);

        let context = strategy.assemble("q").await.unwrap();
        assert_eq!(context.sources, vec!["b", "e", "d"]);
        assert!(context.used_retrieval);
        assert_eq!(context.mode, ContextMode::Semantic);
        assert!(context.block.contains("[Source 1] b (similarity 0.90)\nbravo\n"));
        assert!(context.block.contains("[Source 3] d (similarity 0.70)\ndelta te\n"));
    }

    #[tokio::test]
    async fn test_nothing_above_threshold_is_error() {
        let strategy = strategy(vec![chunk("a", 0.2, "alpha")]);
        assert!(matches!(
            strategy.assemble("q").await,
            Err(Error::Retrieval(_))
        ));
    }
}
