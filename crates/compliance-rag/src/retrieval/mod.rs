//! Context assembly for the compliance prompt
//!
//! Two strategies share the [`ContextStrategy`] contract:
//! - [`NaiveStrategy`]: truncated text of the first listed uploads
//! - [`SemanticStrategy`]: top chunks from the managed retrieval corpus
//!
//! [`ContextAssembler`] picks between them and never fails.

mod assembler;
mod naive;
mod semantic;

pub use assembler::{ContextAssembler, CorpusHandle};
pub use naive::NaiveStrategy;
pub use semantic::SemanticStrategy;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// How a context block was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextMode {
    /// Chunks from semantic retrieval
    Semantic,
    /// Truncated full-document text
    Naive,
    /// No document context
    NoContext,
}

/// Context block ready to embed in a prompt
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledContext {
    /// Rendered block
    pub block: String,
    /// Source identities in the order they appear in the block
    pub sources: Vec<String>,
    /// Whether semantic retrieval produced the block
    pub used_retrieval: bool,
    pub mode: ContextMode,
}

impl AssembledContext {
    /// Context-free block used when no strategy produced anything
    pub fn empty() -> Self {
        Self {
            block: String::new(),
            sources: Vec::new(),
            used_retrieval: false,
            mode: ContextMode::NoContext,
        }
    }
}

/// A way of turning a question into a context block
#[async_trait]
pub trait ContextStrategy: Send + Sync {
    async fn assemble(&self, question: &str) -> Result<AssembledContext>;

    /// Strategy name for logging
    fn name(&self) -> &str;
}

/// Keep at most `max_chars` characters of `text`
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars_is_char_safe() {
        assert_eq!(truncate_chars("héllo wörld", 4), "héll");
        assert_eq!(truncate_chars("short", 100), "short");
        assert_eq!(truncate_chars("abc", 0), "");
    }
}
