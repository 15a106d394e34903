//! LLM provider trait for answer generation

use async_trait::async_trait;

use crate::error::Result;

/// Trait for prompt-in, text-out generation
///
/// Implementations never retry on their own; the query orchestrator's single
/// no-context fallback is the only resilience layer.
///
/// Implementations:
/// - `OllamaLlm`: Local Ollama server
/// - `GeminiClient`: Google Vertex AI
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate unstructured text for a fully rendered prompt
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Check if the provider is healthy and available
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;
}
