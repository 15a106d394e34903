//! Query orchestrator
//!
//! Runs one question through authenticate, gather context, prompt, generate
//! and parse. A failed generation is retried exactly once with a context-free
//! prompt; a second failure is a service error. Blank model output counts
//! as a failed generation.

use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::generation::{PromptBuilder, ResponseSplitter, ROLE_FRAMING};
use crate::providers::identity::authenticate;
use crate::providers::{IdentityVerifier, LlmProvider};
use crate::retrieval::{AssembledContext, ContextAssembler};
use crate::types::{Identity, QueryResult};

/// Stage of a query pipeline run, used in logs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Authenticating,
    GatheringContext,
    Prompting,
    Generating,
    Fallback,
    Parsing,
    Done,
}

/// Stateless query pipeline shared by all requests
pub struct QueryOrchestrator {
    identity: Arc<dyn IdentityVerifier>,
    assembler: Arc<ContextAssembler>,
    llm: Arc<dyn LlmProvider>,
    role: String,
}

impl QueryOrchestrator {
    pub fn new(
        identity: Arc<dyn IdentityVerifier>,
        assembler: Arc<ContextAssembler>,
        llm: Arc<dyn LlmProvider>,
    ) -> Self {
        Self {
            identity,
            assembler,
            llm,
            role: ROLE_FRAMING.to_string(),
        }
    }

    /// Authenticate, validate and answer a question
    ///
    /// The credential is checked before the question is looked at, so an
    /// unauthenticated request never reaches any collaborator.
    pub async fn run(&self, authorization: Option<&str>, question: Option<&str>) -> Result<QueryResult> {
        tracing::debug!(stage = ?PipelineStage::Authenticating);
        let identity = authenticate(self.identity.as_ref(), authorization).await?;

        let question = question
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .ok_or_else(|| Error::invalid_input("Question cannot be empty"))?;

        self.answer(&identity, question).await
    }

    /// Answer a question for an already verified requester
    pub async fn answer(&self, identity: &Identity, question: &str) -> Result<QueryResult> {
        let request_id = Uuid::new_v4();
        let start = Instant::now();
        tracing::info!(%request_id, user = identity.label(), "Query: \"{}\"", question);

        tracing::debug!(%request_id, stage = ?PipelineStage::GatheringContext);
        let context = self.assembler.assemble(question).await;
        tracing::info!(
            %request_id,
            mode = ?context.mode,
            sources = context.sources.len(),
            "Context assembled"
        );

        tracing::debug!(%request_id, stage = ?PipelineStage::Prompting);
        let prompt = PromptBuilder::build(&self.role, &context.block, question);

        tracing::debug!(%request_id, stage = ?PipelineStage::Generating, model = self.llm.model());
        let (raw, context, used_fallback) = match self.generate(&prompt).await {
            Ok(raw) => (raw, context, false),
            Err(e) => {
                tracing::warn!(%request_id, stage = ?PipelineStage::Fallback, "Generation failed, retrying without context: {}", e);
                let fallback_prompt = PromptBuilder::build(&self.role, "", question);
                let raw = self.generate(&fallback_prompt).await.map_err(|e| {
                    tracing::error!(%request_id, "Fallback generation failed: {}", e);
                    Error::Service(format!("Answer generation failed: {}", e))
                })?;
                (raw, AssembledContext::empty(), true)
            }
        };

        tracing::debug!(%request_id, stage = ?PipelineStage::Parsing);
        let split = ResponseSplitter::split(&raw);

        tracing::info!(
            %request_id,
            stage = ?PipelineStage::Done,
            parsed_ok = split.parsed_ok,
            used_fallback,
            "Query answered in {}ms",
            start.elapsed().as_millis()
        );

        Ok(QueryResult {
            request_id,
            compliance_summary: split.compliance,
            customer_answer: split.customer,
            sources: context.sources,
            used_retrieval: context.used_retrieval,
            context_mode: context.mode,
            used_fallback,
            parsed_ok: split.parsed_ok,
            requested_by: identity.label().to_string(),
            timestamp: Utc::now(),
        })
    }

    /// Generate once; blank output counts as a failed generation
    async fn generate(&self, prompt: &str) -> Result<String> {
        let raw = self.llm.generate(prompt).await?;
        if raw.trim().is_empty() {
            return Err(Error::llm(format!("{} returned an empty response", self.llm.name())));
        }
        Ok(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RetrievalFallback;
    use crate::generation::REVIEW_SENTINEL;
    use crate::providers::StaticTokenVerifier;
    use crate::retrieval::{ContextMode, ContextStrategy};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct FixedContext;

    #[async_trait]
    impl ContextStrategy for FixedContext {
        async fn assemble(&self, _question: &str) -> Result<AssembledContext> {
            Ok(AssembledContext {
                block: "CONTEXT-BLOCK".to_string(),
                sources: vec!["policy.txt".to_string()],
                used_retrieval: false,
                mode: ContextMode::Naive,
            })
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    /// Replays scripted outcomes and records prompts
    struct ScriptedLlm {
        outcomes: Mutex<Vec<Result<String>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedLlm {
        fn new(outcomes: Vec<Result<String>>) -> Arc<Self> {
            Arc::new(Self {
                outcomes: Mutex::new(outcomes),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedLlm {
        async fn generate(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            let mut outcomes = self.outcomes.lock().unwrap();
            if outcomes.is_empty() {
                return Err(Error::llm("no scripted outcome"));
            }
            outcomes.remove(0)
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn name(&self) -> &str {
            "scripted"
        }

        fn model(&self) -> &str {
            "scripted"
        }
    }

    fn orchestrator(llm: Arc<ScriptedLlm>) -> QueryOrchestrator {
        let mut tokens = HashMap::new();
        tokens.insert("good".to_string(), "rep@example.com".to_string());
        let assembler = ContextAssembler::new(None, Arc::new(FixedContext), RetrievalFallback::Naive);
        QueryOrchestrator::new(Arc::new(StaticTokenVerifier::new(tokens)), Arc::new(assembler), llm)
    }

    #[tokio::test]
    async fn test_unauthenticated_rejected_before_generation() {
        let llm = ScriptedLlm::new(vec![Ok("x".to_string())]);
        let orch = orchestrator(llm.clone());

        for header in [None, Some("Bearer bad"), Some("good")] {
            let result = orch.run(header, Some("question")).await;
            assert!(matches!(result, Err(Error::Unauthorized(_))), "{:?}", header);
        }
        // Auth is checked before the question
        assert!(matches!(orch.run(None, None).await, Err(Error::Unauthorized(_))));
        assert!(llm.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_empty_question_rejected() {
        let llm = ScriptedLlm::new(vec![]);
        let orch = orchestrator(llm.clone());

        for question in [None, Some(""), Some("   ")] {
            let result = orch.run(Some("Bearer good"), question).await;
            assert!(matches!(result, Err(Error::InvalidInput(_))));
        }
        assert!(llm.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_labeled_output_is_split() {
        let llm = ScriptedLlm::new(vec![Ok(
            "COMPLIANCE SUMMARY: Avoid cure claims.\nCUSTOMER ANSWER: We store for 20 years.".to_string(),
        )]);
        let orch = orchestrator(llm.clone());

        let result = orch.run(Some("Bearer good"), Some(" How long? ")).await.unwrap();
        assert_eq!(result.compliance_summary, "Avoid cure claims.");
        assert_eq!(result.customer_answer, "We store for 20 years.");
        assert_eq!(result.sources, vec!["policy.txt"]);
        assert_eq!(result.requested_by, "rep@example.com");
        assert!(result.parsed_ok);
        assert!(!result.used_fallback);

        let prompts = llm.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("CONTEXT-BLOCK"));
        assert!(prompts[0].contains("Customer Question: How long?"));
    }

    #[tokio::test]
    async fn test_unlabeled_output_needs_review() {
        let raw = "Cord blood is stored cryogenically.";
        let llm = ScriptedLlm::new(vec![Ok(raw.to_string())]);
        let result = orchestrator(llm).run(Some("Bearer good"), Some("q")).await.unwrap();

        assert_eq!(result.compliance_summary, REVIEW_SENTINEL);
        assert_eq!(result.customer_answer, raw);
        assert!(!result.parsed_ok);
    }

    #[tokio::test]
    async fn test_generation_failure_retries_once_without_context() {
        let llm = ScriptedLlm::new(vec![
            Err(Error::llm("timeout")),
            Ok("COMPLIANCE SUMMARY: a\nCUSTOMER ANSWER: b".to_string()),
        ]);
        let result = orchestrator(llm.clone())
            .run(Some("Bearer good"), Some("q"))
            .await
            .unwrap();

        assert!(result.used_fallback);
        assert!(result.sources.is_empty());
        assert_eq!(result.context_mode, ContextMode::NoContext);
        assert_eq!(result.customer_answer, "b");

        let prompts = llm.prompts();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[0].contains("CONTEXT-BLOCK"));
        assert!(!prompts[1].contains("CONTEXT-BLOCK"));
    }

    #[tokio::test]
    async fn test_second_generation_failure_is_service_error() {
        let llm = ScriptedLlm::new(vec![
            Err(Error::llm("timeout")),
            Err(Error::llm("still down")),
            Ok("never reached".to_string()),
        ]);
        let result = orchestrator(llm.clone()).run(Some("Bearer good"), Some("q")).await;

        assert!(matches!(result, Err(Error::Service(_))));
        assert_eq!(llm.prompts().len(), 2);
    }

    #[tokio::test]
    async fn test_blank_reply_takes_the_fallback() {
        let llm = ScriptedLlm::new(vec![
            Ok(String::new()),
            Ok("Storage is at -196C.".to_string()),
        ]);
        let result = orchestrator(llm.clone())
            .run(Some("Bearer good"), Some("q"))
            .await
            .unwrap();

        assert!(result.used_fallback);
        assert_eq!(result.customer_answer, "Storage is at -196C.");
        assert!(!llm.prompts()[1].contains("CONTEXT-BLOCK"));
    }

    #[tokio::test]
    async fn test_blank_fallback_reply_is_service_error() {
        let llm = ScriptedLlm::new(vec![Ok("  \n".to_string()), Ok(String::new())]);
        let result = orchestrator(llm.clone()).run(Some("Bearer good"), Some("q")).await;

        assert!(matches!(result, Err(Error::Service(_))));
        assert_eq!(llm.prompts().len(), 2);
    }
}
