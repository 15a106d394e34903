//! Application state for the compliance server

use std::sync::Arc;

use crate::config::{AuthMode, BackendProvider, RagConfig};
use crate::error::{Error, Result};
use crate::providers::{
    local::LocalDocumentStore, ollama::OllamaLlm, DocumentStoreProvider, FirebaseTokenVerifier,
    IdentityVerifier, LlmProvider, SemanticRetrievalProvider, StaticTokenVerifier,
};
use crate::query::QueryOrchestrator;
use crate::retrieval::{ContextAssembler, ContextStrategy, CorpusHandle, NaiveStrategy, SemanticStrategy};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: RagConfig,
    /// Uploaded documents (filesystem or GCS)
    store: Arc<dyn DocumentStoreProvider>,
    /// Generation client (Ollama or Gemini)
    llm: Arc<dyn LlmProvider>,
    /// Bearer credential verifier
    identity: Arc<dyn IdentityVerifier>,
    /// Corpus handle, when semantic retrieval is configured
    corpus: Option<Arc<CorpusHandle>>,
    /// Query pipeline
    orchestrator: QueryOrchestrator,
}

/// Semantic retrieval wiring: provider plus corpus display name
pub type RetrievalSetup = (Arc<dyn SemanticRetrievalProvider>, String);

impl AppState {
    /// Create application state for the configured backend
    pub async fn new(config: RagConfig) -> Result<Self> {
        tracing::info!("Initializing application state (backend: {:?})...", config.backend);

        let identity = Self::identity_from_config(&config)?;

        let (store, llm, retrieval): (
            Arc<dyn DocumentStoreProvider>,
            Arc<dyn LlmProvider>,
            Option<RetrievalSetup>,
        ) = match config.backend {
            BackendProvider::Local => {
                tracing::info!(
                    "Using local backend (filesystem at {} + Ollama)",
                    config.storage.local_root.display()
                );
                let store = Arc::new(LocalDocumentStore::new(&config.storage.local_root)?);
                let llm = Arc::new(OllamaLlm::new(&config.llm)?);
                (store, llm, None)
            }
            BackendProvider::Gcp => {
                #[cfg(feature = "gcp")]
                {
                    use crate::providers::gcp::{
                        GcpAuth, GcsDocumentStore, GeminiClient, VertexRagRetriever,
                    };

                    let gcp_config = config.gcp.as_ref().ok_or_else(|| {
                        Error::Config("GCP backend selected but gcp config is missing".to_string())
                    })?;

                    tracing::info!("Using GCP backend (GCS + Gemini + RAG Engine)");

                    let auth = Arc::new(GcpAuth::from_service_account(
                        &gcp_config.service_account_key_path,
                        gcp_config.project_id.clone(),
                    )?);

                    let store = GcsDocumentStore::new(gcp_config.bucket()).await?;
                    store
                        .ensure_bucket(&gcp_config.project_id, &gcp_config.location)
                        .await?;

                    let llm = Arc::new(GeminiClient::new(
                        Arc::clone(&auth),
                        gcp_config.location.clone(),
                        gcp_config.generation_model.clone(),
                    ));

                    let retrieval = gcp_config.rag_corpus.clone().map(|name| {
                        let retriever: Arc<dyn SemanticRetrievalProvider> = Arc::new(
                            VertexRagRetriever::new(Arc::clone(&auth), gcp_config.location.clone()),
                        );
                        (retriever, name)
                    });

                    (Arc::new(store), llm, retrieval)
                }
                #[cfg(not(feature = "gcp"))]
                {
                    return Err(Error::Config(
                        "GCP backend requires the 'gcp' feature. Rebuild with --features gcp".to_string(),
                    ));
                }
            }
        };

        Ok(Self::from_parts(config, store, llm, identity, retrieval))
    }

    /// Assemble state from already-built providers
    pub fn from_parts(
        config: RagConfig,
        store: Arc<dyn DocumentStoreProvider>,
        llm: Arc<dyn LlmProvider>,
        identity: Arc<dyn IdentityVerifier>,
        retrieval: Option<RetrievalSetup>,
    ) -> Self {
        let corpus = retrieval
            .as_ref()
            .map(|(retriever, name)| Arc::new(CorpusHandle::new(Arc::clone(retriever), name.clone())));

        let semantic: Option<Arc<dyn ContextStrategy>> =
            retrieval.zip(corpus.clone()).map(|((retriever, _), corpus)| {
                Arc::new(SemanticStrategy::new(retriever, corpus, &config.context))
                    as Arc<dyn ContextStrategy>
            });

        let naive: Arc<dyn ContextStrategy> = Arc::new(NaiveStrategy::new(
            Arc::clone(&store),
            config.storage.upload_prefix.clone(),
            config.context.naive_max_documents,
            config.context.naive_max_chars,
        ));

        tracing::info!(
            "Context: semantic={}, fallback={:?}, storage={}, llm={} ({})",
            semantic.is_some(),
            config.context.fallback,
            store.name(),
            llm.name(),
            llm.model()
        );

        let assembler = ContextAssembler::new(semantic, naive, config.context.fallback);
        let orchestrator =
            QueryOrchestrator::new(Arc::clone(&identity), Arc::new(assembler), Arc::clone(&llm));

        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                llm,
                identity,
                corpus,
                orchestrator,
            }),
        }
    }

    fn identity_from_config(config: &RagConfig) -> Result<Arc<dyn IdentityVerifier>> {
        match config.auth.mode {
            AuthMode::Firebase => {
                let project_id = config.auth.project_id.clone().ok_or_else(|| {
                    Error::Config("Firebase auth requires auth.project_id".to_string())
                })?;
                tracing::info!("Verifying Firebase ID tokens for project {}", project_id);
                Ok(Arc::new(FirebaseTokenVerifier::new(project_id)))
            }
            AuthMode::Static => {
                tracing::warn!(
                    "Using static token table ({} tokens); not for production",
                    config.auth.static_tokens.len()
                );
                Ok(Arc::new(StaticTokenVerifier::new(
                    config.auth.static_tokens.clone(),
                )))
            }
        }
    }

    /// Get configuration
    pub fn config(&self) -> &RagConfig {
        &self.inner.config
    }

    /// Get the document store
    pub fn store(&self) -> &Arc<dyn DocumentStoreProvider> {
        &self.inner.store
    }

    /// Get the generation client
    pub fn llm(&self) -> &Arc<dyn LlmProvider> {
        &self.inner.llm
    }

    /// Get the identity verifier
    pub fn identity(&self) -> &dyn IdentityVerifier {
        self.inner.identity.as_ref()
    }

    /// Get the query pipeline
    pub fn orchestrator(&self) -> &QueryOrchestrator {
        &self.inner.orchestrator
    }

    /// Whether semantic retrieval is configured
    pub fn semantic_enabled(&self) -> bool {
        self.inner.corpus.is_some()
    }

    /// Whether the retrieval corpus has been resolved yet
    pub fn corpus_ready(&self) -> bool {
        self.inner
            .corpus
            .as_ref()
            .map(|c| c.is_initialized())
            .unwrap_or(false)
    }

    /// Upload prefix inside the document store
    pub fn upload_prefix(&self) -> &str {
        &self.inner.config.storage.upload_prefix
    }
}
