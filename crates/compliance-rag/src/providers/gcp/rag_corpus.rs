//! Vertex AI RAG Engine retrieval
//!
//! Corpora are looked up by display name and created on demand. Creation is a
//! long-running operation that is polled until done.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use super::auth::GcpAuth;
use crate::error::{Error, Result};
use crate::providers::retrieval::{CorpusRef, RetrievedChunk, SemanticRetrievalProvider};

const OPERATION_POLL_INTERVAL: Duration = Duration::from_secs(2);
const OPERATION_MAX_POLLS: u32 = 60;

/// Vertex AI RAG Engine retriever
pub struct VertexRagRetriever {
    auth: Arc<GcpAuth>,
    location: String,
}

impl VertexRagRetriever {
    pub fn new(auth: Arc<GcpAuth>, location: String) -> Self {
        Self { auth, location }
    }

    fn api_base(&self) -> String {
        format!("https://{}-aiplatform.googleapis.com/v1", self.location)
    }

    fn parent(&self) -> String {
        format!(
            "projects/{}/locations/{}",
            self.auth.project_id(),
            self.location
        )
    }

    async fn find_corpus(&self, display_name: &str) -> Result<Option<CorpusRef>> {
        let client = self.auth.authorized_client().await?;
        let url = format!("{}/{}/ragCorpora", self.api_base(), self.parent());
        let mut page_token: Option<String> = None;

        loop {
            let mut request = client.get(&url);
            if let Some(token) = page_token.as_deref() {
                request = request.query(&[("pageToken", token)]);
            }

            let response = request
                .send()
                .await
                .map_err(|e| Error::retrieval(format!("Corpus list request failed: {}", e)))?;
            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                return Err(Error::retrieval(format!(
                    "Corpus list failed ({}): {}",
                    status, body
                )));
            }

            let page: ListCorporaResponse = response
                .json()
                .await
                .map_err(|e| Error::retrieval(format!("Failed to parse corpus list: {}", e)))?;

            if let Some(found) = page
                .rag_corpora
                .into_iter()
                .find(|c| c.display_name == display_name)
            {
                return Ok(Some(CorpusRef(found.name)));
            }

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => return Ok(None),
            }
        }
    }

    async fn create_corpus(&self, display_name: &str) -> Result<CorpusRef> {
        let client = self.auth.authorized_client().await?;
        let url = format!("{}/{}/ragCorpora", self.api_base(), self.parent());

        let response = client
            .post(&url)
            .json(&serde_json::json!({ "displayName": display_name }))
            .send()
            .await
            .map_err(|e| Error::retrieval(format!("Corpus create request failed: {}", e)))?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::retrieval(format!(
                "Corpus create failed ({}): {}",
                status, body
            )));
        }

        let mut operation: Operation = response
            .json()
            .await
            .map_err(|e| Error::retrieval(format!("Failed to parse create operation: {}", e)))?;

        let mut polls = 0;
        while !operation.done {
            if polls >= OPERATION_MAX_POLLS {
                return Err(Error::retrieval(format!(
                    "Corpus creation did not finish: {}",
                    operation.name
                )));
            }
            polls += 1;
            tokio::time::sleep(OPERATION_POLL_INTERVAL).await;

            let op_url = format!("{}/{}", self.api_base(), operation.name);
            operation = client
                .get(&op_url)
                .send()
                .await
                .map_err(|e| Error::retrieval(format!("Operation poll failed: {}", e)))?
                .json()
                .await
                .map_err(|e| Error::retrieval(format!("Failed to parse operation: {}", e)))?;
        }

        operation.into_corpus()
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListCorporaResponse {
    #[serde(default)]
    rag_corpora: Vec<RagCorpus>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RagCorpus {
    name: String,
    #[serde(default)]
    display_name: String,
}

#[derive(Deserialize)]
struct Operation {
    name: String,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<serde_json::Value>,
    #[serde(default)]
    response: Option<RagCorpus>,
}

impl Operation {
    fn into_corpus(self) -> Result<CorpusRef> {
        if let Some(error) = self.error {
            return Err(Error::retrieval(format!("Corpus creation failed: {}", error)));
        }
        self.response
            .map(|corpus| CorpusRef(corpus.name))
            .ok_or_else(|| Error::retrieval("Corpus creation returned no corpus"))
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RetrieveRequest<'a> {
    vertex_rag_store: VertexRagStore<'a>,
    query: RagQuery<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VertexRagStore<'a> {
    rag_resources: Vec<RagResource<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RagResource<'a> {
    rag_corpus: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RagQuery<'a> {
    text: &'a str,
    rag_retrieval_config: RetrievalConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RetrievalConfig {
    top_k: usize,
    filter: RetrievalFilter,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RetrievalFilter {
    vector_similarity_threshold: f32,
}

#[derive(Deserialize, Default)]
struct RetrieveResponse {
    #[serde(default)]
    contexts: RagContexts,
}

#[derive(Deserialize, Default)]
struct RagContexts {
    #[serde(default)]
    contexts: Vec<RagContext>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RagContext {
    #[serde(default)]
    source_uri: String,
    #[serde(default)]
    source_display_name: Option<String>,
    #[serde(default)]
    text: String,
    #[serde(default)]
    score: Option<f32>,
    #[serde(default)]
    distance: Option<f32>,
}

impl From<RagContext> for RetrievedChunk {
    fn from(ctx: RagContext) -> Self {
        // Older responses only carry a cosine distance
        let score = ctx
            .score
            .or_else(|| ctx.distance.map(|d| 1.0 - d))
            .unwrap_or(0.0);
        let source_ref = if ctx.source_uri.is_empty() {
            ctx.source_display_name.unwrap_or_default()
        } else {
            ctx.source_uri
        };

        RetrievedChunk {
            text: ctx.text,
            source_ref,
            score,
        }
    }
}

#[async_trait]
impl SemanticRetrievalProvider for VertexRagRetriever {
    async fn get_or_create_corpus(&self, display_name: &str) -> Result<CorpusRef> {
        if let Some(existing) = self.find_corpus(display_name).await? {
            tracing::debug!("Using existing RAG corpus {}", existing);
            return Ok(existing);
        }

        tracing::info!("Creating RAG corpus '{}'", display_name);
        self.create_corpus(display_name).await
    }

    async fn retrieve(
        &self,
        corpus: &CorpusRef,
        query: &str,
        top_k: usize,
        threshold: f32,
    ) -> Result<Vec<RetrievedChunk>> {
        let client = self.auth.authorized_client().await?;
        let url = format!("{}/{}:retrieveContexts", self.api_base(), self.parent());

        let request = RetrieveRequest {
            vertex_rag_store: VertexRagStore {
                rag_resources: vec![RagResource {
                    rag_corpus: corpus.as_str(),
                }],
            },
            query: RagQuery {
                text: query,
                rag_retrieval_config: RetrievalConfig {
                    top_k,
                    filter: RetrievalFilter {
                        vector_similarity_threshold: threshold,
                    },
                },
            },
        };

        let response = client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::retrieval(format!("Retrieve request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::retrieval(format!(
                "Retrieve contexts failed ({}): {}",
                status, body
            )));
        }

        let parsed: RetrieveResponse = response
            .json()
            .await
            .map_err(|e| Error::retrieval(format!("Failed to parse retrieve response: {}", e)))?;

        Ok(parsed
            .contexts
            .contexts
            .into_iter()
            .map(RetrievedChunk::from)
            .collect())
    }

    fn name(&self) -> &str {
        "vertex-rag-engine"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contexts_map_to_chunks() {
        let parsed: RetrieveResponse = serde_json::from_str(
            r#"{"contexts": {"contexts": [
                {"sourceUri": "gs://b/uploads/policy.pdf", "text": "No cure claims.", "score": 0.82},
                {"sourceDisplayName": "faq.txt", "text": "Storage is 20 years.", "distance": 0.3}
            ]}}"#,
        )
        .unwrap();

        let chunks: Vec<RetrievedChunk> = parsed
            .contexts
            .contexts
            .into_iter()
            .map(RetrievedChunk::from)
            .collect();

        assert_eq!(chunks[0].source_ref, "gs://b/uploads/policy.pdf");
        assert!((chunks[0].score - 0.82).abs() < 1e-6);
        assert_eq!(chunks[1].source_ref, "faq.txt");
        assert!((chunks[1].score - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_empty_retrieve_response() {
        let parsed: RetrieveResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.contexts.contexts.is_empty());
    }

    #[test]
    fn test_failed_operation_is_retrieval_error() {
        let op: Operation = serde_json::from_str(
            r#"{"name": "operations/1", "done": true, "error": {"code": 7}}"#,
        )
        .unwrap();
        assert!(matches!(op.into_corpus(), Err(Error::Retrieval(_))));

        let op: Operation = serde_json::from_str(
            r#"{"name": "operations/2", "done": true, "response": {"name": "projects/p/locations/l/ragCorpora/9", "displayName": "kb"}}"#,
        )
        .unwrap();
        assert_eq!(
            op.into_corpus().unwrap().as_str(),
            "projects/p/locations/l/ragCorpora/9"
        );
    }
}
