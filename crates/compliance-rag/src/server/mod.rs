//! HTTP server for the compliance service

pub mod routes;
pub mod state;

use axum::{
    extract::State,
    http::{header, HeaderValue, Method},
    routing::get,
    Json, Router,
};
use std::net::SocketAddr;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::config::RagConfig;
use crate::error::{Error, Result};
use state::AppState;

/// Compliance HTTP server
pub struct RagServer {
    config: RagConfig,
    state: AppState,
}

impl RagServer {
    /// Create a new server for the configured backend
    pub async fn new(config: RagConfig) -> Result<Self> {
        let state = AppState::new(config.clone()).await?;
        Ok(Self { config, state })
    }

    /// Create a server around prepared state
    pub fn with_state(state: AppState) -> Self {
        Self {
            config: state.config().clone(),
            state,
        }
    }

    /// CORS for the configured frontend origins
    fn cors_layer(&self) -> Result<CorsLayer> {
        let origins: Vec<HeaderValue> = self
            .config
            .server
            .cors_origins
            .iter()
            .map(|origin| {
                HeaderValue::from_str(origin)
                    .map_err(|e| Error::Config(format!("Invalid CORS origin '{}': {}", origin, e)))
            })
            .collect::<Result<_>>()?;

        // Credentials rule out `*`, so an empty list mirrors the caller's origin
        let allow_origin = if origins.is_empty() {
            AllowOrigin::mirror_request()
        } else {
            AllowOrigin::list(origins)
        };

        Ok(CorsLayer::new()
            .allow_origin(allow_origin)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS, Method::DELETE])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            .allow_credentials(true))
    }

    /// Build the router with all routes
    pub fn build_router(&self) -> Result<Router> {
        let cors = self.cors_layer()?;

        Ok(Router::new()
            .route("/health", get(health_check))
            .merge(routes::routes(self.config.server.max_upload_size))
            .with_state(self.state.clone())
            // Applied bottom to top; CORS is outermost
            .layer(TraceLayer::new_for_http())
            .layer(CompressionLayer::new())
            .layer(cors))
    }

    /// Start the server
    pub async fn start(self) -> Result<()> {
        let addr: SocketAddr = self
            .address()
            .parse()
            .map_err(|e| Error::Config(format!("Invalid address: {}", e)))?;

        let router = self.build_router()?;

        tracing::info!("Starting compliance server on http://{}", addr);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| Error::Config(format!("Failed to bind: {}", e)))?;

        axum::serve(listener, router)
            .await
            .map_err(|e| Error::Internal(format!("Server error: {}", e)))?;

        Ok(())
    }

    /// Get the server address
    pub fn address(&self) -> String {
        format!("{}:{}", self.config.server.host, self.config.server.port)
    }
}

/// Health check endpoint
async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "compliance-rag",
        "version": env!("CARGO_PKG_VERSION"),
        "backend": state.config().backend,
        "storage": state.store().name(),
        "llm": state.llm().name(),
        "model": state.llm().model(),
        "retrieval": if state.semantic_enabled() { "semantic" } else { "document-based" },
        "corpus_ready": state.corpus_ready(),
        "fallback": state.config().context.fallback,
        "file_uploads": "enabled",
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuthMode;
    use crate::providers::{local::LocalDocumentStore, LlmProvider, StaticTokenVerifier};
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use std::collections::HashMap;
    use std::sync::Arc;
    use tower::ServiceExt;

    struct EchoLlm;

    #[async_trait]
    impl LlmProvider for EchoLlm {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            Ok("COMPLIANCE SUMMARY: Disclose fees.\nCUSTOMER ANSWER: Storage is at -196C.".to_string())
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn name(&self) -> &str {
            "echo"
        }

        fn model(&self) -> &str {
            "echo-1"
        }
    }

    fn router(dir: &std::path::Path) -> Router {
        let mut config = RagConfig::default();
        config.auth.mode = AuthMode::Static;
        config.storage.local_root = dir.to_path_buf();

        let mut tokens = HashMap::new();
        tokens.insert("good".to_string(), "rep@example.com".to_string());

        let state = AppState::from_parts(
            config,
            Arc::new(LocalDocumentStore::new(dir).unwrap()),
            Arc::new(EchoLlm),
            Arc::new(StaticTokenVerifier::new(tokens)),
            None,
        );
        RagServer::with_state(state).build_router().unwrap()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let dir = tempfile::tempdir().unwrap();
        let response = router(dir.path())
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["backend"], "local");
        assert_eq!(body["retrieval"], "document-based");
    }

    #[tokio::test]
    async fn test_query_requires_auth() {
        let dir = tempfile::tempdir().unwrap();
        let response = router(dir.path())
            .oneshot(
                Request::post("/")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"question": "hi"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = json_body(response).await;
        assert_eq!(body["error"]["type"], "unauthorized");
    }

    #[tokio::test]
    async fn test_query_rejects_empty_question() {
        let dir = tempfile::tempdir().unwrap();
        let response = router(dir.path())
            .oneshot(
                Request::post("/query")
                    .header("authorization", "Bearer good")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"question": "  "}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_query_answers_in_camel_case() {
        let dir = tempfile::tempdir().unwrap();
        let response = router(dir.path())
            .oneshot(
                Request::post("/")
                    .header("authorization", "Bearer good")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"question": "What is the storage temperature?"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["complianceSummary"], "Disclose fees.");
        assert_eq!(body["customerAnswer"], "Storage is at -196C.");
        assert_eq!(body["sources"], serde_json::json!([]));
        assert_eq!(body["usedRetrieval"], false);
        assert_eq!(body["user"], "rep@example.com");
        assert_eq!(body["documentsUsed"], 0);
    }

    #[tokio::test]
    async fn test_list_and_delete_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalDocumentStore::new(dir.path()).unwrap();
        let metadata = crate::types::DocumentMetadata {
            uploaded_by: "rep@example.com".to_string(),
            original_name: "policy.txt".to_string(),
            upload_time: "20250101_120000".to_string(),
            description: None,
        };
        crate::providers::DocumentStoreProvider::put(
            &store,
            "uploads/20250101_120000_policy.txt",
            b"Storage temperature: -196C",
            &metadata,
        )
        .await
        .unwrap();

        let app = router(dir.path());
        let response = app
            .clone()
            .oneshot(
                Request::get("/files")
                    .header("authorization", "Bearer good")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(body["count"], 1);
        assert_eq!(body["files"][0]["name"], "20250101_120000_policy.txt");
        assert_eq!(body["files"][0]["contentType"], "text/plain");

        let response = app
            .clone()
            .oneshot(
                Request::delete("/files/20250101_120000_policy.txt")
                    .header("authorization", "Bearer good")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["deleted_by"], "rep@example.com");

        let response = app
            .oneshot(
                Request::delete("/files/20250101_120000_policy.txt")
                    .header("authorization", "Bearer good")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_upload_rejects_unsupported_type() {
        let dir = tempfile::tempdir().unwrap();
        let boundary = "XBOUNDARY";
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"sheet.xlsx\"\r\nContent-Type: application/octet-stream\r\n\r\ndata\r\n--{b}--\r\n",
            b = boundary
        );
        let response = router(dir.path())
            .oneshot(
                Request::post("/upload")
                    .header("authorization", "Bearer good")
                    .header(
                        "content-type",
                        format!("multipart/form-data; boundary={}", boundary),
                    )
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"]["type"], "unsupported_type");
    }

    #[tokio::test]
    async fn test_upload_stores_timestamped_file() {
        let dir = tempfile::tempdir().unwrap();
        let boundary = "XBOUNDARY";
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"faq.txt\"\r\nContent-Type: text/plain\r\n\r\nStorage temperature: -196C\r\n--{b}\r\nContent-Disposition: form-data; name=\"description\"\r\n\r\nFAQ sheet\r\n--{b}--\r\n",
            b = boundary
        );
        let response = router(dir.path())
            .oneshot(
                Request::post("/upload")
                    .header("authorization", "Bearer good")
                    .header(
                        "content-type",
                        format!("multipart/form-data; boundary={}", boundary),
                    )
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        let filename = body["filename"].as_str().unwrap();
        assert!(filename.ends_with("_faq.txt"));
        assert_eq!(filename.len(), "20250101_120000_faq.txt".len());

        let store = LocalDocumentStore::new(dir.path()).unwrap();
        let docs = crate::providers::DocumentStoreProvider::list(&store, "uploads/")
            .await
            .unwrap();
        assert_eq!(docs.len(), 1);
        let metadata = docs[0].metadata.as_ref().unwrap();
        assert_eq!(metadata.original_name, "faq.txt");
        assert_eq!(metadata.description.as_deref(), Some("FAQ sheet"));
    }
}
