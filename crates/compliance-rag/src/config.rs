//! Configuration for the compliance RAG service

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Environment variable naming the TOML configuration file
pub const CONFIG_PATH_ENV: &str = "COMPLIANCE_RAG_CONFIG";

/// Main service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Backend provider (local or gcp)
    pub backend: BackendProvider,
    /// Server configuration
    pub server: ServerConfig,
    /// Document storage configuration
    pub storage: StorageConfig,
    /// Context assembly limits and fallback policy
    pub context: ContextConfig,
    /// Ollama/LLM configuration (local backend)
    pub llm: LlmConfig,
    /// Bearer credential verification
    pub auth: AuthConfig,
    /// GCP configuration (required when backend = gcp)
    pub gcp: Option<GcpConfig>,
}

impl RagConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| Error::Config(format!("Invalid config: {}", e)))
    }

    /// Load from `COMPLIANCE_RAG_CONFIG` if set, otherwise use defaults.
    /// `PORT` overrides `server.port` in both cases.
    pub fn load() -> Result<Self> {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_file(path)?,
            Err(_) => Self::default(),
        };
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(port) = std::env::var("PORT") {
            self.server.port = port
                .parse()
                .map_err(|e| Error::Config(format!("Invalid PORT '{}': {}", port, e)))?;
        }
        Ok(())
    }

    /// Reject inconsistent settings
    pub fn validate(&self) -> Result<()> {
        if self.backend == BackendProvider::Gcp && self.gcp.is_none() {
            return Err(Error::Config(
                "GCP backend selected but gcp config is missing".to_string(),
            ));
        }
        if self.context.semantic_keep > self.context.semantic_top_k {
            return Err(Error::Config(format!(
                "context.semantic_keep ({}) must not exceed context.semantic_top_k ({})",
                self.context.semantic_keep, self.context.semantic_top_k
            )));
        }
        if self.context.naive_max_documents == 0 {
            return Err(Error::Config(
                "context.naive_max_documents must be at least 1".to_string(),
            ));
        }
        if self.auth.mode == AuthMode::Firebase && self.auth.project_id.is_none() {
            return Err(Error::Config(
                "Firebase auth requires auth.project_id".to_string(),
            ));
        }
        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Origins allowed by CORS (empty = any)
    pub cors_origins: Vec<String>,
    /// Maximum upload size in bytes (default: 25MB)
    pub max_upload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            cors_origins: vec!["http://localhost:3000".to_string()],
            max_upload_size: 25 * 1024 * 1024,
        }
    }
}

/// Document storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root directory for the local document store
    pub local_root: PathBuf,
    /// Path prefix under which uploads are stored
    pub upload_prefix: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            local_root: dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("compliance-rag")
                .join("documents"),
            upload_prefix: "uploads/".to_string(),
        }
    }
}

/// What to do when semantic retrieval is unavailable
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RetrievalFallback {
    /// Inject truncated document text
    #[default]
    Naive,
    /// Prompt without document context
    None,
}

/// Context assembly configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Maximum documents included by the naive strategy
    pub naive_max_documents: usize,
    /// Characters kept per document by the naive strategy
    pub naive_max_chars: usize,
    /// Chunks requested from the semantic retrieval service
    pub semantic_top_k: usize,
    /// Chunks kept after sorting by similarity
    pub semantic_keep: usize,
    /// Minimum similarity for retrieved chunks
    pub similarity_threshold: f32,
    /// Characters kept per retrieved chunk
    pub chunk_max_chars: usize,
    /// Strategy used when semantic retrieval fails
    pub fallback: RetrievalFallback,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            naive_max_documents: 10,
            naive_max_chars: 2000,
            semantic_top_k: 5,
            semantic_keep: 3,
            similarity_threshold: 0.5,
            chunk_max_chars: 500,
            fallback: RetrievalFallback::Naive,
        }
    }
}

/// LLM (Ollama) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Ollama base URL
    pub base_url: String,
    /// Generation model name
    pub generate_model: String,
    /// Temperature for generation
    pub temperature: f32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            generate_model: "llama3.2:3b".to_string(),
            temperature: 0.2,
            timeout_secs: 120,
        }
    }
}

/// Bearer credential verification mode
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    /// Firebase ID tokens checked against Google's signing keys
    #[default]
    Firebase,
    /// Fixed token table, for local development
    Static,
}

/// Authentication configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Verification mode
    pub mode: AuthMode,
    /// Firebase project ID (audience of ID tokens)
    pub project_id: Option<String>,
    /// Token -> email table for `static` mode
    pub static_tokens: HashMap<String, String>,
}

/// Backend provider selection
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BackendProvider {
    /// Local backend (filesystem + Ollama, no semantic retrieval)
    #[default]
    Local,
    /// Google Cloud Platform (GCS + Gemini + Vertex AI RAG Engine)
    Gcp,
}

/// Google Cloud Platform configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GcpConfig {
    /// Path to service account JSON key file
    pub service_account_key_path: PathBuf,
    /// GCP project ID
    pub project_id: String,
    /// GCP region (e.g., "us-central1")
    #[serde(default = "default_location")]
    pub location: String,
    /// GCS bucket for document storage (default: "<project>-rag-docs")
    #[serde(default)]
    pub gcs_bucket: Option<String>,
    /// Generation model (default: "gemini-1.5-flash-002")
    #[serde(default = "default_generation_model")]
    pub generation_model: String,
    /// Display name of the RAG Engine corpus; semantic retrieval is disabled when unset
    #[serde(default)]
    pub rag_corpus: Option<String>,
}

impl GcpConfig {
    /// Bucket name, derived from the project when not configured
    pub fn bucket(&self) -> String {
        self.gcs_bucket
            .clone()
            .unwrap_or_else(|| format!("{}-rag-docs", self.project_id))
    }
}

fn default_location() -> String {
    "us-central1".to_string()
}

fn default_generation_model() -> String {
    "gemini-1.5-flash-002".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_pipeline_limits() {
        let config = RagConfig::default();
        assert_eq!(config.context.naive_max_documents, 10);
        assert_eq!(config.context.naive_max_chars, 2000);
        assert_eq!(config.context.semantic_top_k, 5);
        assert_eq!(config.context.semantic_keep, 3);
        assert_eq!(config.context.chunk_max_chars, 500);
        assert_eq!(config.storage.upload_prefix, "uploads/");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = RagConfig::from_toml_str(
            r#"
            backend = "gcp"

            [server]
            port = 9000

            [auth]
            mode = "static"
            static_tokens = { "dev-token" = "rep@example.com" }

            [gcp]
            service_account_key_path = "/secrets/key.json"
            project_id = "cryocord-ai-platform"
            rag_corpus = "sales-compliance"
            "#,
        )
        .unwrap();

        assert_eq!(config.backend, BackendProvider::Gcp);
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.auth.mode, AuthMode::Static);
        let gcp = config.gcp.as_ref().unwrap();
        assert_eq!(gcp.bucket(), "cryocord-ai-platform-rag-docs");
        assert_eq!(gcp.location, "us-central1");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_gcp_without_section() {
        let config = RagConfig {
            backend: BackendProvider::Gcp,
            auth: AuthConfig {
                mode: AuthMode::Static,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_keep_above_top_k() {
        let mut config = RagConfig::default();
        config.auth.mode = AuthMode::Static;
        config.context.semantic_keep = 6;
        assert!(config.validate().is_err());
    }
}
