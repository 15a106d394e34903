//! Google Cloud Platform provider implementations
//!
//! - Gemini on Vertex AI for answer generation
//! - Vertex AI RAG Engine for semantic retrieval
//! - Google Cloud Storage for uploaded documents

mod auth;
mod gcs_store;
mod gemini_client;
mod rag_corpus;

pub use auth::GcpAuth;
pub use gcs_store::GcsDocumentStore;
pub use gemini_client::GeminiClient;
pub use rag_corpus::VertexRagRetriever;
