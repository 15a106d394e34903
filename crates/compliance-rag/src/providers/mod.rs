//! Provider abstractions for document storage, generation, semantic retrieval and identity
//!
//! This module provides trait-based abstractions that allow switching between
//! local (filesystem + Ollama) and cloud (GCP) backends.

pub mod document_store;
pub mod firebase;
pub mod identity;
pub mod llm;
pub mod local;
pub mod ollama;
pub mod retrieval;

#[cfg(feature = "gcp")]
pub mod gcp;

pub use document_store::DocumentStoreProvider;
pub use firebase::FirebaseTokenVerifier;
pub use identity::{IdentityVerifier, StaticTokenVerifier};
pub use llm::LlmProvider;
pub use retrieval::{CorpusRef, RetrievedChunk, SemanticRetrievalProvider};
