//! Core types for the compliance RAG service

pub mod document;
pub mod query;
pub mod response;

pub use document::{DocumentMetadata, FileType, StoredDocument};
pub use query::{Identity, QueryRequest};
pub use response::{QueryResponse, QueryResult};
