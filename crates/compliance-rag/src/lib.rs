//! compliance-rag: sales-compliance answers grounded in uploaded documents
//!
//! Each question is answered with two sections: an internal compliance summary
//! and a customer-facing reply. Context comes from a managed semantic retrieval
//! corpus when one is configured, otherwise from the truncated text of the
//! uploaded documents.

pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod providers;
pub mod query;
pub mod retrieval;
pub mod server;
pub mod types;

pub use config::RagConfig;
pub use error::{Error, Result};
pub use query::QueryOrchestrator;
pub use types::{
    document::{DocumentMetadata, FileType, StoredDocument},
    query::{Identity, QueryRequest},
    response::{QueryResponse, QueryResult},
};
