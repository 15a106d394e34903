//! Query request and requester identity types

use serde::{Deserialize, Serialize};

/// Body of the query endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    /// The sales-compliance question to answer
    #[serde(default)]
    pub question: Option<String>,
}

/// A verified requester
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identity {
    /// Stable user id (token subject)
    pub uid: String,
    /// Email address, when the token carries one
    pub email: Option<String>,
}

impl Identity {
    /// Email-like label used in logs, results and upload metadata
    pub fn label(&self) -> &str {
        self.email.as_deref().unwrap_or("unknown")
    }
}
