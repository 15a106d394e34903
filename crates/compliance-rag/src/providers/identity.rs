//! Identity provider trait for bearer credentials

use async_trait::async_trait;
use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::types::Identity;

/// Trait for verifying opaque bearer credentials
///
/// Implementations:
/// - `FirebaseTokenVerifier`: Firebase ID tokens
/// - `StaticTokenVerifier`: fixed token table for local development
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Verify a bearer token, returning the requester identity
    async fn verify(&self, token: &str) -> Result<Identity>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}

/// Verify an `Authorization` header value. Fails closed on anything but a
/// well-formed, verifiable `Bearer` credential.
pub async fn authenticate(
    verifier: &dyn IdentityVerifier,
    authorization: Option<&str>,
) -> Result<Identity> {
    let header = authorization
        .ok_or_else(|| Error::unauthorized("Missing Authorization header"))?;
    let token = header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| Error::unauthorized("Missing Authorization header"))?;

    verifier.verify(token).await.map_err(|e| match e {
        Error::Unauthorized(_) => e,
        other => Error::unauthorized(other.to_string()),
    })
}

/// Token table verifier
pub struct StaticTokenVerifier {
    tokens: HashMap<String, String>,
}

impl StaticTokenVerifier {
    /// Create from a token -> email table
    pub fn new(tokens: HashMap<String, String>) -> Self {
        Self { tokens }
    }
}

#[async_trait]
impl IdentityVerifier for StaticTokenVerifier {
    async fn verify(&self, token: &str) -> Result<Identity> {
        self.tokens
            .get(token)
            .map(|email| Identity {
                uid: email.clone(),
                email: Some(email.clone()),
            })
            .ok_or_else(|| Error::unauthorized("Unknown token"))
    }

    fn name(&self) -> &str {
        "static"
    }
}
