//! Firebase ID token verification
//!
//! Tokens are RS256 JWTs signed by Google's `securetoken` service account. The
//! public keys are fetched as a JWK set and cached.

use async_trait::async_trait;
use jsonwebtoken::{decode, decode_header, jwk::JwkSet, Algorithm, DecodingKey, Validation};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use super::identity::IdentityVerifier;
use crate::error::{Error, Result};
use crate::types::Identity;

/// Google's published signing keys for Firebase ID tokens
pub const FIREBASE_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

const KEY_CACHE_TTL: Duration = Duration::from_secs(60 * 60);

/// Firebase ID token verifier
pub struct FirebaseTokenVerifier {
    project_id: String,
    jwks_url: String,
    client: reqwest::Client,
    /// Cached signing keys
    keys: RwLock<Option<CachedKeys>>,
}

struct CachedKeys {
    keys: JwkSet,
    fetched_at: Instant,
}

#[derive(Debug, serde::Deserialize)]
struct FirebaseClaims {
    sub: String,
    #[serde(default)]
    email: Option<String>,
}

impl FirebaseTokenVerifier {
    /// Create a verifier for tokens issued to `project_id`
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            jwks_url: FIREBASE_JWKS_URL.to_string(),
            client: reqwest::Client::new(),
            keys: RwLock::new(None),
        }
    }

    /// Override the JWK set URL
    pub fn with_jwks_url(mut self, url: impl Into<String>) -> Self {
        self.jwks_url = url.into();
        self
    }

    /// Get the signing keys, refetching when stale or when `force` is set
    async fn signing_keys(&self, force: bool) -> Result<JwkSet> {
        if !force {
            let cached = self.keys.read().await;
            if let Some(ref cached) = *cached {
                if cached.fetched_at.elapsed() < KEY_CACHE_TTL {
                    return Ok(cached.keys.clone());
                }
            }
        }

        let response = self
            .client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| Error::unauthorized(format!("Failed to fetch signing keys: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::unauthorized(format!(
                "Failed to fetch signing keys: HTTP {}",
                response.status()
            )));
        }

        let keys: JwkSet = response
            .json()
            .await
            .map_err(|e| Error::unauthorized(format!("Invalid signing key set: {}", e)))?;

        let mut cached = self.keys.write().await;
        *cached = Some(CachedKeys {
            keys: keys.clone(),
            fetched_at: Instant::now(),
        });
        Ok(keys)
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[&self.project_id]);
        validation.set_issuer(&[format!("https://securetoken.google.com/{}", self.project_id)]);
        validation
    }
}

#[async_trait]
impl IdentityVerifier for FirebaseTokenVerifier {
    async fn verify(&self, token: &str) -> Result<Identity> {
        let header = decode_header(token)
            .map_err(|e| Error::unauthorized(format!("Malformed token: {}", e)))?;
        if header.alg != Algorithm::RS256 {
            return Err(Error::unauthorized(format!(
                "Unexpected token algorithm {:?}",
                header.alg
            )));
        }
        let kid = header
            .kid
            .ok_or_else(|| Error::unauthorized("Token has no key id"))?;

        // Keys rotate; an unknown kid gets one forced refresh
        let mut keys = self.signing_keys(false).await?;
        if keys.find(&kid).is_none() {
            keys = self.signing_keys(true).await?;
        }
        let jwk = keys
            .find(&kid)
            .ok_or_else(|| Error::unauthorized("Token signed by unknown key"))?;
        let key = DecodingKey::from_jwk(jwk)
            .map_err(|e| Error::unauthorized(format!("Unusable signing key: {}", e)))?;

        let data = decode::<FirebaseClaims>(token, &key, &self.validation())
            .map_err(|e| Error::unauthorized(format!("Invalid token: {}", e)))?;

        if data.claims.sub.is_empty() {
            return Err(Error::unauthorized("Token has empty subject"));
        }

        Ok(Identity {
            uid: data.claims.sub,
            email: data.claims.email,
        })
    }

    fn name(&self) -> &str {
        "firebase"
    }
}
