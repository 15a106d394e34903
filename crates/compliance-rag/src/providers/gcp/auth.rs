//! GCP authentication using a service account key
//!
//! Exchanges a self-signed RS256 JWT for an OAuth2 access token used by the
//! Vertex AI endpoints (Gemini, RAG Engine).

use base64::Engine;
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::error::{Error, Result};

const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

/// GCP authentication manager
pub struct GcpAuth {
    /// Parsed service account key
    key: ServiceAccountKey,
    /// Project ID
    project_id: String,
    /// Cached access token
    token: RwLock<Option<CachedToken>>,
}

#[derive(Clone, serde::Deserialize)]
struct ServiceAccountKey {
    client_email: String,
    private_key: String,
    token_uri: String,
}

#[derive(Clone)]
struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

#[derive(serde::Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

impl GcpAuth {
    /// Create from service account JSON key file
    pub fn from_service_account(key_path: impl AsRef<Path>, project_id: String) -> Result<Self> {
        let key_path = key_path.as_ref();
        let raw = std::fs::read_to_string(key_path).map_err(|e| {
            Error::Config(format!(
                "Failed to read service account key {}: {}",
                key_path.display(),
                e
            ))
        })?;
        let key: ServiceAccountKey = serde_json::from_str(&raw).map_err(|e| {
            Error::Config(format!("Invalid service account key format: {}", e))
        })?;

        Ok(Self {
            key,
            project_id,
            token: RwLock::new(None),
        })
    }

    /// Get project ID
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Get a valid access token (refreshing if needed)
    pub async fn get_token(&self) -> Result<String> {
        {
            let token = self.token.read().await;
            if let Some(ref cached) = *token {
                if cached.expires_at > Instant::now() + Duration::from_secs(60) {
                    return Ok(cached.access_token.clone());
                }
            }
        }

        let response = self.exchange_jwt().await?;
        // Tokens are valid for an hour unless the server says otherwise
        let lifetime = response.expires_in.unwrap_or(3600).saturating_sub(300);

        let mut token = self.token.write().await;
        *token = Some(CachedToken {
            access_token: response.access_token.clone(),
            expires_at: Instant::now() + Duration::from_secs(lifetime),
        });

        Ok(response.access_token)
    }

    /// Build and sign the assertion JWT
    fn signed_assertion(&self) -> Result<String> {
        let now = chrono::Utc::now().timestamp();
        let claims = serde_json::json!({
            "iss": self.key.client_email,
            "scope": CLOUD_PLATFORM_SCOPE,
            "aud": self.key.token_uri,
            "iat": now,
            "exp": now + 3600,
        });

        let b64 = base64::engine::general_purpose::URL_SAFE_NO_PAD;
        let signing_input = format!(
            "{}.{}",
            b64.encode(r#"{"alg":"RS256","typ":"JWT"}"#.as_bytes()),
            b64.encode(claims.to_string().as_bytes())
        );

        let private_key = self.key.private_key.replace("\\n", "\n");
        let pem = pem::parse(&private_key)
            .map_err(|e| Error::Config(format!("Failed to parse private key PEM: {}", e)))?;
        let key_pair = ring::signature::RsaKeyPair::from_pkcs8(pem.contents())
            .map_err(|e| Error::Config(format!("Failed to parse private key: {:?}", e)))?;

        let mut signature = vec![0u8; key_pair.public().modulus_len()];
        key_pair
            .sign(
                &ring::signature::RSA_PKCS1_SHA256,
                &ring::rand::SystemRandom::new(),
                signing_input.as_bytes(),
                &mut signature,
            )
            .map_err(|e| Error::Config(format!("Failed to sign JWT: {:?}", e)))?;

        Ok(format!("{}.{}", signing_input, b64.encode(&signature)))
    }

    /// Exchange the assertion for an access token
    async fn exchange_jwt(&self) -> Result<TokenResponse> {
        let assertion = self.signed_assertion()?;

        let response = reqwest::Client::new()
            .post(&self.key.token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await
            .map_err(|e| Error::Config(format!("Token exchange request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Config(format!(
                "Token exchange failed ({}): {}",
                status, body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| Error::Config(format!("Failed to parse token response: {}", e)))
    }

    /// Create HTTP client with auth headers
    pub async fn authorized_client(&self) -> Result<reqwest::Client> {
        let token = self.get_token().await?;
        let mut headers = reqwest::header::HeaderMap::new();
        let value = reqwest::header::HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|e| Error::internal(format!("Invalid access token header: {}", e)))?;
        headers.insert(reqwest::header::AUTHORIZATION, value);

        reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| Error::internal(format!("Failed to build HTTP client: {}", e)))
    }
}
