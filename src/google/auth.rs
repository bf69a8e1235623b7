// src/google/auth.rs
//! OAuth2 JWT-bearer flow for a Google service account

use anyhow::{Context, Result};
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info};

pub const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
pub const GMAIL_SEND_SCOPE: &str = "https://www.googleapis.com/auth/gmail.send";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const TOKEN_LIFETIME_SECS: i64 = 3600;
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// The subset of a service-account JSON key file used here
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl ServiceAccountKey {
    pub async fn from_file(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read service account file: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Invalid service account file: {}", path.display()))
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct AssertionClaims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
}

impl AssertionClaims {
    pub fn new(key: &ServiceAccountKey, scope: &str, subject: Option<&str>, now: i64) -> Self {
        Self {
            iss: key.client_email.clone(),
            scope: scope.to_string(),
            aud: key.token_uri.clone(),
            iat: now,
            exp: now + TOKEN_LIFETIME_SECS,
            sub: subject.map(str::to_string),
        }
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

struct CachedToken {
    value: String,
    refresh_at: Instant,
}

enum TokenSource {
    ServiceAccount {
        key: Arc<ServiceAccountKey>,
        scope: String,
        subject: Option<String>,
    },
    Fixed(String),
}

/// Access tokens for one scope, refreshed shortly before expiry
pub struct GoogleTokenProvider {
    client: reqwest::Client,
    source: TokenSource,
    cached: Mutex<Option<CachedToken>>,
}

impl GoogleTokenProvider {
    /// `subject` is the mailbox to impersonate (domain-wide delegation)
    pub fn service_account(key: Arc<ServiceAccountKey>, scope: &str, subject: Option<&str>) -> Self {
        Self {
            client: reqwest::Client::new(),
            source: TokenSource::ServiceAccount {
                key,
                scope: scope.to_string(),
                subject: subject.map(str::to_string),
            },
            cached: Mutex::new(None),
        }
    }

    /// A pre-issued access token
    pub fn fixed(token: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            source: TokenSource::Fixed(token.to_string()),
            cached: Mutex::new(None),
        }
    }

    pub async fn access_token(&self) -> Result<String> {
        let (key, scope, subject) = match &self.source {
            TokenSource::Fixed(token) => return Ok(token.clone()),
            TokenSource::ServiceAccount { key, scope, subject } => (key, scope, subject),
        };

        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.refresh_at {
                return Ok(token.value.clone());
            }
        }

        debug!("Requesting Google access token for scope {}", scope);
        let claims = AssertionClaims::new(key, scope, subject.as_deref(), Utc::now().timestamp());
        let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .context("Service account private key is not a valid RSA PEM")?;
        let assertion = encode(&Header::new(Algorithm::RS256), &claims, &signing_key)
            .context("Failed to sign service account assertion")?;

        let response = self
            .client
            .post(&key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .context("Google token request failed")?;
        let response = super::ensure_success(response, "Google OAuth").await?;

        let token: TokenResponse = response
            .json()
            .await
            .context("Failed to parse Google token response")?;

        let lifetime = Duration::from_secs(token.expires_in.unwrap_or(TOKEN_LIFETIME_SECS as u64));
        *cached = Some(CachedToken {
            value: token.access_token.clone(),
            refresh_at: Instant::now() + lifetime.saturating_sub(REFRESH_MARGIN),
        });

        info!("Obtained Google access token for {}", key.client_email);
        Ok(token.access_token)
    }
}
