//! Credentials for the Drive API: service account JWT exchange or a
//! pre-issued bearer token.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::Serialize;
use tokio::sync::RwLock;

use crate::error::{DriveError, Result};
use crate::models::{ServiceAccountCredentials, TokenResponse};

/// Google OAuth2 token endpoint.
const TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Read-only Drive scope; the mirror never writes remotely.
const DRIVE_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/drive.readonly";

/// JWT claims for service account authentication.
#[derive(Debug, Serialize)]
struct Claims {
    iss: String,   // Issuer (service account email)
    scope: String, // OAuth scope
    aud: String,   // Audience (token endpoint)
    exp: u64,      // Expiration time
    iat: u64,      // Issued at
}

/// Cached access token with expiration.
#[derive(Clone)]
struct CachedToken {
    access_token: String,
    expires_at: SystemTime,
}

#[derive(Clone)]
enum TokenSource {
    ServiceAccount {
        credentials: Arc<ServiceAccountCredentials>,
        client: Client,
        cached_token: Arc<RwLock<Option<CachedToken>>>,
    },
    Static(String),
}

/// Supplies bearer tokens to the Drive client.
#[derive(Clone)]
pub struct Authenticator {
    source: TokenSource,
}

impl Authenticator {
    /// Create an authenticator from a service account JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let credentials: ServiceAccountCredentials = serde_json::from_str(&content)?;
        Ok(Self::new(credentials))
    }

    /// Create an authenticator from service account credentials.
    pub fn new(credentials: ServiceAccountCredentials) -> Self {
        Self {
            source: TokenSource::ServiceAccount {
                credentials: Arc::new(credentials),
                client: Client::new(),
                cached_token: Arc::new(RwLock::new(None)),
            },
        }
    }

    /// Use an access token obtained elsewhere. It is never refreshed.
    pub fn from_access_token(token: impl Into<String>) -> Self {
        Self {
            source: TokenSource::Static(token.into()),
        }
    }

    /// Get a valid access token, refreshing if necessary.
    pub async fn get_access_token(&self) -> Result<String> {
        let (credentials, client, cached_token) = match &self.source {
            TokenSource::Static(token) => return Ok(token.clone()),
            TokenSource::ServiceAccount {
                credentials,
                client,
                cached_token,
            } => (credentials, client, cached_token),
        };

        {
            let cached = cached_token.read().await;
            if let Some(token) = cached.as_ref() {
                // 60 second buffer before expiration
                let buffer = Duration::from_secs(60);
                if token.expires_at > SystemTime::now() + buffer {
                    return Ok(token.access_token.clone());
                }
            }
        }

        let new_token = refresh_token(credentials, client).await?;
        *cached_token.write().await = Some(new_token.clone());

        Ok(new_token.access_token)
    }
}

/// Exchange a signed JWT assertion for an access token.
async fn refresh_token(
    credentials: &ServiceAccountCredentials,
    client: &Client,
) -> Result<CachedToken> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| DriveError::AuthenticationError(e.to_string()))?
        .as_secs();
    let token_uri = credentials.token_uri.as_deref().unwrap_or(TOKEN_URI);

    let claims = Claims {
        iss: credentials.client_email.clone(),
        scope: DRIVE_READONLY_SCOPE.to_string(),
        aud: token_uri.to_string(),
        iat: now,
        exp: now + 3600,
    };

    let header = Header::new(Algorithm::RS256);
    let key = EncodingKey::from_rsa_pem(credentials.private_key.as_bytes())?;
    let jwt = encode(&header, &claims, &key)?;

    let params = [
        ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
        ("assertion", &jwt),
    ];

    tracing::debug!(client_email = %credentials.client_email, "Refreshing access token");
    let response = client.post(token_uri).form(&params).send().await?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(DriveError::TokenRefreshError(format!(
            "Status {}: {}",
            status, body
        )));
    }

    let token_response: TokenResponse = response.json().await?;
    let expires_at = SystemTime::now() + Duration::from_secs(token_response.expires_in);

    Ok(CachedToken {
        access_token: token_response.access_token,
        expires_at,
    })
}
