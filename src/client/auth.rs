//! OAuth2 client-credentials flow and token caching

use std::time::{Duration, Instant};

use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use super::config::{SearchConfig, AUTH_AUDIENCE};
use super::error::{ClientError, Result};

/// Safety margin subtracted from expiry when judging cache validity
pub const TOKEN_REFRESH_BUFFER: Duration = Duration::from_secs(300);

/// Token lifetime in seconds assumed when the auth server omits `expires_in`
pub const DEFAULT_EXPIRES_IN: u64 = 86_400;

/// Longest server-reported lifetime honored; keeps expiry arithmetic in range
const MAX_EXPIRES_IN: Duration = Duration::from_secs(10 * 365 * 24 * 60 * 60);

#[derive(Debug, Serialize)]
struct TokenRequest<'a> {
    grant_type: &'static str,
    client_id: &'a str,
    client_secret: &'a str,
    audience: &'static str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: CompactString,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// An access token with its expiry computed at exchange time
#[derive(Debug, Clone)]
pub struct Token {
    value: CompactString,
    expires_at: Instant,
}

impl Token {
    fn new(value: CompactString, expires_in: Duration) -> Self {
        let now = Instant::now();
        let expires_at = now.checked_add(expires_in.min(MAX_EXPIRES_IN)).unwrap_or(now);
        Self { value, expires_at }
    }

    pub fn value(&self) -> &str {
        self.value.as_str()
    }

    /// Whether the token remains usable once `buffer` is subtracted from expiry
    pub fn is_valid(&self, buffer: Duration) -> bool {
        match self.expires_at.checked_sub(buffer) {
            Some(deadline) => Instant::now() < deadline,
            None => false,
        }
    }
}

/// Exchanges client credentials for access tokens and caches the live one
///
/// At most one token is live per manager. The cache slot is replaced
/// atomically on refresh and cleared by [`TokenManager::invalidate`].
#[derive(Debug)]
pub struct TokenManager {
    client: reqwest::Client,
    config: SearchConfig,
    cached: RwLock<Option<Token>>,
}

impl TokenManager {
    pub fn new(client: reqwest::Client, config: SearchConfig) -> Self {
        Self { client, config, cached: RwLock::new(None) }
    }

    /// Return a valid access token, exchanging credentials when the cached
    /// one is absent or within the refresh buffer of its expiry
    pub async fn bearer_token(&self) -> Result<CompactString> {
        {
            let cached = self.cached.read().await;
            if let Some(token) = cached.as_ref() {
                if token.is_valid(TOKEN_REFRESH_BUFFER) {
                    return Ok(token.value.clone());
                }
            }
        }

        debug!("No valid cached token, performing token exchange");
        let token = self.authenticate().await?;
        let value = token.value.clone();
        *self.cached.write().await = Some(token);
        Ok(value)
    }

    /// Drop the cached token so the next call re-authenticates
    pub async fn invalidate(&self) {
        *self.cached.write().await = None;
    }

    #[instrument(skip(self))]
    async fn authenticate(&self) -> Result<Token> {
        let payload = TokenRequest {
            grant_type: "client_credentials",
            client_id: &self.config.client_id,
            client_secret: &self.config.client_secret,
            audience: AUTH_AUDIENCE,
        };

        let response = self
            .client
            .post(self.config.auth_url.as_str())
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                ClientError::authentication(format!("Authentication request failed: {e}"))
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            ClientError::authentication(format!("Authentication request failed: {e}"))
        })?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "Token exchange rejected");
            return Err(ClientError::authentication(format!(
                "Authentication failed: {} - {}",
                status.as_u16(),
                body
            )));
        }

        let parsed: TokenResponse = serde_json::from_str(&body).map_err(|e| {
            ClientError::authentication(format!("Authentication request failed: {e}"))
        })?;

        let expires_in = Duration::from_secs(parsed.expires_in.unwrap_or(DEFAULT_EXPIRES_IN));
        debug!(expires_in_secs = expires_in.as_secs(), "Token exchange succeeded");
        Ok(Token::new(parsed.access_token, expires_in))
    }
}
