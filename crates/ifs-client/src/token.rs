//! OAuth2 client-credentials token lifecycle.
//!
//! [`TokenManager`] hands out bearer tokens, fetching a new one from the
//! token endpoint only when neither its in-memory slot nor the optional
//! external [`TokenCache`] holds one that is still fresh.
//!
//! A token is fresh while `now + 60s < expires_at`.
//!
//! Concurrent callers may each decide the token is stale and fetch a new
//! one. The slot lock is never held across the token request, so this only
//! costs extra token calls. The external cache is last-write-wins.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;

use ifs_common::{Config, Credentials, TOKEN_SAFETY_MARGIN_SECS};

use crate::clock::{Clock, SystemClock};
use crate::error::ClientError;

/// A bearer token and the instant it stops being valid.
///
/// `expires_at` serializes as Unix seconds so cached entries stay readable
/// by other processes sharing the cache.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedToken {
    /// The bearer token.
    pub access_token: String,
    /// Expiry instant.
    #[serde(with = "chrono::serde::ts_seconds")]
    pub expires_at: DateTime<Utc>,
}

impl CachedToken {
    /// Creates a token expiring at `expires_at`.
    pub fn new(access_token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            access_token: access_token.into(),
            expires_at,
        }
    }

    /// Whether the token may still be handed out at `now`.
    #[must_use]
    pub fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now + TimeDelta::seconds(TOKEN_SAFETY_MARGIN_SECS)
    }

    /// Remaining lifetime at `now` in whole minutes, rounded to nearest.
    #[must_use]
    pub fn remaining_minutes(&self, now: DateTime<Utc>) -> u64 {
        let seconds = (self.expires_at - now).num_seconds().max(0);
        u64::try_from((seconds + 30) / 60).unwrap_or(0)
    }
}

impl fmt::Debug for CachedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedToken")
            .field("access_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// External key-value store used to share tokens across clients and
/// process restarts.
///
/// Implementations handle their own storage errors; a failed `get` is a
/// miss and a failed `put` is dropped.
#[async_trait]
pub trait TokenCache: Send + Sync {
    /// Returns the entry stored under `key`, if any.
    async fn get(&self, key: &str) -> Option<CachedToken>;

    /// Stores `token` under `key` for `ttl_minutes`.
    async fn put(&self, key: &str, token: CachedToken, ttl_minutes: u64);
}

/// Process-local [`TokenCache`] honouring entry TTLs.
///
/// Useful for sharing one token between several [`crate::IfsClient`]s built
/// from different configurations.
#[derive(Debug)]
pub struct InMemoryTokenCache {
    entries: DashMap<String, (CachedToken, DateTime<Utc>)>,
    clock: Arc<dyn Clock>,
}

impl Default for InMemoryTokenCache {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryTokenCache {
    /// Creates an empty cache using the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates an empty cache using `clock` for TTL checks.
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
        }
    }

    /// Number of stored entries, including ones past their TTL.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl TokenCache for InMemoryTokenCache {
    async fn get(&self, key: &str) -> Option<CachedToken> {
        let now = self.clock.now();
        let hit = self.entries.get(key).and_then(|entry| {
            let (token, evict_at) = entry.value();
            (*evict_at > now).then(|| token.clone())
        });
        if hit.is_none() {
            self.entries.remove_if(key, |_, (_, evict_at)| *evict_at <= now);
        }
        hit
    }

    async fn put(&self, key: &str, token: CachedToken, ttl_minutes: u64) {
        if ttl_minutes == 0 {
            self.entries.remove(key);
            return;
        }
        let ttl = i64::try_from(ttl_minutes)
            .ok()
            .and_then(TimeDelta::try_minutes)
            .unwrap_or(TimeDelta::MAX);
        let evict_at = self
            .clock
            .now()
            .checked_add_signed(ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.entries.insert(key.to_string(), (token, evict_at));
    }
}

/// Body returned by the token endpoint.
///
/// Some identity providers send `expires_in` as a string or a float, so it is
/// read loosely and coerced by [`lifetime_seconds`].
#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    expires_in: Option<Value>,
}

/// Reads a token lifetime given as an integer, a float or a numeric string.
fn lifetime_seconds(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().and_then(whole_seconds)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<u64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(whole_seconds))
        }
        _ => None,
    }
}

// Saturates above u64::MAX.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn whole_seconds(seconds: f64) -> Option<u64> {
    (seconds.is_finite() && seconds >= 0.0).then(|| seconds.round() as u64)
}

/// Acquires, caches and refreshes client-credentials bearer tokens.
pub struct TokenManager {
    http: reqwest::Client,
    credentials: Credentials,
    token_ttl_seconds: u64,
    cache_key: String,
    cache: Option<Arc<dyn TokenCache>>,
    clock: Arc<dyn Clock>,
    current: RwLock<Option<CachedToken>>,
}

impl fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenManager")
            .field("credentials", &self.credentials)
            .field("token_ttl_seconds", &self.token_ttl_seconds)
            .field("cache_key", &self.cache_key)
            .field("has_external_cache", &self.cache.is_some())
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

impl TokenManager {
    /// Creates a token manager from the client configuration.
    ///
    /// The token HTTP client uses `config.token_timeout()`, independent of
    /// the API request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials are incomplete or the HTTP client
    /// cannot be built.
    pub fn new(
        config: &Config,
        cache: Option<Arc<dyn TokenCache>>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ClientError> {
        let credentials = config
            .credentials()
            .map_err(|e| ClientError::ConfigurationError(e.to_string()))?;

        let http = reqwest::Client::builder()
            .timeout(config.token_timeout())
            .build()
            .map_err(|e| {
                ClientError::ConfigurationError(format!("Failed to build token HTTP client: {e}"))
            })?;

        Ok(Self {
            http,
            credentials,
            token_ttl_seconds: config.token_ttl_seconds,
            cache_key: config.token_cache_key.clone(),
            cache,
            clock,
            current: RwLock::new(None),
        })
    }

    /// Returns a bearer token that stays valid for at least another minute.
    ///
    /// Checks the in-memory slot, then the external cache, then requests a
    /// new token. No retries are attempted.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::TokenAcquisitionFailed`] if the token endpoint
    /// cannot be reached, answers with a non-2xx status, or omits
    /// `access_token`.
    pub async fn token(&self) -> Result<String, ClientError> {
        let now = self.clock.now();

        if let Some(token) = self
            .current
            .read()
            .await
            .as_ref()
            .filter(|t| t.is_fresh_at(now))
        {
            return Ok(token.access_token.clone());
        }

        if let Some(cache) = &self.cache
            && let Some(token) = cache.get(&self.cache_key).await
            && token.is_fresh_at(now)
        {
            debug!("Adopted IFS token from external cache, expires at {}", token.expires_at);
            let access_token = token.access_token.clone();
            *self.current.write().await = Some(token);
            return Ok(access_token);
        }

        let token = self.fetch().await?;
        let access_token = token.access_token.clone();
        *self.current.write().await = Some(token.clone());

        if let Some(cache) = &self.cache {
            let ttl_minutes = token.remaining_minutes(self.clock.now());
            cache.put(&self.cache_key, token, ttl_minutes).await;
        }

        Ok(access_token)
    }

    /// The token currently held in memory, fresh or not.
    pub async fn current(&self) -> Option<CachedToken> {
        self.current.read().await.clone()
    }

    /// Drops the in-memory token so the next call re-checks the cache and
    /// endpoint.
    pub async fn clear(&self) {
        *self.current.write().await = None;
    }

    async fn fetch(&self) -> Result<CachedToken, ClientError> {
        debug!(
            "Requesting IFS token for client {} from {}",
            self.credentials.client_id, self.credentials.token_endpoint
        );

        let transport_error = |e: reqwest::Error| {
            error!("OAuth token request failed: {e}");
            ClientError::TokenAcquisitionFailed {
                message: e.to_string(),
                status: e.status().map_or(0, |s| s.as_u16()),
                source: Some(e),
            }
        };

        let response = self
            .http
            .post(&self.credentials.token_endpoint)
            .header("Accept", "application/json")
            .form(&self.credentials.grant_form())
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;

        if !status.is_success() {
            error!(
                "Token endpoint returned status {}: {}",
                status.as_u16(),
                body
            );
            return Err(ClientError::TokenAcquisitionFailed {
                message: format!("token endpoint returned HTTP {}", status.as_u16()),
                status: status.as_u16(),
                source: None,
            });
        }

        let parsed: TokenResponse = serde_json::from_str(&body).map_err(|e| {
            error!("Token endpoint returned malformed JSON: {e}");
            ClientError::TokenAcquisitionFailed {
                message: format!("malformed token response: {e}"),
                status: status.as_u16(),
                source: None,
            }
        })?;

        let access_token = parsed
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                error!("Token endpoint response did not contain an access_token");
                ClientError::TokenAcquisitionFailed {
                    message: "Failed to obtain access token".to_string(),
                    status: status.as_u16(),
                    source: None,
                }
            })?;

        let lifetime = match parsed.expires_in.as_ref() {
            None | Some(Value::Null) => self.token_ttl_seconds,
            Some(raw) => lifetime_seconds(raw).unwrap_or_else(|| {
                warn!(
                    "Ignoring unreadable expires_in {raw}, using {}s",
                    self.token_ttl_seconds
                );
                self.token_ttl_seconds
            }),
        };
        let lifetime = i64::try_from(lifetime)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .unwrap_or(TimeDelta::MAX);
        let expires_at = self
            .clock
            .now()
            .checked_add_signed(lifetime)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        info!("Obtained IFS token, expires at {expires_at}");
        Ok(CachedToken::new(access_token, expires_at))
    }
}
