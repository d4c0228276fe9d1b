//! Client-credentials token cache
//!
//! [`TokenStore`] is the one piece of shared mutable state in the client.
//! Every request path reads it; only [`CachingTokenProvider`] writes it.
//! Refreshes are single-flight: the first caller to see a stale token takes
//! the write lock and refreshes, everyone queued behind it re-checks and
//! reuses the new value.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use caspio_proxy_domain::constants::{FALLBACK_TOKEN_TTL_SECS, MAX_TOKEN_TTL_SECS};
use caspio_proxy_domain::{AuthConfig, PlatformError, Result};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use crate::clock::Clock;
use crate::ports::{AccessTokenProvider, TokenFetcher};

/// A bearer token and the instant it stops being valid
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    value: String,
    expires_at: Instant,
}

impl AccessToken {
    pub fn new(value: impl Into<String>, expires_at: Instant) -> Self {
        Self { value: value.into(), expires_at }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }

    /// True while `now < expires_at - buffer`
    pub fn is_fresh(&self, now: Instant, buffer: Duration) -> bool {
        now.checked_add(buffer).is_some_and(|edge| edge < self.expires_at)
    }
}

// Never print the token value.
impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Process-wide token slot, shared by handle
#[derive(Debug, Default)]
pub struct TokenStore {
    slot: RwLock<Option<AccessToken>>,
}

impl TokenStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Cached value if it is still fresh at `now`
    pub async fn fresh_value(&self, now: Instant, buffer: Duration) -> Option<String> {
        let slot = self.slot.read().await;
        slot.as_ref().filter(|t| t.is_fresh(now, buffer)).map(|t| t.value.clone())
    }

    pub async fn snapshot(&self) -> Option<AccessToken> {
        self.slot.read().await.clone()
    }

    pub async fn clear(&self) {
        *self.slot.write().await = None;
    }
}

/// [`AccessTokenProvider`] backed by a [`TokenStore`] and a [`TokenFetcher`]
pub struct CachingTokenProvider {
    store: Arc<TokenStore>,
    fetcher: Arc<dyn TokenFetcher>,
    clock: Arc<dyn Clock>,
    buffer: Duration,
    fetch_timeout: Duration,
}

impl CachingTokenProvider {
    pub fn new(
        store: Arc<TokenStore>,
        fetcher: Arc<dyn TokenFetcher>,
        clock: Arc<dyn Clock>,
        config: &AuthConfig,
    ) -> Self {
        Self {
            store,
            fetcher,
            clock,
            buffer: config.token_buffer(),
            fetch_timeout: config.token_timeout(),
        }
    }

    pub fn store(&self) -> &Arc<TokenStore> {
        &self.store
    }

    /// Return a valid token, refreshing when absent or inside the buffer
    ///
    /// # Errors
    /// `PlatformError::Auth` when the refresh call fails, times out, or
    /// returns a payload without a token. The store is left empty in that
    /// case so the next caller retries instead of reusing a bad value.
    #[instrument(skip(self))]
    pub async fn get_token(&self) -> Result<String> {
        if let Some(value) = self.store.fresh_value(self.clock.now(), self.buffer).await {
            return Ok(value);
        }

        let mut slot = self.store.slot.write().await;

        // Another caller may have refreshed while we waited for the lock.
        let now = self.clock.now();
        if let Some(token) = slot.as_ref().filter(|t| t.is_fresh(now, self.buffer)) {
            debug!("Token refreshed by concurrent caller");
            return Ok(token.value.clone());
        }

        match self.refresh().await {
            Ok((value, ttl)) => {
                let now = self.clock.now();
                let expires_at = now.checked_add(ttl).unwrap_or(now);
                *slot = Some(AccessToken::new(value.clone(), expires_at));
                info!(ttl_secs = ttl.as_secs(), "Access token refreshed");
                Ok(value)
            }
            Err(err) => {
                *slot = None;
                warn!(error = %err, "Access token refresh failed");
                Err(err)
            }
        }
    }

    async fn refresh(&self) -> Result<(String, Duration)> {
        let grant = tokio::time::timeout(self.fetch_timeout, self.fetcher.fetch_token())
            .await
            .map_err(|_| {
                PlatformError::Auth(format!(
                    "token request timed out after {:?}",
                    self.fetch_timeout
                ))
            })?
            .map_err(|err| match err {
                PlatformError::Auth(_) => err,
                other => PlatformError::Auth(other.to_string()),
            })?;

        if grant.access_token.trim().is_empty() {
            return Err(PlatformError::Auth("token response carried an empty access_token".into()));
        }

        let ttl = grant.expires_in.unwrap_or_else(|| {
            warn!(
                fallback_secs = FALLBACK_TOKEN_TTL_SECS,
                "Token response omitted expires_in; using fallback lifetime"
            );
            Duration::from_secs(FALLBACK_TOKEN_TTL_SECS)
        });

        let ceiling = Duration::from_secs(MAX_TOKEN_TTL_SECS);
        if ttl > ceiling {
            warn!(
                expires_in_secs = ttl.as_secs(),
                ceiling_secs = MAX_TOKEN_TTL_SECS,
                "Token lifetime exceeds ceiling; clamping"
            );
        }
        let ttl = ttl.min(ceiling);

        Ok((grant.access_token, ttl))
    }

    pub async fn invalidate(&self) {
        self.store.clear().await;
        debug!("Cached access token invalidated");
    }
}

#[async_trait]
impl AccessTokenProvider for CachingTokenProvider {
    async fn access_token(&self) -> Result<String> {
        self.get_token().await
    }

    async fn invalidate(&self) {
        CachingTokenProvider::invalidate(self).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn freshness_respects_buffer() {
        let now = Instant::now();
        let token = AccessToken::new("abc", now + Duration::from_secs(120));

        assert!(token.is_fresh(now, Duration::from_secs(60)));
        assert!(!token.is_fresh(now + Duration::from_secs(60), Duration::from_secs(60)));
        assert!(!token.is_fresh(now + Duration::from_secs(200), Duration::ZERO));
    }

    #[test]
    fn debug_redacts_value() {
        let token = AccessToken::new("super-secret", Instant::now());
        assert!(!format!("{token:?}").contains("super-secret"));
    }

    #[tokio::test]
    async fn empty_store_has_no_fresh_value() {
        let store = TokenStore::new();
        assert!(store.fresh_value(Instant::now(), Duration::ZERO).await.is_none());
        assert!(store.snapshot().await.is_none());
    }
}
