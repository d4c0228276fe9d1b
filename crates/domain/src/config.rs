//! Configuration structures
//!
//! Everything the platform client needs is supplied through
//! [`PlatformConfig`] at construction time. Loading it (from environment or
//! file) is the infra crate's job.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_MAX_PAGES, DEFAULT_PAGE_LIMIT, DEFAULT_REQUEST_TIMEOUT_MS,
    DEFAULT_TOKEN_BUFFER_SECS, DEFAULT_TOKEN_TIMEOUT_MS, DEFAULT_TOTAL_TIMEOUT_MS,
    REST_API_PATH, TOKEN_ENDPOINT_PATH,
};
use crate::errors::{PlatformError, Result};

/// Platform access configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct PlatformConfig {
    /// Account domain, e.g. `c1abc123.caspio.com`
    pub domain: String,
    pub client_id: String,
    #[serde(skip_serializing)]
    pub client_secret: String,
    /// Overrides `https://{domain}/oauth/token`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_url: Option<String>,
    /// Overrides `https://{domain}/rest/v2`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base_url: Option<String>,
    #[serde(default)]
    pub pagination: PaginationConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

/// Defaults applied to every paginated fetch unless the caller overrides them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    pub page_limit: u32,
    pub max_pages: u32,
    pub request_timeout_ms: u64,
    pub total_timeout_ms: u64,
}

/// Token cache settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Refresh this many seconds before the token actually expires
    pub token_buffer_secs: u64,
    pub token_timeout_ms: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            page_limit: DEFAULT_PAGE_LIMIT,
            max_pages: DEFAULT_MAX_PAGES,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            total_timeout_ms: DEFAULT_TOTAL_TIMEOUT_MS,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_buffer_secs: DEFAULT_TOKEN_BUFFER_SECS,
            token_timeout_ms: DEFAULT_TOKEN_TIMEOUT_MS,
        }
    }
}

impl PaginationConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn total_timeout(&self) -> Duration {
        Duration::from_millis(self.total_timeout_ms)
    }
}

impl AuthConfig {
    pub fn token_buffer(&self) -> Duration {
        Duration::from_secs(self.token_buffer_secs)
    }

    pub fn token_timeout(&self) -> Duration {
        Duration::from_millis(self.token_timeout_ms)
    }
}

// Never print the client secret.
impl fmt::Debug for PlatformConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlatformConfig")
            .field("domain", &self.domain)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("token_url", &self.token_url)
            .field("api_base_url", &self.api_base_url)
            .field("pagination", &self.pagination)
            .field("auth", &self.auth)
            .finish()
    }
}

impl PlatformConfig {
    /// Create a configuration with default pagination and auth settings
    pub fn new(
        domain: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            domain: domain.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            token_url: None,
            api_base_url: None,
            pagination: PaginationConfig::default(),
            auth: AuthConfig::default(),
        }
    }

    /// Token endpoint URL
    ///
    /// For Caspio accounts this is `https://{domain}/oauth/token` unless
    /// `token_url` is set.
    pub fn token_url(&self) -> String {
        match &self.token_url {
            Some(url) => url.clone(),
            None => format!("https://{}{}", self.domain, TOKEN_ENDPOINT_PATH),
        }
    }

    /// REST base URL, without a trailing slash
    pub fn api_base_url(&self) -> String {
        match &self.api_base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("https://{}{}", self.domain, REST_API_PATH),
        }
    }

    /// Reject configurations the client cannot work with
    ///
    /// # Errors
    /// Returns `PlatformError::Config` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.domain.trim().is_empty()
            && (self.token_url.is_none() || self.api_base_url.is_none())
        {
            return Err(PlatformError::Config(
                "domain is required unless both token_url and api_base_url are set".into(),
            ));
        }
        if self.client_id.trim().is_empty() {
            return Err(PlatformError::Config("client_id must not be empty".into()));
        }
        if self.client_secret.is_empty() {
            return Err(PlatformError::Config("client_secret must not be empty".into()));
        }
        if self.pagination.page_limit == 0 {
            return Err(PlatformError::Config("pagination.page_limit must be positive".into()));
        }
        if self.pagination.max_pages == 0 {
            return Err(PlatformError::Config("pagination.max_pages must be positive".into()));
        }
        if self.pagination.request_timeout_ms == 0 || self.auth.token_timeout_ms == 0 {
            return Err(PlatformError::Config("timeouts must be positive".into()));
        }
        Ok(())
    }
}
