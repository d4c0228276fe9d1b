//! Port interfaces implemented by the infra crate
//!
//! The core never speaks HTTP itself. Token acquisition and data calls go
//! through these traits so the token cache and the paginator can be tested
//! against in-memory fakes.

use std::time::Duration;

use async_trait::async_trait;
use caspio_proxy_domain::{HttpMethod, Record, RequestTarget, Result};
use serde_json::Value;

/// Raw result of a client-credentials grant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenGrant {
    pub access_token: String,
    /// `None` when the token endpoint did not report a lifetime
    pub expires_in: Option<Duration>,
}

/// Performs the network half of a token refresh
#[async_trait]
pub trait TokenFetcher: Send + Sync {
    /// Request a fresh token from the token endpoint
    ///
    /// Implementations return `PlatformError::Auth` for rejected requests and
    /// malformed payloads.
    async fn fetch_token(&self) -> Result<TokenGrant>;
}

/// Hands out bearer tokens for data calls
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    async fn access_token(&self) -> Result<String>;

    /// Drop any cached token so the next call refreshes
    async fn invalidate(&self);
}

/// One call against the REST API
#[derive(Debug, Clone)]
pub struct PlatformRequest {
    pub method: HttpMethod,
    pub target: RequestTarget,
    pub body: Option<Value>,
    pub timeout: Duration,
}

impl PlatformRequest {
    pub fn get(target: RequestTarget, timeout: Duration) -> Self {
        Self { method: HttpMethod::Get, target, body: None, timeout }
    }
}

/// The records and continuation link extracted from a response envelope
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Envelope {
    pub records: Vec<Record>,
    pub next_page: Option<String>,
}

impl Envelope {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records, next_page: None }
    }

    pub fn with_next_page(mut self, next_page: impl Into<String>) -> Self {
        self.next_page = Some(next_page.into());
        self
    }
}

/// Sends a single authenticated call and unwraps the envelope
///
/// Timeout-classed failures must surface as `PlatformError::Timeout`; every
/// other failure as `PlatformError::UpstreamRequest`.
#[async_trait]
pub trait PlatformTransport: Send + Sync {
    async fn send(&self, token: &str, request: PlatformRequest) -> Result<Envelope>;
}
