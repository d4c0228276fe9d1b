//! Single authenticated platform call

use std::sync::Arc;
use std::time::Duration;

use caspio_proxy_domain::{HttpMethod, PlatformError, QueryParams, Record, RequestTarget, Result};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::ports::{AccessTokenProvider, Envelope, PlatformRequest, PlatformTransport};

/// Issues one call against the REST API and returns the envelope's records
///
/// No retries. A 401 from the platform drops the cached token so the next
/// call refreshes, but the failing call itself is still reported.
pub struct RequestExecutor {
    tokens: Arc<dyn AccessTokenProvider>,
    transport: Arc<dyn PlatformTransport>,
}

impl RequestExecutor {
    pub fn new(tokens: Arc<dyn AccessTokenProvider>, transport: Arc<dyn PlatformTransport>) -> Self {
        Self { tokens, transport }
    }

    pub async fn access_token(&self) -> Result<String> {
        self.tokens.access_token().await
    }

    pub async fn invalidate_token(&self) {
        self.tokens.invalidate().await;
    }

    /// Fetch a token and issue one call
    ///
    /// # Errors
    /// - `Auth` if no token can be obtained
    /// - `Timeout` if the call exceeded `timeout`
    /// - `UpstreamRequest` for network failures and non-2xx responses
    #[instrument(skip(self, params, body), fields(method = %method))]
    pub async fn execute(
        &self,
        method: HttpMethod,
        path: &str,
        params: QueryParams,
        body: Option<Value>,
        timeout: Duration,
    ) -> Result<Vec<Record>> {
        let path = normalize_path(path)?;
        let token = self.access_token().await?;
        let request = PlatformRequest {
            method,
            target: RequestTarget::resource(path, params),
            body,
            timeout,
        };
        let envelope = self.send_with_token(&token, request).await?;
        Ok(envelope.records)
    }

    /// Issue one call with a token the caller already holds
    pub async fn send_with_token(&self, token: &str, request: PlatformRequest) -> Result<Envelope> {
        let target = request.target.describe().to_string();
        debug!(method = %request.method, target = %target, "Sending platform request");

        match self.transport.send(token, request).await {
            Ok(envelope) => {
                debug!(
                    target = %target,
                    records = envelope.records.len(),
                    has_next_page = envelope.next_page.is_some(),
                    "Platform request succeeded"
                );
                Ok(envelope)
            }
            Err(err) => {
                if err.status() == Some(401) {
                    warn!(target = %target, "Platform rejected bearer token; clearing cache");
                    self.tokens.invalidate().await;
                }
                Err(err)
            }
        }
    }
}

/// Resource paths are relative to the REST base: `tables/Orders/records`
pub fn normalize_path(path: &str) -> Result<String> {
    let trimmed = path.trim().trim_start_matches('/');
    if trimmed.is_empty() {
        return Err(PlatformError::InvalidInput("resource path must not be empty".into()));
    }
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        return Err(PlatformError::InvalidInput(format!(
            "resource path must be relative to the API base, got {trimmed}"
        )));
    }
    Ok(trimmed.to_string())
}
