//! REST v2 transport
//!
//! Implements [`PlatformTransport`] over [`HttpClient`]: resolves the request
//! target to a URL, attaches the bearer token, and unwraps the envelope.

use async_trait::async_trait;
use caspio_proxy_core::{Envelope, PlatformRequest, PlatformTransport};
use caspio_proxy_domain::{HttpMethod, PlatformConfig, PlatformError, RequestTarget, Result};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::Method;
use url::Url;

use super::envelope::parse_envelope;
use crate::http::{status_error, HttpClient};

/// Data calls against `<api-base>/<resource-path>`
pub struct RestTransport {
    http: HttpClient,
    base_url: Url,
}

impl RestTransport {
    /// # Errors
    /// `PlatformError::Config` if the configured API base is not a valid URL.
    pub fn new(http: HttpClient, config: &PlatformConfig) -> Result<Self> {
        let raw = config.api_base_url();
        let base_url = Url::parse(&raw)
            .map_err(|e| PlatformError::Config(format!("invalid API base URL {raw}: {e}")))?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// URL for a resource path, without query parameters
    pub fn resource_url(&self, path: &str) -> Result<Url> {
        let joined = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Url::parse(&joined)
            .map_err(|e| PlatformError::InvalidInput(format!("invalid resource path {path}: {e}")))
    }

    /// Absolute cursors are used verbatim; relative ones are resolved
    /// against the API base.
    pub fn cursor_url(&self, cursor: &str) -> Result<Url> {
        let cursor = cursor.trim();
        if let Ok(url) = Url::parse(cursor) {
            return Ok(url);
        }
        if cursor.starts_with('/') {
            self.base_url
                .join(cursor)
                .map_err(|e| PlatformError::InvalidInput(format!("invalid cursor {cursor}: {e}")))
        } else {
            self.resource_url(cursor)
        }
    }
}

fn to_reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Delete => Method::DELETE,
    }
}

#[async_trait]
impl PlatformTransport for RestTransport {
    async fn send(&self, token: &str, request: PlatformRequest) -> Result<Envelope> {
        let context = request.target.describe().to_string();
        let method = to_reqwest_method(request.method);

        let mut builder = match &request.target {
            RequestTarget::Resource { path, params } => {
                let url = self.resource_url(path)?;
                let builder = self.http.request(method, url);
                if params.is_empty() {
                    builder
                } else {
                    builder.query(params.as_pairs())
                }
            }
            RequestTarget::Cursor(cursor) => self.http.request(method, self.cursor_url(cursor)?),
        };

        builder = builder
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .header(ACCEPT, "application/json");
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = self.http.send(builder, request.timeout, &context).await?;
        if !response.status.is_success() {
            return Err(status_error(response.status, &context, &response.body));
        }

        Ok(parse_envelope(&response.body, &context))
    }
}
