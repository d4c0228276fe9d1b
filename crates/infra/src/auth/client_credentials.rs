//! OAuth client-credentials grant against the platform token endpoint
//!
//! `POST <token-url>` with a form body of `grant_type=client_credentials`,
//! `client_id` and `client_secret`. The response is `{ access_token,
//! expires_in }`.

use std::time::Duration;

use async_trait::async_trait;
use caspio_proxy_core::{TokenFetcher, TokenGrant};
use caspio_proxy_domain::{PlatformConfig, PlatformError, Result};
use reqwest::Method;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::http::HttpClient;

/// Token endpoint payload. Both fields are optional so a malformed body is
/// reported as an auth error rather than a parse failure.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: Option<String>,
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub token_type: Option<String>,
}

impl TokenResponse {
    /// Convert into a grant, rejecting responses without a token
    pub fn into_grant(self) -> Result<TokenGrant> {
        let access_token = self
            .access_token
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| PlatformError::Auth("token response missing access_token".into()))?;

        // Negative lifetimes are treated as already expired.
        let expires_in = self.expires_in.map(|secs| Duration::from_secs(secs.max(0) as u64));

        Ok(TokenGrant { access_token, expires_in })
    }
}

/// [`TokenFetcher`] for the client-credentials grant
pub struct ClientCredentialsFetcher {
    http: HttpClient,
    token_url: String,
    client_id: String,
    client_secret: String,
    timeout: Duration,
}

impl ClientCredentialsFetcher {
    pub fn new(http: HttpClient, config: &PlatformConfig) -> Self {
        Self {
            http,
            token_url: config.token_url(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            timeout: config.auth.token_timeout(),
        }
    }

    pub fn token_url(&self) -> &str {
        &self.token_url
    }
}

#[async_trait]
impl TokenFetcher for ClientCredentialsFetcher {
    #[instrument(skip(self), fields(token_url = %self.token_url))]
    async fn fetch_token(&self) -> Result<TokenGrant> {
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];
        let request = self.http.request(Method::POST, &self.token_url).form(&form);

        let response = self
            .http
            .send(request, self.timeout, &self.token_url)
            .await
            .map_err(|err| PlatformError::Auth(format!("token request failed: {err}")))?;

        if !response.status.is_success() {
            return Err(PlatformError::Auth(format!(
                "token endpoint returned status {}",
                response.status
            )));
        }

        let payload: TokenResponse = serde_json::from_str(&response.body)
            .map_err(|err| PlatformError::Auth(format!("malformed token response: {err}")))?;

        debug!(token_type = ?payload.token_type, expires_in = ?payload.expires_in, "Token response received");
        payload.into_grant()
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn fetcher_for(server: &MockServer) -> ClientCredentialsFetcher {
        let mut config = PlatformConfig::new("unused.example.com", "my-client", "my-secret");
        config.token_url = Some(format!("{}/oauth/token", server.uri()));
        ClientCredentialsFetcher::new(HttpClient::new().unwrap(), &config)
    }

    #[tokio::test]
    async fn posts_form_encoded_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .and(header("content-type", "application/x-www-form-urlencoded"))
            .and(body_string_contains("grant_type=client_credentials"))
            .and(body_string_contains("client_id=my-client"))
            .and(body_string_contains("client_secret=my-secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "abc123",
                "token_type": "bearer",
                "expires_in": 86399
            })))
            .expect(1)
            .mount(&server)
            .await;

        let grant = fetcher_for(&server).fetch_token().await.unwrap();

        assert_eq!(grant.access_token, "abc123");
        assert_eq!(grant.expires_in, Some(Duration::from_secs(86399)));
    }

    #[tokio::test]
    async fn missing_access_token_is_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "expires_in": 10 })),
            )
            .mount(&server)
            .await;

        let err = fetcher_for(&server).fetch_token().await.unwrap_err();
        assert!(matches!(err, PlatformError::Auth(ref m) if m.contains("access_token")));
    }

    #[tokio::test]
    async fn rejected_credentials_are_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(serde_json::json!({ "error": "invalid_client" })),
            )
            .mount(&server)
            .await;

        let err = fetcher_for(&server).fetch_token().await.unwrap_err();
        assert!(matches!(err, PlatformError::Auth(ref m) if m.contains("401")));
    }

    #[tokio::test]
    async fn non_json_body_is_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
            .mount(&server)
            .await;

        let err = fetcher_for(&server).fetch_token().await.unwrap_err();
        assert!(matches!(err, PlatformError::Auth(ref m) if m.contains("malformed")));
    }

    #[test]
    fn missing_expires_in_is_preserved_as_none() {
        let response = TokenResponse {
            access_token: Some("abc".into()),
            expires_in: None,
            token_type: None,
        };
        assert_eq!(response.into_grant().unwrap().expires_in, None);
    }
}
