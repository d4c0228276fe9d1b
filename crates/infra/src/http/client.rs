use std::time::Duration;

use caspio_proxy_domain::{PlatformError, Result};
use reqwest::{Client as ReqwestClient, Method, RequestBuilder, StatusCode};
use tracing::debug;

/// Longest upstream body excerpt carried in an error message
const ERROR_BODY_LIMIT: usize = 512;

/// Status and fully read body of one HTTP exchange
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub body: String,
}

/// HTTP client with per-call timeout and error classification.
///
/// Calls are single-attempt. The timeout covers sending the request and
/// reading the whole body.
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
}

impl HttpClient {
    /// Start building a new HTTP client.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Convenience constructor with default configuration.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Create a request builder using the underlying reqwest client.
    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.client.request(method, url)
    }

    /// Execute the request and read the body, bounded by `timeout`.
    ///
    /// `context` names the call (resource path or cursor) in errors. Non-2xx
    /// responses are returned, not turned into errors.
    pub async fn send(
        &self,
        builder: RequestBuilder,
        timeout: Duration,
        context: &str,
    ) -> Result<HttpResponse> {
        let mut request = builder.build().map_err(|err| {
            PlatformError::InvalidInput(format!("invalid request for {context}: {err}"))
        })?;
        // reqwest prefers the request timeout over the client-wide one.
        *request.timeout_mut() = Some(timeout);

        let method = request.method().clone();
        let url = request.url().clone();
        debug!(%method, %url, timeout_ms = timeout.as_millis() as u64, "sending HTTP request");

        let exchange = async {
            let response = self.client.execute(request).await?;
            let status = response.status();
            let body = response.text().await?;
            Ok::<_, reqwest::Error>(HttpResponse { status, body })
        };

        match tokio::time::timeout(timeout, exchange).await {
            Ok(Ok(response)) => {
                debug!(%method, %url, status = %response.status, "received HTTP response");
                Ok(response)
            }
            Ok(Err(err)) => {
                debug!(%method, %url, error = %err, "HTTP request failed");
                Err(classify_error(&err, context, timeout))
            }
            Err(_) => {
                debug!(%method, %url, "HTTP request timed out");
                Err(PlatformError::Timeout { path: context.to_string(), timeout })
            }
        }
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self { timeout: Duration::from_secs(30) }
    }
}

impl HttpClientBuilder {
    /// Fallback for requests built outside [`HttpClient::send`]; `send`
    /// always applies its own per-call timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<HttpClient> {
        let client = ReqwestClient::builder()
            .timeout(self.timeout)
            .user_agent(concat!("caspio-proxy/", env!("CARGO_PKG_VERSION")))
            .no_proxy()
            .build()
            .map_err(|err| PlatformError::Config(format!("failed to build HTTP client: {err}")))?;

        Ok(HttpClient { client })
    }
}

/// Timeouts (reqwest's own, or anything reporting "timeout") become
/// `PlatformError::Timeout`; everything else is an upstream failure.
pub fn classify_error(err: &reqwest::Error, context: &str, timeout: Duration) -> PlatformError {
    if err.is_timeout() || err.to_string().to_ascii_lowercase().contains("timeout") {
        return PlatformError::Timeout { path: context.to_string(), timeout };
    }
    PlatformError::upstream(err.status().map(|s| s.as_u16()), context, err.to_string())
}

/// Error for a non-2xx response, carrying a bounded excerpt of the body
pub fn status_error(status: StatusCode, context: &str, body: &str) -> PlatformError {
    let body = body.trim();
    let message = if body.is_empty() {
        format!("returned status {status}")
    } else {
        let excerpt: String = body.chars().take(ERROR_BODY_LIMIT).collect();
        format!("returned status {status}: {excerpt}")
    };
    PlatformError::upstream(Some(status.as_u16()), context, message)
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;

    use reqwest::Method;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client() -> HttpClient {
        HttpClient::builder().build().expect("http client")
    }

    #[tokio::test]
    async fn returns_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&server)
            .await;

        let client = client();
        let response = client
            .send(client.request(Method::GET, server.uri()), Duration::from_secs(5), "health")
            .await
            .expect("response");

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body, "ok");
    }

    #[tokio::test]
    async fn does_not_retry_server_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let client = client();
        let response = client
            .send(client.request(Method::GET, server.uri()), Duration::from_secs(5), "health")
            .await
            .expect("response");

        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn slow_response_is_a_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let client = client();
        let err = client
            .send(
                client.request(Method::GET, server.uri()),
                Duration::from_millis(100),
                "tables/Slow/records",
            )
            .await
            .unwrap_err();

        assert!(err.is_timeout(), "expected timeout, got {err:?}");
    }

    #[tokio::test]
    async fn connection_refused_is_upstream_without_status() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener); // release the port so that requests fail with ECONNREFUSED
        let url = format!("http://{addr}");

        let client = client();
        let err = client
            .send(client.request(Method::GET, &url), Duration::from_secs(5), "tables/X/records")
            .await
            .unwrap_err();

        match err {
            PlatformError::UpstreamRequest { status, path, .. } => {
                assert_eq!(status, None);
                assert_eq!(path, "tables/X/records");
            }
            other => panic!("expected upstream error, got {other:?}"),
        }
    }

    #[test]
    fn status_error_truncates_body() {
        let body = "x".repeat(2_000);
        let err = status_error(StatusCode::BAD_GATEWAY, "tables/X/records", &body);
        assert_eq!(err.status(), Some(502));
        assert!(err.to_string().len() < 800);
    }
}
