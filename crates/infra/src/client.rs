//! Platform client facade
//!
//! Wires the token cache, REST transport and paginator together from a
//! [`PlatformConfig`]. Route handlers only need [`PlatformClient::fetch_all_pages`]
//! and [`PlatformClient::make_single_request`].

use std::sync::Arc;

use caspio_proxy_core::{
    CachingTokenProvider, Clock, FetchOptions, FetchReport, PaginatedFetchEngine,
    RequestExecutor, SystemClock, TokenStore,
};
use caspio_proxy_domain::{HttpMethod, PlatformConfig, QueryParams, Record, Result};
use serde_json::Value;
use tracing::{info, instrument};

use crate::auth::ClientCredentialsFetcher;
use crate::http::HttpClient;
use crate::transport::RestTransport;

/// Authenticated, paginating client for the platform REST API
pub struct PlatformClient {
    config: PlatformConfig,
    tokens: Arc<CachingTokenProvider>,
    executor: Arc<RequestExecutor>,
    engine: PaginatedFetchEngine,
}

impl PlatformClient {
    /// Create a client with the system clock and a private token store
    ///
    /// # Errors
    /// Returns `PlatformError::Config` if the configuration is invalid or the
    /// HTTP client cannot be built.
    pub fn new(config: PlatformConfig) -> Result<Self> {
        Self::builder(config).build()
    }

    /// Load configuration from the environment (or a config file) and build
    pub fn from_env() -> Result<Self> {
        Self::new(crate::config::load()?)
    }

    pub fn builder(config: PlatformConfig) -> PlatformClientBuilder {
        PlatformClientBuilder::new(config)
    }

    pub fn config(&self) -> &PlatformConfig {
        &self.config
    }

    /// Pagination defaults from configuration, ready to customise per call
    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions::from(&self.config.pagination)
    }

    /// Fetch every page of a resource
    ///
    /// `options` defaults to [`fetch_options`](Self::fetch_options). A page
    /// timeout or an exhausted time budget returns the records gathered so
    /// far; any other failure is returned as an error.
    #[instrument(skip(self, params, options))]
    pub async fn fetch_all_pages(
        &self,
        path: &str,
        params: QueryParams,
        options: Option<FetchOptions>,
    ) -> Result<Vec<Record>> {
        let options = options.unwrap_or_else(|| self.fetch_options());
        self.engine.fetch_all(path, params, &options).await
    }

    /// Same as [`fetch_all_pages`](Self::fetch_all_pages), with page count
    /// and stop reason
    pub async fn fetch_all_pages_with_report(
        &self,
        path: &str,
        params: QueryParams,
        options: Option<FetchOptions>,
    ) -> Result<FetchReport> {
        let options = options.unwrap_or_else(|| self.fetch_options());
        self.engine.fetch_all_with_report(path, params, &options).await
    }

    /// One call, one page
    ///
    /// Returns only the first page of results, so it is unsuitable for
    /// resources whose result set can exceed `q.limit`; use
    /// [`fetch_all_pages`](Self::fetch_all_pages) for those. Unlike the
    /// paginator, a timeout here is an error.
    #[instrument(skip(self, params, body), fields(method = %method))]
    pub async fn make_single_request(
        &self,
        method: HttpMethod,
        path: &str,
        params: QueryParams,
        body: Option<Value>,
    ) -> Result<Vec<Record>> {
        self.executor
            .execute(method, path, params, body, self.config.pagination.request_timeout())
            .await
    }

    /// Current bearer token, refreshing if needed
    pub async fn access_token(&self) -> Result<String> {
        self.tokens.get_token().await
    }

    /// Drop the cached token; the next call refreshes
    pub async fn invalidate_token(&self) {
        self.tokens.invalidate().await;
    }

    pub fn token_store(&self) -> Arc<TokenStore> {
        self.tokens.store().clone()
    }
}

/// Builder for [`PlatformClient`]
pub struct PlatformClientBuilder {
    config: PlatformConfig,
    clock: Option<Arc<dyn Clock>>,
    token_store: Option<Arc<TokenStore>>,
    http: Option<HttpClient>,
}

impl PlatformClientBuilder {
    pub fn new(config: PlatformConfig) -> Self {
        Self { config, clock: None, token_store: None, http: None }
    }

    /// Time source for token expiry and the pagination budget
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Share a token store between several clients for the same account
    pub fn token_store(mut self, store: Arc<TokenStore>) -> Self {
        self.token_store = Some(store);
        self
    }

    pub fn http_client(mut self, http: HttpClient) -> Self {
        self.http = Some(http);
        self
    }

    /// # Errors
    /// Returns `PlatformError::Config` for invalid configuration.
    pub fn build(self) -> Result<PlatformClient> {
        let config = self.config;
        config.validate()?;

        let http = match self.http {
            Some(http) => http,
            None => HttpClient::builder()
                .timeout(config.pagination.request_timeout().max(config.auth.token_timeout()))
                .build()?,
        };
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let store = self.token_store.unwrap_or_else(TokenStore::new);

        let fetcher = Arc::new(ClientCredentialsFetcher::new(http.clone(), &config));
        let transport = Arc::new(RestTransport::new(http, &config)?);
        let tokens =
            Arc::new(CachingTokenProvider::new(store, fetcher, clock.clone(), &config.auth));
        let executor = Arc::new(RequestExecutor::new(tokens.clone(), transport));
        let engine = PaginatedFetchEngine::new(executor.clone(), clock);

        info!(
            api_base = %config.api_base_url(),
            page_limit = config.pagination.page_limit,
            max_pages = config.pagination.max_pages,
            "Platform client initialised"
        );

        Ok(PlatformClient { config, tokens, executor, engine })
    }
}

#[cfg(test)]
mod tests {
    use caspio_proxy_domain::PlatformError;

    use super::*;

    #[test]
    fn build_rejects_invalid_config() {
        let config = PlatformConfig::new("acct.caspio.com", "", "secret");
        assert!(matches!(PlatformClient::new(config), Err(PlatformError::Config(_))));
    }

    #[test]
    fn fetch_options_follow_config() {
        let mut config = PlatformConfig::new("acct.caspio.com", "id", "secret");
        config.pagination.page_limit = 200;
        config.pagination.max_pages = 3;

        let client = PlatformClient::new(config).unwrap();
        let options = client.fetch_options();

        assert_eq!(options.page_limit, 200);
        assert_eq!(options.max_pages, 3);
    }

    #[tokio::test]
    async fn clients_can_share_a_token_store() {
        let store = TokenStore::new();
        let config = PlatformConfig::new("acct.caspio.com", "id", "secret");

        let a = PlatformClient::builder(config.clone()).token_store(store.clone()).build().unwrap();
        let b = PlatformClient::builder(config).token_store(store.clone()).build().unwrap();

        assert!(Arc::ptr_eq(&a.token_store(), &b.token_store()));
    }
}
