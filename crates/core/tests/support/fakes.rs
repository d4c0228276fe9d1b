use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use caspio_proxy_core::{Envelope, PlatformRequest, PlatformTransport, TokenFetcher, TokenGrant};
use caspio_proxy_domain::{PlatformError, Result};

/// Token fetcher that replays scripted grants and counts calls.
///
/// Once the script is empty every call succeeds with `token-<n>`.
#[derive(Default)]
pub struct FakeTokenFetcher {
    script: Mutex<VecDeque<Result<TokenGrant>>>,
    calls: AtomicUsize,
    delay: Option<Duration>,
    expires_in: Option<Duration>,
}

impl FakeTokenFetcher {
    pub fn new() -> Self {
        Self { expires_in: Some(Duration::from_secs(3600)), ..Self::default() }
    }

    pub fn with_expires_in(mut self, expires_in: Option<Duration>) -> Self {
        self.expires_in = expires_in;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn then(self, result: Result<TokenGrant>) -> Self {
        self.script.lock().unwrap().push_back(result);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenFetcher for FakeTokenFetcher {
    async fn fetch_token(&self) -> Result<TokenGrant> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let scripted = self.script.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| {
            Ok(TokenGrant { access_token: format!("token-{n}"), expires_in: self.expires_in })
        })
    }
}

/// Transport that replays scripted page results and records every request.
///
/// An exhausted script answers with an empty envelope.
#[derive(Default, Clone)]
pub struct ScriptedTransport {
    script: Arc<Mutex<VecDeque<Result<Envelope>>>>,
    requests: Arc<Mutex<Vec<(String, PlatformRequest)>>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(self, envelope: Envelope) -> Self {
        self.script.lock().unwrap().push_back(Ok(envelope));
        self
    }

    pub fn fail(self, err: PlatformError) -> Self {
        self.script.lock().unwrap().push_back(Err(err));
        self
    }

    pub fn requests(&self) -> Vec<(String, PlatformRequest)> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl PlatformTransport for ScriptedTransport {
    async fn send(&self, token: &str, request: PlatformRequest) -> Result<Envelope> {
        self.requests.lock().unwrap().push((token.to_string(), request));
        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(Envelope::default()))
    }
}

pub fn timeout_error(path: &str) -> PlatformError {
    PlatformError::Timeout { path: path.into(), timeout: Duration::from_millis(100) }
}
