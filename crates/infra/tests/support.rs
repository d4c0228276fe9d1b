//! Shared fixtures for infra integration tests: a wiremock-backed platform,
//! client construction against it, and log capture.

#![allow(dead_code)]

use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use caspio_proxy_core::MockClock;
use caspio_proxy_domain::PlatformConfig;
use caspio_proxy_infra::PlatformClient;
use serde_json::{json, Value};
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::fmt::MakeWriter;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TOKEN_PATH: &str = "/oauth/token";
pub const ORDERS_PATH: &str = "/rest/v2/tables/Orders/records";
pub const ORDERS: &str = "tables/Orders/records";

/// Configuration pointing both endpoints at the mock server
pub fn config_for(server: &MockServer) -> PlatformConfig {
    let mut config = PlatformConfig::new("acct.caspio.com", "client-id", "client-secret");
    config.token_url = Some(format!("{}{}", server.uri(), TOKEN_PATH));
    config.api_base_url = Some(format!("{}/rest/v2", server.uri()));
    config.pagination.request_timeout_ms = 2_000;
    config
}

pub fn client_for(server: &MockServer, clock: &MockClock) -> PlatformClient {
    client_with(config_for(server), clock)
}

pub fn client_with(config: PlatformConfig, clock: &MockClock) -> PlatformClient {
    PlatformClient::builder(config).clock(Arc::new(clock.clone())).build().expect("client")
}

/// Token endpoint answering `token-value` valid for `expires_in` seconds
pub async fn mount_token(server: &MockServer, expires_in: u64, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "token-value",
            "token_type": "bearer",
            "expires_in": expires_in
        })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

/// Rows `{"ID": start}` .. `{"ID": start + count - 1}`
pub fn rows(start: u64, count: u64) -> Vec<Value> {
    (start..start + count).map(|id| json!({ "ID": id, "Name": format!("row-{id}") })).collect()
}

pub fn page(rows: Vec<Value>) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "Result": rows }))
}

pub fn page_with_cursor(rows: Vec<Value>, next: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "Result": rows, "@nextpage": next }))
}

pub fn ids(records: &[caspio_proxy_domain::Record]) -> Vec<u64> {
    records.iter().filter_map(|r| r.get("ID").and_then(Value::as_u64)).collect()
}

pub fn quick_timeout() -> Duration {
    Duration::from_millis(200)
}

/// Captures formatted tracing output for the current thread.
#[derive(Clone, Default)]
pub struct LogCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl LogCapture {
    /// Install as the thread-default subscriber until the guard drops.
    ///
    /// `#[tokio::test]` runs on a single thread, so events emitted inside
    /// the client are captured.
    pub fn install() -> (Self, DefaultGuard) {
        let capture = Self::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(capture.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        let guard = tracing::subscriber::set_default(subscriber);
        (capture, guard)
    }

    pub fn output(&self) -> String {
        let buffer = self.buffer.lock().expect("log buffer poisoned");
        String::from_utf8_lossy(&buffer).into_owned()
    }

    pub fn contains(&self, level: &str, needle: &str) -> bool {
        self.output().lines().any(|line| line.contains(level) && line.contains(needle))
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.lock().expect("log buffer poisoned").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = LogCapture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
