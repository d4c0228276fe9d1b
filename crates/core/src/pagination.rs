//! Paginated fetch engine
//!
//! Assembles a complete result set from a paged resource. Each run is a
//! small state machine:
//!
//! ```text
//! Start -> FetchingPage(n) -> { continue: FetchingPage(n+1) | stop: Done }
//!                          -> page timeout: Done (partial)
//! ```
//!
//! The platform pages in two ways. When a response carries `@nextpage`, that
//! link fully determines the next request. When it does not but the page was
//! full, the engine falls back to `q.skip`. Pages are strictly sequential.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use caspio_proxy_domain::constants::{QUERY_LIMIT, QUERY_SKIP};
use caspio_proxy_domain::{PaginationConfig, PlatformError, QueryParams, Record, RequestTarget, Result};
use tracing::{debug, info, instrument, warn};

use crate::clock::Clock;
use crate::executor::{normalize_path, RequestExecutor};
use crate::ports::PlatformRequest;

/// Predicate over everything merged so far; `true` stops pagination
pub type EarlyExitFn = Arc<dyn Fn(&[Record]) -> bool + Send + Sync>;

/// Per-page transform; receives the 1-based page index and the raw records
pub type PageCallbackFn = Arc<dyn Fn(u32, Vec<Record>) -> Vec<Record> + Send + Sync>;

/// Per-call pagination settings
#[derive(Clone)]
pub struct FetchOptions {
    pub max_pages: u32,
    pub page_limit: u32,
    pub total_timeout: Duration,
    pub per_request_timeout: Duration,
    pub early_exit: Option<EarlyExitFn>,
    pub page_callback: Option<PageCallbackFn>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self::from(&PaginationConfig::default())
    }
}

impl From<&PaginationConfig> for FetchOptions {
    fn from(config: &PaginationConfig) -> Self {
        Self {
            max_pages: config.max_pages,
            page_limit: config.page_limit,
            total_timeout: config.total_timeout(),
            per_request_timeout: config.request_timeout(),
            early_exit: None,
            page_callback: None,
        }
    }
}

impl FetchOptions {
    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn with_page_limit(mut self, page_limit: u32) -> Self {
        self.page_limit = page_limit;
        self
    }

    pub fn with_total_timeout(mut self, timeout: Duration) -> Self {
        self.total_timeout = timeout;
        self
    }

    pub fn with_per_request_timeout(mut self, timeout: Duration) -> Self {
        self.per_request_timeout = timeout;
        self
    }

    pub fn with_early_exit<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&[Record]) -> bool + Send + Sync + 'static,
    {
        self.early_exit = Some(Arc::new(predicate));
        self
    }

    pub fn with_page_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(u32, Vec<Record>) -> Vec<Record> + Send + Sync + 'static,
    {
        self.page_callback = Some(Arc::new(callback));
        self
    }
}

impl fmt::Debug for FetchOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchOptions")
            .field("max_pages", &self.max_pages)
            .field("page_limit", &self.page_limit)
            .field("total_timeout", &self.total_timeout)
            .field("per_request_timeout", &self.per_request_timeout)
            .field("early_exit", &self.early_exit.is_some())
            .field("page_callback", &self.page_callback.is_some())
            .finish()
    }
}

/// How the page after the current one is requested
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextPage {
    /// Continuation link from the platform, used verbatim
    Cursor(String),
    /// Original parameters with `q.skip` set to this offset
    Offset(u64),
    /// No further page
    None,
}

impl NextPage {
    /// Decide the continuation after page `page_index` (1-based) was merged
    ///
    /// A cursor always wins over offset computation. Without a cursor, a
    /// full page means more data may exist. `max_pages` caps everything.
    pub fn after_page(
        cursor: Option<&str>,
        page_len: usize,
        page_limit: u32,
        page_index: u32,
        max_pages: u32,
    ) -> Self {
        let cursor = cursor.map(str::trim).filter(|c| !c.is_empty());
        let full = page_len >= page_limit as usize;

        if cursor.is_none() && !full {
            return Self::None;
        }
        if page_index >= max_pages {
            return Self::None;
        }
        match cursor {
            Some(url) => Self::Cursor(url.to_string()),
            None => Self::Offset(u64::from(page_index) * u64::from(page_limit)),
        }
    }
}

/// Why a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The platform signalled no more data
    Exhausted,
    /// The early-exit predicate returned true
    EarlyExit,
    /// `max_pages` pages were fetched
    MaxPages,
    /// The total budget ran out between pages
    TotalTimeout,
    /// The given page timed out; earlier pages were kept
    PageTimeout { page: u32 },
}

impl StopReason {
    /// True when the result set may be incomplete
    pub fn is_partial(&self) -> bool {
        !matches!(self, Self::Exhausted)
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exhausted => f.write_str("exhausted"),
            Self::EarlyExit => f.write_str("early_exit"),
            Self::MaxPages => f.write_str("max_pages"),
            Self::TotalTimeout => f.write_str("total_timeout"),
            Self::PageTimeout { page } => write!(f, "page_timeout({page})"),
        }
    }
}

/// Records plus how the run went
#[derive(Debug, Clone)]
pub struct FetchReport {
    pub records: Vec<Record>,
    pub pages_fetched: u32,
    pub stop_reason: StopReason,
    pub elapsed: Duration,
}

/// Drives repeated [`RequestExecutor`] calls until a stop condition fires
pub struct PaginatedFetchEngine {
    executor: Arc<RequestExecutor>,
    clock: Arc<dyn Clock>,
}

impl PaginatedFetchEngine {
    pub fn new(executor: Arc<RequestExecutor>, clock: Arc<dyn Clock>) -> Self {
        Self { executor, clock }
    }

    /// Fetch every page of `path` and return the merged records
    ///
    /// Never fails because a single page timed out; see
    /// [`fetch_all_with_report`](Self::fetch_all_with_report).
    pub async fn fetch_all(
        &self,
        path: &str,
        params: QueryParams,
        options: &FetchOptions,
    ) -> Result<Vec<Record>> {
        self.fetch_all_with_report(path, params, options).await.map(|report| report.records)
    }

    /// Fetch every page of `path`, reporting pages fetched and stop reason
    ///
    /// # Errors
    /// - `Auth` if the initial token cannot be obtained
    /// - `UpstreamRequest` (or any other non-timeout error) from any page;
    ///   records from earlier pages are discarded in that case
    /// - `InvalidInput` for an empty path, a zero page limit or zero `max_pages`
    #[instrument(skip(self, params, options), fields(max_pages = options.max_pages))]
    pub async fn fetch_all_with_report(
        &self,
        path: &str,
        mut params: QueryParams,
        options: &FetchOptions,
    ) -> Result<FetchReport> {
        let path = normalize_path(path)?;
        if options.max_pages == 0 {
            return Err(PlatformError::InvalidInput("max_pages must be positive".into()));
        }

        let page_limit = match params.page_limit() {
            Some(limit) => limit,
            None => {
                if options.page_limit == 0 {
                    return Err(PlatformError::InvalidInput("page_limit must be positive".into()));
                }
                params.set(QUERY_LIMIT, options.page_limit);
                options.page_limit
            }
        };

        let start = self.clock.now();
        let token = self.executor.access_token().await?;

        let mut records: Vec<Record> = Vec::new();
        let mut pages_fetched = 0u32;
        let mut target = RequestTarget::resource(path.clone(), params.clone());

        let stop_reason = loop {
            let page_index = pages_fetched + 1;

            let elapsed = self.elapsed_since(start);
            if elapsed > options.total_timeout {
                warn!(
                    path = %path,
                    page = page_index,
                    elapsed_ms = elapsed.as_millis() as u64,
                    budget_ms = options.total_timeout.as_millis() as u64,
                    "Pagination budget exhausted; returning partial results"
                );
                break StopReason::TotalTimeout;
            }

            let request = PlatformRequest::get(target.clone(), options.per_request_timeout);
            let envelope = match self.executor.send_with_token(&token, request).await {
                Ok(envelope) => envelope,
                Err(err) if err.is_timeout() => {
                    warn!(
                        path = %path,
                        page = page_index,
                        error = %err,
                        "Page timed out; returning partial results"
                    );
                    break StopReason::PageTimeout { page: page_index };
                }
                Err(err) => return Err(err),
            };
            pages_fetched = page_index;

            let page_len = envelope.records.len();
            let page = match &options.page_callback {
                Some(callback) => callback(page_index, envelope.records),
                None => envelope.records,
            };
            records.extend(page);

            debug!(
                path = %path,
                page = page_index,
                page_len,
                total = records.len(),
                "Merged page"
            );

            if options.early_exit.as_ref().is_some_and(|predicate| predicate(records.as_slice())) {
                break StopReason::EarlyExit;
            }

            let cursor = envelope.next_page.as_deref().map(str::trim).filter(|c| !c.is_empty());
            let next = NextPage::after_page(
                cursor,
                page_len,
                page_limit,
                page_index,
                options.max_pages,
            );
            target = match next {
                NextPage::Cursor(url) => RequestTarget::Cursor(url),
                NextPage::Offset(skip) => {
                    RequestTarget::resource(path.clone(), params.clone().with(QUERY_SKIP, skip))
                }
                NextPage::None if cursor.is_none() && page_len < page_limit as usize => {
                    break StopReason::Exhausted;
                }
                NextPage::None => break StopReason::MaxPages,
            };
        };

        let elapsed = self.elapsed_since(start);
        info!(
            path = %path,
            records = records.len(),
            pages = pages_fetched,
            stop_reason = %stop_reason,
            elapsed_ms = elapsed.as_millis() as u64,
            "Paginated fetch complete"
        );

        Ok(FetchReport { records, pages_fetched, stop_reason, elapsed })
    }

    fn elapsed_since(&self, start: Instant) -> Duration {
        self.clock.now().saturating_duration_since(start)
    }
}
