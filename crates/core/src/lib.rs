//! # Caspio Proxy Core
//!
//! Platform access logic with no HTTP code.
//!
//! This crate contains:
//! - The token cache (`TokenStore`, `CachingTokenProvider`)
//! - The single-call `RequestExecutor`
//! - The `PaginatedFetchEngine`
//! - Port traits implemented by the infra crate
//!
//! ## Architecture Principles
//! - Only depends on `caspio-proxy-domain`
//! - Network access goes through `ports`
//! - Time goes through `clock::Clock`

pub mod clock;
pub mod executor;
pub mod pagination;
pub mod ports;
pub mod token;

pub use clock::{Clock, MockClock, SystemClock};
pub use executor::RequestExecutor;
pub use pagination::{
    EarlyExitFn, FetchOptions, FetchReport, NextPage, PageCallbackFn, PaginatedFetchEngine,
    StopReason,
};
pub use ports::{
    AccessTokenProvider, Envelope, PlatformRequest, PlatformTransport, TokenFetcher, TokenGrant,
};
pub use token::{AccessToken, CachingTokenProvider, TokenStore};
