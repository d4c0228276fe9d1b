//! # Caspio Proxy Infrastructure
//!
//! reqwest-backed implementations of the core ports, plus the
//! [`PlatformClient`] facade that route handlers use.
//!
//! This crate contains:
//! - The shared HTTP client wrapper
//! - The client-credentials token fetcher
//! - The REST v2 transport and envelope parsing
//! - Configuration loading from environment or file
//!
//! ## Architecture
//! - Implements traits defined in `caspio-proxy-core`
//! - Contains all "impure" code (network, environment, filesystem)

pub mod auth;
pub mod client;
pub mod config;
pub mod http;
pub mod transport;

// Re-export commonly used items
pub use auth::ClientCredentialsFetcher;
pub use caspio_proxy_core::{FetchOptions, FetchReport, StopReason};
pub use client::{PlatformClient, PlatformClientBuilder};
pub use http::{HttpClient, HttpClientBuilder};
pub use transport::RestTransport;
