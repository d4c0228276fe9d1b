//! Shared reqwest wrapper used by the token and REST adapters

pub mod client;

pub use client::{classify_error, status_error, HttpClient, HttpClientBuilder, HttpResponse};
