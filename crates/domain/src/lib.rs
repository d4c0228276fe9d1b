//! # Caspio Proxy Domain
//!
//! Shared types for the platform access client.
//!
//! This crate contains:
//! - The error taxonomy (`PlatformError`) and `Result` alias
//! - Configuration structures consumed at construction time
//! - Platform constants (query keys, envelope fields, defaults)
//! - Record and query parameter types
//!
//! ## Architecture
//! - No dependencies on other workspace crates
//! - No I/O, no environment access

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
