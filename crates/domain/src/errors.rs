//! Error types used throughout the platform client

use std::time::Duration;

use thiserror::Error;

/// Categories of platform errors, used for logging and for mapping to HTTP
/// responses at the edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Token endpoint unreachable, rejected, or returned a malformed payload
    Authentication,
    /// Non-timeout failure talking to the data API
    Upstream,
    /// A single call exceeded its per-request timeout
    Timeout,
    /// Invalid configuration supplied at construction time
    Config,
    /// Caller supplied an unusable argument (bad path, bad cursor)
    InvalidInput,
    /// Anything else
    Internal,
}

/// Main error type for the platform client
#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Upstream request to {path} failed{}: {message}", status_suffix(.status))]
    UpstreamRequest { status: Option<u16>, path: String, message: String },

    #[error("Request to {path} timed out after {timeout:?}")]
    Timeout { path: String, timeout: Duration },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|code| format!(" (HTTP {code})")).unwrap_or_default()
}

impl PlatformError {
    /// Build an upstream error carrying the HTTP status of the failed call
    pub fn upstream(status: Option<u16>, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::UpstreamRequest { status, path: path.into(), message: message.into() }
    }

    /// Get the error category for this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Auth(_) => ErrorCategory::Authentication,
            Self::UpstreamRequest { .. } => ErrorCategory::Upstream,
            Self::Timeout { .. } => ErrorCategory::Timeout,
            Self::Config(_) => ErrorCategory::Config,
            Self::InvalidInput(_) => ErrorCategory::InvalidInput,
            Self::Internal(_) => ErrorCategory::Internal,
        }
    }

    /// True for timeout-classed failures, which pagination treats as a
    /// graceful stop rather than an error
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Upstream HTTP status, when the platform answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::UpstreamRequest { status, .. } => *status,
            _ => None,
        }
    }
}

/// Result type alias for platform operations
pub type Result<T> = std::result::Result<T, PlatformError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        assert_eq!(PlatformError::Auth("x".into()).category(), ErrorCategory::Authentication);
        assert_eq!(
            PlatformError::upstream(Some(500), "tables/Orders/records", "boom").category(),
            ErrorCategory::Upstream
        );
        assert_eq!(
            PlatformError::Timeout { path: "p".into(), timeout: Duration::from_secs(1) }.category(),
            ErrorCategory::Timeout
        );
        assert_eq!(PlatformError::Config("x".into()).category(), ErrorCategory::Config);
    }

    #[test]
    fn test_only_timeouts_are_timeouts() {
        let timeout = PlatformError::Timeout { path: "p".into(), timeout: Duration::from_millis(5) };
        assert!(timeout.is_timeout());
        assert!(!PlatformError::upstream(Some(504), "p", "gateway timeout").is_timeout());
        assert!(!PlatformError::Auth("timeout".into()).is_timeout());
    }

    #[test]
    fn test_upstream_display_includes_status_and_path() {
        let err = PlatformError::upstream(Some(500), "tables/Orders/records", "Internal error");
        let message = err.to_string();
        assert!(message.contains("tables/Orders/records"));
        assert!(message.contains("HTTP 500"));
        assert_eq!(err.status(), Some(500));
    }

    #[test]
    fn test_upstream_display_without_status() {
        let err = PlatformError::upstream(None, "tables/Orders/records", "connection refused");
        assert!(!err.to_string().contains("HTTP"));
        assert_eq!(err.status(), None);
    }
}
