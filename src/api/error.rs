//! Error types for the expense API client.
//!
//! Every transport failure is normalized into an [`ApiError`] carrying an
//! [`ApiErrorKind`], so callers branch on the kind instead of inspecting
//! `reqwest` internals.

use thiserror::Error;

/// Broad classification of an API failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// No response was received (DNS, refused connection, reset).
    Network,
    /// The request exceeded the configured timeout.
    Timeout,
    /// The server answered 429 Too Many Requests.
    RateLimited,
    /// The server answered 404.
    NotFound,
    /// Any other non-success status.
    Http,
    /// A response arrived but its body could not be decoded.
    Decode,
}

/// Map an HTTP status code to an error kind.
pub fn classify_http_status(status: u16) -> ApiErrorKind {
    match status {
        429 => ApiErrorKind::RateLimited,
        404 => ApiErrorKind::NotFound,
        408 => ApiErrorKind::Timeout,
        _ => ApiErrorKind::Http,
    }
}

/// A normalized failure from the remote expense API.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ApiError {
    pub kind: ApiErrorKind,
    /// HTTP status, when the failure came from a response.
    pub status: Option<u16>,
    pub message: String,
}

impl ApiError {
    pub fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            status: None,
            message: message.into(),
        }
    }

    pub fn network(detail: impl std::fmt::Display) -> Self {
        tracing::error!("Network error: {}", detail);
        Self::new(
            ApiErrorKind::Network,
            "Network error. Please check your connection.",
        )
    }

    pub fn timeout() -> Self {
        Self::new(ApiErrorKind::Timeout, "Request timeout. Please try again.")
    }

    pub fn decode(detail: impl std::fmt::Display) -> Self {
        Self::new(
            ApiErrorKind::Decode,
            format!("Unexpected response body: {}", detail),
        )
    }

    /// Build an error from a non-success response.
    pub fn from_status(status: u16, body: &str) -> Self {
        let body = body.trim();
        let message = if body.is_empty() {
            format!("Request failed with status {}", status)
        } else {
            format!("Request failed with status {}: {}", status, body)
        };
        Self {
            kind: classify_http_status(status),
            status: Some(status),
            message,
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        self.kind == ApiErrorKind::RateLimited
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == ApiErrorKind::NotFound
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            tracing::error!("Request timeout: {}", err);
            return Self::timeout();
        }
        if let Some(status) = err.status() {
            return Self::from_status(status.as_u16(), "");
        }
        if err.is_decode() {
            return Self::decode(err);
        }
        Self::network(err)
    }
}
