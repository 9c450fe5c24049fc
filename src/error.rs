//! Error types for the AMM price resolver

use thiserror::Error;

/// Most characters of a response body quoted in an error message
pub const MAX_BODY_EXCERPT_CHARS: usize = 256;

/// Errors that can occur when fetching data from an external API
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Network request failed
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// Invalid response from provider
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Provider answered with no usable data
    #[error("Empty response: {0}")]
    EmptyResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Request could not be built from the given arguments
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Provider API error
    #[error("Provider API error: {0}")]
    ApiError(String),

    /// Timeout waiting for response
    #[error("Request timeout")]
    Timeout,
}

impl ProviderError {
    /// Maps a reqwest failure, keeping timeouts distinguishable
    pub fn from_request(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::NetworkError(err)
        }
    }

    /// Non-success HTTP status, quoting at most the start of the body
    pub fn http_status(status: reqwest::StatusCode, body: &str) -> Self {
        Self::ApiError(format!("HTTP {}: {}", status, body_excerpt(body)))
    }

    /// Body that failed to parse, quoting at most the start of it
    pub fn unparseable(source: &str, err: impl std::fmt::Display, body: &str) -> Self {
        Self::InvalidResponse(format!(
            "Failed to parse {} response: {}. Response ({} bytes): {}",
            source,
            err,
            body.len(),
            body_excerpt(body)
        ))
    }
}

/// First `MAX_BODY_EXCERPT_CHARS` characters of `body`, marked when cut
fn body_excerpt(body: &str) -> String {
    match body.char_indices().nth(MAX_BODY_EXCERPT_CHARS) {
        Some((end, _)) => format!("{}…", &body[..end]),
        None => body.to_string(),
    }
}

/// Errors that can occur while loading configuration overrides
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Environment variable has an invalid value
    #[error("Invalid value for {var}: {reason}")]
    InvalidValue { var: String, reason: String },
}

impl ConfigError {
    /// Creates an InvalidValue error
    pub fn invalid(var: &str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            var: var.to_string(),
            reason: reason.into(),
        }
    }
}
