//! # Chain Client Errors

use thiserror::Error;

/// Errors from the chain API.
#[derive(Debug, Clone, Error)]
pub enum ChainApiError {
    /// Transport-level failure (DNS, connect, TLS, reset).
    #[error("network error: {0}")]
    Network(String),

    /// The request ran out of time.
    #[error("request timed out")]
    Timeout,

    /// Non-success HTTP status.
    #[error("unexpected status {code}")]
    Status { code: u16 },

    /// The body did not decode into the expected shape.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// A field the caller depends on was absent.
    #[error("missing field in response: {0}")]
    MissingField(&'static str),
}

impl ChainApiError {
    /// Whether retrying the same request can reasonably succeed.
    ///
    /// Server-side (5xx) and rate-limit (429) statuses are transient;
    /// other statuses and decode failures are not.
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout => true,
            Self::Status { code } => *code == 429 || *code >= 500,
            Self::Decode(_) | Self::MissingField(_) => false,
        }
    }
}

impl From<reqwest::Error> for ChainApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if let Some(status) = err.status() {
            Self::Status {
                code: status.as_u16(),
            }
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retriable_classification() {
        assert!(ChainApiError::Network("reset".to_string()).is_retriable());
        assert!(ChainApiError::Timeout.is_retriable());
        assert!(ChainApiError::Status { code: 503 }.is_retriable());
        assert!(ChainApiError::Status { code: 429 }.is_retriable());
        assert!(!ChainApiError::Status { code: 404 }.is_retriable());
        assert!(!ChainApiError::Decode("bad json".to_string()).is_retriable());
    }
}
