//! Centralized error types for the transport stack.
//!
//! All errors are classified as either retryable or non-retryable,
//! which the retry layer uses to decide whether a failed attempt
//! should be repeated.

use thiserror::Error;

/// Common error type for transport operations.
#[derive(Error, Debug)]
pub enum TransportError {
    /// Could not establish a connection to the remote host
    #[error("Connection failed: {0}")]
    Connect(String),

    /// The request or connection attempt timed out
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Any other client-side HTTP failure
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// The request URI could not be converted for the underlying client
    #[error("Invalid request URI: {0}")]
    InvalidUri(String),

    /// A proxy URL discovered from the environment could not be parsed
    #[error("Invalid proxy URL `{url}`: {reason}")]
    InvalidProxyUrl {
        /// The offending proxy URL
        url: String,
        /// Why it was rejected
        reason: String,
    },

    /// The response returned by the server could not be read
    #[error("Failed to read response body: {0}")]
    Body(String),

    /// A request was rejected before it was sent
    #[error("Request rejected: {0}")]
    RequestRejected(String),

    /// No correlation ID was present and generation was disabled
    #[error("No correlation ID set on request and generation is disabled")]
    MissingCorrelationId,

    /// A configuration value could not be parsed
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

impl TransportError {
    /// Check if this error is retryable.
    ///
    /// Retryable errors are connection/timeout-class failures that may
    /// succeed on a later attempt. Everything else indicates a defect in
    /// the request or the local configuration and is surfaced immediately.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Connect(_) | Self::Timeout(_))
    }

    /// Classify a [`reqwest::Error`] into a transport error.
    #[must_use]
    pub fn from_reqwest(error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout(error.to_string())
        } else if error.is_connect() {
            Self::Connect(error.to_string())
        } else if error.is_body() || error.is_decode() {
            Self::Body(error.to_string())
        } else {
            Self::Http(error.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(TransportError::Connect("refused".to_string()).is_retryable());
        assert!(TransportError::Timeout("deadline".to_string()).is_retryable());
    }

    #[test]
    fn test_non_retryable_errors() {
        assert!(!TransportError::Http("bad".to_string()).is_retryable());
        assert!(!TransportError::InvalidUri("::".to_string()).is_retryable());
        assert!(!TransportError::MissingCorrelationId.is_retryable());
        assert!(
            !TransportError::RequestRejected("closed".to_string()).is_retryable()
        );
    }

    #[test]
    fn test_error_display() {
        let err = TransportError::Connect("refused".to_string());
        assert_eq!(err.to_string(), "Connection failed: refused");

        let err = TransportError::InvalidProxyUrl {
            url: "not a url".to_string(),
            reason: "missing scheme".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid proxy URL `not a url`: missing scheme"
        );
    }
}
