//! Composable HTTP client transport stack for HTTP microservices.
//!
//! This crate provides centralized implementations for:
//! - A [`Transport`] trait mirroring the "request in, response out" contract
//!   of an async HTTP client transport
//! - Rate limiting that adapts to `429 Too Many Requests` signals
//! - Retries with pluggable bounded exponential backoff
//! - Response caching as an optional outermost layer
//! - Correlation ID propagation across service boundaries
//! - A factory assembling the layers into per-scheme proxy mounts

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod base;
pub mod cache;
pub mod config;
pub mod correlation;
pub mod error;
pub mod factory;
pub mod ratelimit;
pub mod retry;
pub mod types;

pub use base::HttpTransport;
pub use cache::CachingTransport;
pub use config::{Limits, TransportConfig};
pub use correlation::{CORRELATION_ID_HEADER, CorrelationTransport};
pub use error::{TransportError, TransportResult};
pub use factory::{
    ALL_MOUNT, HTTP_MOUNT, HTTPS_MOUNT, TransportFactory, environment_proxies,
};
pub use ratelimit::RateLimitingTransport;
pub use retry::{BackoffPolicy, ExponentialBackoff, RetryTransport};
pub use types::{Request, Response, SharedTransport, Transport, clone_request};
