//! Correlation ID propagation for outbound requests.
//!
//! Ensures every request leaving the process carries an `X-Request-Id`
//! header so that calls can be traced across service boundaries. A header
//! already present on the request is left untouched.

use crate::error::{TransportError, TransportResult};
use crate::types::{Request, Response, Transport};
use async_trait::async_trait;
use http::HeaderValue;
use uuid::Uuid;

/// Header used to propagate the correlation ID between services.
pub const CORRELATION_ID_HEADER: &str = "X-Request-Id";

/// Wraps an inner transport and stamps a correlation ID on each request.
pub struct CorrelationTransport<T> {
    inner: T,
    generate: bool,
}

impl<T> CorrelationTransport<T> {
    /// Wrap `inner`. When `generate` is set, requests without a correlation
    /// ID get a fresh UUIDv4; otherwise such requests are rejected.
    #[must_use]
    pub const fn new(inner: T, generate: bool) -> Self {
        Self { inner, generate }
    }
}

#[async_trait]
impl<T: Transport> Transport for CorrelationTransport<T> {
    async fn handle(&self, mut request: Request) -> TransportResult<Response> {
        if !request.headers().contains_key(CORRELATION_ID_HEADER) {
            if !self.generate {
                return Err(TransportError::MissingCorrelationId);
            }
            let correlation_id = Uuid::new_v4().to_string();
            tracing::debug!(%correlation_id, "generated correlation ID for request");
            let value = HeaderValue::from_str(&correlation_id)
                .map_err(|error| TransportError::RequestRejected(error.to_string()))?;
            request.headers_mut().insert(CORRELATION_ID_HEADER, value);
        }
        self.inner.handle(request).await
    }
}
