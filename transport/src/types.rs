//! The transport contract shared by all layers.
//!
//! A transport accepts an outbound HTTP request and returns a response,
//! optionally delegating to an inner transport. Layers such as retry and
//! rate limiting wrap an inner transport and apply their policy around the
//! delegated call.

use crate::error::TransportResult;
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;

/// An outbound HTTP request with a fully buffered body.
pub type Request = http::Request<Bytes>;

/// An HTTP response with a fully buffered body.
pub type Response = http::Response<Bytes>;

/// The "given a request, return a response or fail" transport contract.
///
/// Implementations must be shareable across tasks; any mutable state they
/// hold has to be synchronized internally.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Handle an outbound request, producing a response or an error.
    async fn handle(&self, request: Request) -> TransportResult<Response>;
}

/// A reference-counted transport, usable as an HTTP client mount point.
pub type SharedTransport = Arc<dyn Transport>;

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn handle(&self, request: Request) -> TransportResult<Response> {
        (**self).handle(request).await
    }
}

/// Duplicate a request so an attempt can be replayed.
///
/// With `Bytes` bodies every part of a request is cheaply clonable, but
/// `http::Request` itself does not implement `Clone`, so the copy is
/// assembled from its parts. Extensions are not carried over.
#[must_use]
pub fn clone_request(request: &Request) -> Request {
    let mut builder = http::Request::builder()
        .method(request.method().clone())
        .uri(request.uri().clone())
        .version(request.version());
    if let Some(headers) = builder.headers_mut() {
        headers.extend(
            request
                .headers()
                .iter()
                .map(|(name, value)| (name.clone(), value.clone())),
        );
    }
    // The builder cannot fail here: method, URI and version come from an
    // already valid request.
    builder
        .body(request.body().clone())
        .unwrap_or_else(|_| http::Request::new(request.body().clone()))
}
