//! Response caching layer.
//!
//! A thin wrapper around an in-memory TTL cache, intended as the outermost
//! layer of the stack so that cache hits never touch the retry or rate
//! limiting logic. Only successful responses to GET and HEAD requests are
//! stored; this is deliberately not a full HTTP cache (no validators, no
//! `Cache-Control` semantics).

use crate::config::TransportConfig;
use crate::error::TransportResult;
use crate::types::{Request, Response, Transport};
use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderMap, Method, StatusCode};
use moka::future::Cache;

/// A stored response, cheap to clone back out of the cache.
#[derive(Debug, Clone)]
struct CachedResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl CachedResponse {
    fn capture(response: &Response) -> Self {
        Self {
            status: response.status(),
            headers: response.headers().clone(),
            body: response.body().clone(),
        }
    }

    fn replay(&self) -> Response {
        let mut response = http::Response::new(self.body.clone());
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers.clone();
        response
    }
}

/// Wraps an inner transport with an in-memory response cache.
pub struct CachingTransport<T> {
    inner: T,
    cache: Cache<String, CachedResponse>,
}

impl<T> CachingTransport<T> {
    /// Wrap `inner` with a cache sized and aged per `config`.
    #[must_use]
    pub fn new(config: &TransportConfig, inner: T) -> Self {
        Self {
            inner,
            cache: Cache::builder()
                .max_capacity(config.cache_capacity)
                .time_to_live(config.cache_ttl)
                .build(),
        }
    }
}

fn cache_key(request: &Request) -> String {
    format!("{} {}", request.method(), request.uri())
}

const fn is_cacheable_method(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD)
}

#[async_trait]
impl<T: Transport> Transport for CachingTransport<T> {
    async fn handle(&self, request: Request) -> TransportResult<Response> {
        if !is_cacheable_method(request.method()) {
            return self.inner.handle(request).await;
        }

        let key = cache_key(&request);
        if let Some(hit) = self.cache.get(&key).await {
            tracing::debug!(%key, "serving response from cache");
            return Ok(hit.replay());
        }

        let response = self.inner.handle(request).await?;
        if response.status().is_success() {
            self.cache.insert(key, CachedResponse::capture(&response)).await;
        }
        Ok(response)
    }
}
