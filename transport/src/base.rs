//! Base network transport backed by a reqwest client.
//!
//! This is the innermost layer of the stack: it performs the actual
//! network I/O with rustls TLS, connection pooling and an optional
//! outbound proxy.

use crate::config::Limits;
use crate::error::{TransportError, TransportResult};
use crate::types::{Request, Response, Transport};
use async_trait::async_trait;
use url::Url;

/// The real network transport, executing requests via [`reqwest`].
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport with default connection limits and no proxy.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying client cannot be built
    /// (e.g. TLS initialization fails).
    pub fn new() -> TransportResult<Self> {
        Self::with_limits(&Limits::default(), None)
    }

    /// Create a transport with the given connection limits and an optional
    /// outbound proxy through which all requests are routed.
    ///
    /// # Errors
    ///
    /// Returns an error if the proxy URL is rejected or the client cannot
    /// be built.
    pub fn with_limits(limits: &Limits, proxy: Option<&Url>) -> TransportResult<Self> {
        let mut builder = reqwest::ClientBuilder::new()
            .timeout(limits.timeout)
            .connect_timeout(limits.connect_timeout)
            .pool_idle_timeout(limits.pool_idle_timeout)
            .pool_max_idle_per_host(limits.pool_max_idle_per_host)
            .use_rustls_tls();

        if let Some(proxy_url) = proxy {
            let proxy = reqwest::Proxy::all(proxy_url.as_str()).map_err(|error| {
                TransportError::InvalidProxyUrl {
                    url: proxy_url.to_string(),
                    reason: error.to_string(),
                }
            })?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|error| TransportError::Http(error.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn handle(&self, request: Request) -> TransportResult<Response> {
        let outbound = reqwest::Request::try_from(request)
            .map_err(|error| TransportError::InvalidUri(error.to_string()))?;

        let inbound = self
            .client
            .execute(outbound)
            .await
            .map_err(|error| TransportError::from_reqwest(&error))?;

        let status = inbound.status();
        let version = inbound.version();
        let headers = inbound.headers().clone();
        let body = inbound
            .bytes()
            .await
            .map_err(|error| TransportError::Body(error.to_string()))?;

        let mut response = http::Response::builder()
            .status(status)
            .version(version)
            .body(body)
            .map_err(|error| TransportError::Body(error.to_string()))?;
        *response.headers_mut() = headers;
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_build_transport() {
        assert!(HttpTransport::new().is_ok());
    }

    #[test]
    fn test_build_with_proxy() {
        let limits = Limits::default().with_timeout(Duration::from_secs(5));
        let proxy = Url::parse("http://proxy.example.com:8080").unwrap();
        assert!(HttpTransport::with_limits(&limits, Some(&proxy)).is_ok());
    }
}
