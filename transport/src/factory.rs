//! Assembly of the transport chain and per-proxy mount maps.
//!
//! The canonical layering is cache (outermost, optional) → retry →
//! rate limiting → network: a retried attempt still respects pacing, and a
//! cache hit never touches either policy layer.

use crate::base::HttpTransport;
use crate::cache::CachingTransport;
use crate::config::{Limits, TransportConfig};
use crate::error::TransportResult;
use crate::ratelimit::RateLimitingTransport;
use crate::retry::RetryTransport;
use crate::types::{SharedTransport, Transport};
use std::collections::HashMap;
use std::sync::Arc;
use url::Url;

/// Mount key matching plain HTTP request URLs.
pub const HTTP_MOUNT: &str = "http://";
/// Mount key matching HTTPS request URLs.
pub const HTTPS_MOUNT: &str = "https://";
/// Fallback mount key matching any request URL.
pub const ALL_MOUNT: &str = "all://";

const PROXY_ENV_VARS: [(&str, &str); 3] = [
    (HTTP_MOUNT, "HTTP_PROXY"),
    (HTTPS_MOUNT, "HTTPS_PROXY"),
    (ALL_MOUNT, "ALL_PROXY"),
];

/// Discover outbound proxies from the environment.
///
/// Reads `HTTP_PROXY`, `HTTPS_PROXY` and `ALL_PROXY` (upper- or lowercase)
/// into a map keyed by mount scheme. Unset, empty and unparseable entries
/// are skipped (the latter with a warning).
#[must_use]
pub fn environment_proxies() -> HashMap<String, Url> {
    let mut proxies = HashMap::new();
    for (mount, var) in PROXY_ENV_VARS {
        let value = std::env::var(var)
            .or_else(|_| std::env::var(var.to_lowercase()))
            .ok()
            .filter(|value| !value.trim().is_empty());
        let Some(value) = value else { continue };
        match Url::parse(&value) {
            Ok(url) => {
                proxies.insert(mount.to_string(), url);
            }
            Err(error) => {
                tracing::warn!(%var, %value, %error, "ignoring unparseable proxy URL");
            }
        }
    }
    proxies
}

/// Composes transport layers into finished per-mount pipelines.
#[derive(Debug, Clone)]
pub struct TransportFactory {
    config: TransportConfig,
    limits: Limits,
}

impl TransportFactory {
    /// Create a factory with default connection limits.
    #[must_use]
    pub fn new(config: TransportConfig) -> Self {
        Self {
            config,
            limits: Limits::default(),
        }
    }

    /// Create a factory with custom connection limits for the base layer.
    #[must_use]
    pub const fn with_limits(config: TransportConfig, limits: Limits) -> Self {
        Self { config, limits }
    }

    /// Wrap any base transport in the retry-over-rate-limit chain.
    #[must_use]
    pub fn layer<B: Transport>(&self, base: B) -> RetryTransport<RateLimitingTransport<B>> {
        let rate_limited = RateLimitingTransport::new(&self.config, base);
        RetryTransport::new(&self.config, rate_limited)
    }

    /// Build the full chain on top of the network transport.
    ///
    /// # Errors
    ///
    /// Fails if the base transport cannot be constructed (bad proxy URL,
    /// TLS initialization failure).
    pub fn rate_limited_retry_transport(
        &self,
        proxy: Option<&Url>,
    ) -> TransportResult<SharedTransport> {
        let base = HttpTransport::with_limits(&self.limits, proxy)?;
        Ok(Arc::new(self.layer(base)))
    }

    /// Build the full chain with a response cache as the outermost layer.
    ///
    /// # Errors
    ///
    /// Fails if the base transport cannot be constructed.
    pub fn cached_rate_limited_retry_transport(
        &self,
        proxy: Option<&Url>,
    ) -> TransportResult<SharedTransport> {
        let base = HttpTransport::with_limits(&self.limits, proxy)?;
        Ok(Arc::new(CachingTransport::new(&self.config, self.layer(base))))
    }

    /// One finished transport per proxy discovered in the environment,
    /// keyed by mount scheme. Schemes without a configured proxy are
    /// omitted.
    ///
    /// # Errors
    ///
    /// Fails if any transport in the map cannot be constructed.
    pub fn rate_limited_retry_mounts(&self) -> TransportResult<HashMap<String, SharedTransport>> {
        self.rate_limited_retry_mounts_for(&environment_proxies())
    }

    /// Like [`Self::rate_limited_retry_mounts`], with an explicit proxy map.
    ///
    /// # Errors
    ///
    /// Fails if any transport in the map cannot be constructed.
    pub fn rate_limited_retry_mounts_for(
        &self,
        proxies: &HashMap<String, Url>,
    ) -> TransportResult<HashMap<String, SharedTransport>> {
        proxies
            .iter()
            .map(|(mount, proxy)| {
                Ok((
                    mount.clone(),
                    self.rate_limited_retry_transport(Some(proxy))?,
                ))
            })
            .collect()
    }

    /// Cached variant of [`Self::rate_limited_retry_mounts`].
    ///
    /// # Errors
    ///
    /// Fails if any transport in the map cannot be constructed.
    pub fn cached_rate_limited_retry_mounts(
        &self,
    ) -> TransportResult<HashMap<String, SharedTransport>> {
        self.cached_rate_limited_retry_mounts_for(&environment_proxies())
    }

    /// Like [`Self::cached_rate_limited_retry_mounts`], with an explicit
    /// proxy map.
    ///
    /// # Errors
    ///
    /// Fails if any transport in the map cannot be constructed.
    pub fn cached_rate_limited_retry_mounts_for(
        &self,
        proxies: &HashMap<String, Url>,
    ) -> TransportResult<HashMap<String, SharedTransport>> {
        proxies
            .iter()
            .map(|(mount, proxy)| {
                Ok((
                    mount.clone(),
                    self.cached_rate_limited_retry_transport(Some(proxy))?,
                ))
            })
            .collect()
    }
}
