//! Transport stack configuration.
//!
//! Constructed once at service startup and shared read-only by every
//! transport instance built from it.

use crate::error::{TransportError, TransportResult};
use std::collections::HashSet;
use std::time::Duration;

/// Status codes that trigger a retry unless configured otherwise.
pub const DEFAULT_RETRY_STATUS_CODES: [u16; 6] = [408, 429, 500, 502, 503, 504];

/// Environment variable prefix for [`TransportConfig::from_env`].
const ENV_PREFIX: &str = "TRANSPORT_";

/// Transport stack configuration.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Number of seconds after which a cached response is considered stale
    pub cache_ttl: Duration,
    /// Maximum number of entries the response cache holds before eviction
    pub cache_capacity: u64,
    /// Maximum amount of jitter added to each request
    pub jitter: Duration,
    /// Number of requests after which a stored 429 delay is forgotten
    /// (0 means it is never forgotten)
    pub reset_after: u32,
    /// Cap for exponential backoff delays between retries
    pub max_backoff: Duration,
    /// Number of times a failed request is retried
    pub max_retries: u32,
    /// Status codes that trigger retrying a request
    pub retry_status_codes: HashSet<u16>,
    /// Whether retry attempts are logged
    pub log_retries: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(60),
            cache_capacity: 128,
            jitter: Duration::from_millis(1),
            reset_after: 1,
            max_backoff: Duration::from_secs(60),
            max_retries: 3,
            retry_status_codes: DEFAULT_RETRY_STATUS_CODES.into_iter().collect(),
            log_retries: false,
        }
    }
}

impl TransportConfig {
    /// Create a config with custom cache TTL.
    #[must_use]
    pub const fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Create a config with custom cache capacity.
    #[must_use]
    pub const fn with_cache_capacity(mut self, capacity: u64) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// Create a config with custom jitter.
    #[must_use]
    pub const fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    /// Create a config with a custom throttle-reset threshold.
    #[must_use]
    pub const fn with_reset_after(mut self, reset_after: u32) -> Self {
        self.reset_after = reset_after;
        self
    }

    /// Create a config with a custom backoff cap.
    #[must_use]
    pub const fn with_max_backoff(mut self, max_backoff: Duration) -> Self {
        self.max_backoff = max_backoff;
        self
    }

    /// Create a config with custom max retries.
    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Create a config with custom retryable status codes.
    #[must_use]
    pub fn with_retry_status_codes(mut self, codes: impl IntoIterator<Item = u16>) -> Self {
        self.retry_status_codes = codes.into_iter().collect();
        self
    }

    /// Create a config with retry logging enabled.
    #[must_use]
    pub const fn with_log_retries(mut self, log_retries: bool) -> Self {
        self.log_retries = log_retries;
        self
    }

    /// Build a config from `TRANSPORT_*` environment variables.
    ///
    /// Unset variables fall back to their defaults. Recognized variables:
    /// `TRANSPORT_CACHE_TTL`, `TRANSPORT_CACHE_CAPACITY`,
    /// `TRANSPORT_JITTER`, `TRANSPORT_RESET_AFTER`,
    /// `TRANSPORT_EXPONENTIAL_BACKOFF_MAX`, `TRANSPORT_MAX_RETRIES`,
    /// `TRANSPORT_RETRY_STATUS_CODES` (comma-separated),
    /// `TRANSPORT_LOG_RETRIES`. Durations are given in seconds and may be
    /// fractional.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::InvalidConfig`] when a set variable cannot
    /// be parsed.
    pub fn from_env() -> TransportResult<Self> {
        let mut config = Self::default();
        if let Some(ttl) = env_seconds("CACHE_TTL")? {
            config.cache_ttl = ttl;
        }
        if let Some(capacity) = env_parsed::<u64>("CACHE_CAPACITY")? {
            config.cache_capacity = capacity;
        }
        if let Some(jitter) = env_seconds("JITTER")? {
            config.jitter = jitter;
        }
        if let Some(reset_after) = env_parsed::<u32>("RESET_AFTER")? {
            config.reset_after = reset_after;
        }
        if let Some(max_backoff) = env_seconds("EXPONENTIAL_BACKOFF_MAX")? {
            config.max_backoff = max_backoff;
        }
        if let Some(max_retries) = env_parsed::<u32>("MAX_RETRIES")? {
            config.max_retries = max_retries;
        }
        if let Some(raw) = env_raw("RETRY_STATUS_CODES") {
            config.retry_status_codes = parse_status_codes(&raw)?;
        }
        if let Some(log_retries) = env_parsed::<bool>("LOG_RETRIES")? {
            config.log_retries = log_retries;
        }
        Ok(config)
    }
}

/// Connection limits for the base transport.
#[derive(Debug, Clone)]
pub struct Limits {
    /// Request timeout
    pub timeout: Duration,
    /// Connection timeout
    pub connect_timeout: Duration,
    /// Pool idle timeout
    pub pool_idle_timeout: Duration,
    /// Maximum idle connections per host
    pub pool_max_idle_per_host: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            pool_idle_timeout: Duration::from_secs(90),
            pool_max_idle_per_host: 10,
        }
    }
}

impl Limits {
    /// Create limits with a custom request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Create limits with custom pool settings.
    #[must_use]
    pub const fn with_pool_config(mut self, idle_timeout: Duration, max_idle: usize) -> Self {
        self.pool_idle_timeout = idle_timeout;
        self.pool_max_idle_per_host = max_idle;
        self
    }
}

fn env_raw(name: &str) -> Option<String> {
    std::env::var(format!("{ENV_PREFIX}{name}"))
        .ok()
        .filter(|value| !value.trim().is_empty())
}

fn env_parsed<T: std::str::FromStr>(name: &str) -> TransportResult<Option<T>> {
    env_raw(name)
        .map(|raw| {
            raw.trim().parse::<T>().map_err(|_| {
                TransportError::InvalidConfig(format!(
                    "cannot parse {ENV_PREFIX}{name}={raw}"
                ))
            })
        })
        .transpose()
}

fn env_seconds(name: &str) -> TransportResult<Option<Duration>> {
    Ok(env_parsed::<f64>(name)?
        .map(|seconds| {
            if seconds.is_finite() && seconds >= 0.0 {
                Ok(Duration::from_secs_f64(seconds))
            } else {
                Err(TransportError::InvalidConfig(format!(
                    "{ENV_PREFIX}{name} must be a non-negative number of seconds"
                )))
            }
        })
        .transpose()?)
}

fn parse_status_codes(raw: &str) -> TransportResult<HashSet<u16>> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<u16>().map_err(|_| {
                TransportError::InvalidConfig(format!(
                    "invalid status code `{part}` in {ENV_PREFIX}RETRY_STATUS_CODES"
                ))
            })
        })
        .collect()
}
