//! Retry layer with pluggable bounded exponential backoff.
//!
//! A request attempt is retried when the inner transport fails with a
//! connection/timeout-class error or returns a response whose status code
//! is in the configured retryable set. Attempts are bounded; on exhaustion
//! the last underlying outcome is surfaced unchanged so callers see the
//! true root cause.

use crate::config::TransportConfig;
use crate::error::TransportResult;
use crate::types::{Request, Response, Transport, clone_request};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Wait/stop decisions for the retry loop, injectable at construction.
pub trait BackoffPolicy: Send + Sync {
    /// Delay to apply after the given attempt (attempts start at 1).
    fn next_delay(&self, attempt: u32) -> Duration;

    /// Whether no further attempt should be made after the given attempt.
    fn should_stop(&self, attempt: u32) -> bool;
}

/// Exponential backoff doubling from a base delay up to a cap, stopping
/// after a fixed number of retries.
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    base: Duration,
    max: Duration,
    max_attempts: u32,
}

impl ExponentialBackoff {
    /// Create a policy allowing `max_retries` retries (`max_retries + 1`
    /// total attempts), doubling from `base` and capping delays at `max`.
    #[must_use]
    pub const fn new(base: Duration, max: Duration, max_retries: u32) -> Self {
        Self {
            base,
            max,
            max_attempts: max_retries.saturating_add(1),
        }
    }

    /// Derive the default policy from a transport configuration.
    #[must_use]
    pub const fn from_config(config: &TransportConfig) -> Self {
        Self::new(Duration::from_secs(1), config.max_backoff, config.max_retries)
    }
}

impl BackoffPolicy for ExponentialBackoff {
    fn next_delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base.saturating_mul(factor).min(self.max)
    }

    fn should_stop(&self, attempt: u32) -> bool {
        attempt >= self.max_attempts
    }
}

/// Wraps an inner transport and retries transient failures.
pub struct RetryTransport<T> {
    inner: T,
    policy: Arc<dyn BackoffPolicy>,
    retry_status_codes: HashSet<u16>,
    log_retries: bool,
}

impl<T> RetryTransport<T> {
    /// Wrap `inner` with the default exponential backoff from `config`.
    #[must_use]
    pub fn new(config: &TransportConfig, inner: T) -> Self {
        Self::with_policy(config, inner, Arc::new(ExponentialBackoff::from_config(config)))
    }

    /// Wrap `inner` with a custom backoff policy.
    #[must_use]
    pub fn with_policy(
        config: &TransportConfig,
        inner: T,
        policy: Arc<dyn BackoffPolicy>,
    ) -> Self {
        Self {
            inner,
            policy,
            retry_status_codes: config.retry_status_codes.clone(),
            log_retries: config.log_retries,
        }
    }
}

#[async_trait]
impl<T: Transport> Transport for RetryTransport<T> {
    async fn handle(&self, request: Request) -> TransportResult<Response> {
        let target = format!("{} {}", request.method(), request.uri());
        let started = Instant::now();
        let mut attempt: u32 = 1;

        loop {
            let outcome = self.inner.handle(clone_request(&request)).await;
            if self.log_retries {
                tracing::info!(
                    request = %target,
                    attempt,
                    seconds_elapsed = started.elapsed().as_secs_f64(),
                    "request attempt finished"
                );
            }

            match outcome {
                Ok(response) => {
                    let retryable =
                        self.retry_status_codes.contains(&response.status().as_u16());
                    if !retryable || self.policy.should_stop(attempt) {
                        return Ok(response);
                    }
                }
                Err(error) => {
                    if !error.is_retryable() || self.policy.should_stop(attempt) {
                        return Err(error);
                    }
                }
            }

            tokio::time::sleep(self.policy.next_delay(attempt)).await;
            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use bytes::Bytes;
    use http::StatusCode;
    use std::sync::atomic::{AtomicUsize, Ordering};

    enum Script {
        Fail,
        Status(StatusCode),
    }

    struct Scripted {
        script: Vec<Script>,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn new(script: Vec<Script>) -> Self {
            Self {
                script,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Transport for Scripted {
        async fn handle(&self, _request: Request) -> TransportResult<Response> {
            let index = self.calls.fetch_add(1, Ordering::SeqCst);
            match self.script[index.min(self.script.len() - 1)] {
                Script::Fail => Err(TransportError::Connect("refused".to_string())),
                Script::Status(status) => Ok(http::Response::builder()
                    .status(status)
                    .body(Bytes::new())
                    .unwrap()),
            }
        }
    }

    fn request() -> Request {
        http::Request::builder()
            .uri("http://example.com/items")
            .body(Bytes::new())
            .unwrap()
    }

    #[test]
    fn test_exponential_delay_doubles_and_caps() {
        let policy =
            ExponentialBackoff::new(Duration::from_millis(100), Duration::from_millis(350), 5);

        assert_eq!(policy.next_delay(1), Duration::from_millis(100));
        assert_eq!(policy.next_delay(2), Duration::from_millis(200));
        assert_eq!(policy.next_delay(3), Duration::from_millis(350));
        assert_eq!(policy.next_delay(10), Duration::from_millis(350));
    }

    #[test]
    fn test_stop_after_max_retries() {
        let policy = ExponentialBackoff::new(Duration::ZERO, Duration::ZERO, 3);
        assert!(!policy.should_stop(1));
        assert!(!policy.should_stop(3));
        assert!(policy.should_stop(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_bound_surfaces_original_error() {
        let config = TransportConfig::default().with_max_retries(2);
        let transport = RetryTransport::new(&config, Scripted::new(vec![Script::Fail]));

        let error = transport.handle(request()).await.unwrap_err();
        assert!(matches!(error, TransportError::Connect(_)));
        assert_eq!(transport.inner.calls(), 3); // max_retries + 1 attempts
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_passes_through_without_retry() {
        let config = TransportConfig::default();
        let transport =
            RetryTransport::new(&config, Scripted::new(vec![Script::Status(StatusCode::OK)]));

        let response = transport.handle(request()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(transport.inner.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_retryable_status_passes_through() {
        let config = TransportConfig::default();
        let transport = RetryTransport::new(
            &config,
            Scripted::new(vec![Script::Status(StatusCode::NOT_FOUND)]),
        );

        let response = transport.handle(request()).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(transport.inner.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retryable_status_recovers() {
        let config = TransportConfig::default();
        let transport = RetryTransport::new(
            &config,
            Scripted::new(vec![
                Script::Status(StatusCode::SERVICE_UNAVAILABLE),
                Script::Status(StatusCode::OK),
            ]),
        );

        let response = transport.handle(request()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(transport.inner.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_exhaustion_returns_last_response() {
        let config = TransportConfig::default().with_max_retries(1);
        let transport = RetryTransport::new(
            &config,
            Scripted::new(vec![Script::Status(StatusCode::BAD_GATEWAY)]),
        );

        let response = transport.handle(request()).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(transport.inner.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_retryable_error_fails_fast() {
        struct Rejecting;

        #[async_trait]
        impl Transport for Rejecting {
            async fn handle(&self, _request: Request) -> TransportResult<Response> {
                Err(TransportError::InvalidUri("bad".to_string()))
            }
        }

        let config = TransportConfig::default();
        let transport = RetryTransport::new(&config, Rejecting);

        let error = transport.handle(request()).await.unwrap_err();
        assert!(matches!(error, TransportError::InvalidUri(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_policy_is_consulted() {
        struct StopImmediately;

        impl BackoffPolicy for StopImmediately {
            fn next_delay(&self, _attempt: u32) -> Duration {
                Duration::ZERO
            }

            fn should_stop(&self, _attempt: u32) -> bool {
                true
            }
        }

        let config = TransportConfig::default().with_max_retries(5);
        let transport = RetryTransport::with_policy(
            &config,
            Scripted::new(vec![Script::Fail]),
            Arc::new(StopImmediately),
        );

        let error = transport.handle(request()).await.unwrap_err();
        assert!(matches!(error, TransportError::Connect(_)));
        assert_eq!(transport.inner.calls(), 1);
    }
}
