//! Rate limiting layer reacting to `429 Too Many Requests` signals.
//!
//! The layer serializes outgoing requests through a single adaptive pacing
//! policy: a server-issued `Retry-After` becomes the minimum interval before
//! the next request, decaying back to zero after enough throttle-free
//! requests. A small jitter window is always applied so that concurrent
//! clients never synchronize into a retry storm.

use crate::config::TransportConfig;
use crate::error::TransportResult;
use crate::types::{Request, Response, Transport};
use async_trait::async_trait;
use http::StatusCode;
use rand::Rng;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Pacing state owned by exactly one [`RateLimitingTransport`] instance.
#[derive(Debug)]
struct RateLimiterState {
    /// Requests handled since the last throttle or reset
    num_requests_since_reset: u32,
    /// Completion time of the most recent request
    last_request: Instant,
    /// Minimum interval to keep before the next request
    current_wait: Duration,
}

/// Wraps an inner transport and throttles outgoing requests.
pub struct RateLimitingTransport<T> {
    inner: T,
    jitter: Duration,
    reset_after: u32,
    state: Mutex<RateLimiterState>,
}

impl<T> RateLimitingTransport<T> {
    /// Wrap `inner` with the pacing policy from `config`.
    #[must_use]
    pub fn new(config: &TransportConfig, inner: T) -> Self {
        Self {
            inner,
            jitter: config.jitter,
            reset_after: config.reset_after,
            state: Mutex::new(RateLimiterState {
                num_requests_since_reset: 0,
                last_request: Instant::now(),
                current_wait: Duration::ZERO,
            }),
        }
    }

    /// The currently stored minimum wait between requests.
    ///
    /// Exposed for test introspection; production callers have no reason
    /// to read this.
    pub async fn current_wait(&self) -> Duration {
        self.state.lock().await.current_wait
    }
}

/// Compute the sleep before the next request.
///
/// The result is uniformly drawn from `[remaining, remaining + jitter]`
/// when a wait of `remaining` is still pending and at least as large as the
/// jitter window, and from `[remaining, jitter]` otherwise. Either way at
/// least the jitter window is in play, so two callers that became
/// synchronized (e.g. both released by the same 429) drift apart again.
#[must_use]
pub fn pacing_delay(remaining: Duration, jitter: Duration, rng: &mut impl Rng) -> Duration {
    let (low, high) = if remaining < jitter {
        (remaining, jitter)
    } else {
        (remaining, remaining + jitter)
    };
    if high <= low {
        return low;
    }
    Duration::from_secs_f64(rng.gen_range(low.as_secs_f64()..=high.as_secs_f64()))
}

/// Parse a `Retry-After` header value as a number of seconds.
///
/// HTTP-date values are not supported and yield `None`.
fn retry_after_seconds(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get(http::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|seconds| seconds.is_finite() && *seconds >= 0.0)
        .map(Duration::from_secs_f64)
}

#[async_trait]
impl<T: Transport> Transport for RateLimitingTransport<T> {
    async fn handle(&self, request: Request) -> TransportResult<Response> {
        // The lock is held across the sleep and the delegated call: pacing
        // is a property of the instance, not of the individual caller, so
        // concurrent callers must queue behind it (read-modify-write of the
        // state is one critical section per request).
        let mut state = self.state.lock().await;

        let time_elapsed = state.last_request.elapsed();
        let remaining_wait = state.current_wait.saturating_sub(time_elapsed);
        tracing::debug!(
            wait_s = state.current_wait.as_secs_f64(),
            elapsed_s = time_elapsed.as_secs_f64(),
            remaining_s = remaining_wait.as_secs_f64(),
            "pacing outbound request"
        );

        let delay = {
            let mut rng = rand::thread_rng();
            pacing_delay(remaining_wait, self.jitter, &mut rng)
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let response = self.inner.handle(request).await?;
        state.last_request = Instant::now();
        state.num_requests_since_reset += 1;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            if let Some(wait) = retry_after_seconds(&response) {
                tracing::debug!(wait_s = wait.as_secs_f64(), "received Retry-After");
                state.current_wait = wait;
            } else {
                tracing::warn!(
                    "Retry-After header missing or unparseable in 429 response, \
                     falling back to jitter"
                );
                state.current_wait = self.jitter;
            }
            state.num_requests_since_reset = 0;
        } else if self.reset_after > 0 && state.num_requests_since_reset >= self.reset_after {
            state.current_wait = Duration::ZERO;
            state.num_requests_since_reset = 0;
        }

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StatusSequence {
        statuses: Vec<(StatusCode, Option<&'static str>)>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Transport for StatusSequence {
        async fn handle(&self, _request: Request) -> TransportResult<Response> {
            let index = self.calls.fetch_add(1, Ordering::SeqCst);
            let (status, retry_after) = self.statuses[index.min(self.statuses.len() - 1)];
            let mut builder = http::Response::builder().status(status);
            if let Some(value) = retry_after {
                builder = builder.header(http::header::RETRY_AFTER, value);
            }
            Ok(builder.body(Bytes::new()).unwrap())
        }
    }

    fn request() -> Request {
        http::Request::builder()
            .uri("http://example.com/")
            .body(Bytes::new())
            .unwrap()
    }

    fn config() -> TransportConfig {
        TransportConfig::default().with_jitter(Duration::from_micros(10))
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_after_is_adopted() {
        let inner = StatusSequence {
            statuses: vec![(StatusCode::TOO_MANY_REQUESTS, Some("7"))],
            calls: AtomicUsize::new(0),
        };
        let transport = RateLimitingTransport::new(&config(), inner);

        let response = transport.handle(request()).await.unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(transport.current_wait().await, Duration::from_secs(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_retry_after_falls_back_to_jitter() {
        let inner = StatusSequence {
            statuses: vec![(StatusCode::TOO_MANY_REQUESTS, None)],
            calls: AtomicUsize::new(0),
        };
        let config = config();
        let jitter = config.jitter;
        let transport = RateLimitingTransport::new(&config, inner);

        transport.handle(request()).await.unwrap();
        assert_eq!(transport.current_wait().await, jitter);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_decays_after_reset_threshold() {
        let inner = StatusSequence {
            statuses: vec![
                (StatusCode::TOO_MANY_REQUESTS, Some("2")),
                (StatusCode::OK, None),
                (StatusCode::OK, None),
                (StatusCode::OK, None),
            ],
            calls: AtomicUsize::new(0),
        };
        let transport =
            RateLimitingTransport::new(&config().with_reset_after(3), inner);

        transport.handle(request()).await.unwrap();
        assert_eq!(transport.current_wait().await, Duration::from_secs(2));

        for _ in 0..2 {
            transport.handle(request()).await.unwrap();
            assert_eq!(transport.current_wait().await, Duration::from_secs(2));
        }

        // Third clean response reaches the threshold, forgetting the wait.
        transport.handle(request()).await.unwrap();
        assert_eq!(transport.current_wait().await, Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_never_forgotten_when_reset_disabled() {
        let inner = StatusSequence {
            statuses: vec![
                (StatusCode::TOO_MANY_REQUESTS, Some("1")),
                (StatusCode::OK, None),
                (StatusCode::OK, None),
            ],
            calls: AtomicUsize::new(0),
        };
        let transport =
            RateLimitingTransport::new(&config().with_reset_after(0), inner);

        for _ in 0..3 {
            transport.handle(request()).await.unwrap();
        }
        assert_eq!(transport.current_wait().await, Duration::from_secs(1));
    }

    #[test]
    fn test_pacing_delay_bounds() {
        let mut rng = rand::thread_rng();

        // Pending wait dominates the jitter window.
        let remaining = Duration::from_millis(50);
        let jitter = Duration::from_millis(5);
        for _ in 0..100 {
            let delay = pacing_delay(remaining, jitter, &mut rng);
            assert!(delay >= remaining);
            assert!(delay <= remaining + jitter);
        }

        // No pending wait: only the jitter window applies.
        for _ in 0..100 {
            let delay = pacing_delay(Duration::ZERO, jitter, &mut rng);
            assert!(delay <= jitter);
        }

        // Degenerate case: no wait, no jitter.
        assert_eq!(
            pacing_delay(Duration::ZERO, Duration::ZERO, &mut rng),
            Duration::ZERO
        );
    }
}
