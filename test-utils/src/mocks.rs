//! Mock transports for testing.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::VecDeque;
use svc_transport::{Request, Response, Transport, TransportError, TransportResult};
use tokio::sync::Mutex;
use tokio::time::Instant;

/// One request served by a [`ScriptedTransport`].
#[derive(Debug, Clone)]
pub struct Attempt {
    /// Request method
    pub method: http::Method,
    /// Full request URI
    pub uri: String,
    /// When the attempt arrived, on the tokio clock
    pub at: Instant,
}

/// A transport that serves a scripted sequence of outcomes and records
/// every attempt.
///
/// Outcomes are consumed front to back; once the script runs out, every
/// further request gets the fallback status (200 unless changed). Attempt
/// timestamps use the tokio clock, so tests driven with a paused runtime
/// observe exact delays.
pub struct ScriptedTransport {
    script: Mutex<VecDeque<TransportResult<Response>>>,
    attempts: Mutex<Vec<Attempt>>,
    fallback_status: u16,
}

impl ScriptedTransport {
    /// Create a transport with an empty script and a 200 fallback.
    #[must_use]
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            attempts: Mutex::new(Vec::new()),
            fallback_status: 200,
        }
    }

    /// Script a bare response with the given status code.
    #[must_use]
    pub fn with_status(self, status: u16) -> Self {
        self.with_response(status_response(status))
    }

    /// Script a full response.
    #[must_use]
    pub fn with_response(mut self, response: Response) -> Self {
        self.script.get_mut().push_back(Ok(response));
        self
    }

    /// Script an error outcome.
    #[must_use]
    pub fn with_error(mut self, error: TransportError) -> Self {
        self.script.get_mut().push_back(Err(error));
        self
    }

    /// Change the status served once the script is exhausted.
    #[must_use]
    pub fn with_fallback_status(mut self, status: u16) -> Self {
        self.fallback_status = status;
        self
    }

    /// All attempts served so far, in order.
    pub async fn attempts(&self) -> Vec<Attempt> {
        self.attempts.lock().await.clone()
    }

    /// Number of attempts served so far.
    pub async fn attempt_count(&self) -> usize {
        self.attempts.lock().await.len()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn handle(&self, request: Request) -> TransportResult<Response> {
        self.attempts.lock().await.push(Attempt {
            method: request.method().clone(),
            uri: request.uri().to_string(),
            at: Instant::now(),
        });
        match self.script.lock().await.pop_front() {
            Some(outcome) => outcome,
            None => Ok(status_response(self.fallback_status)),
        }
    }
}

impl Default for ScriptedTransport {
    fn default() -> Self {
        Self::new()
    }
}

/// Build an empty response with the given status code.
#[must_use]
pub fn status_response(status: u16) -> Response {
    let mut response = http::Response::new(Bytes::new());
    *response.status_mut() =
        http::StatusCode::from_u16(status).unwrap_or(http::StatusCode::INTERNAL_SERVER_ERROR);
    response
}

/// Build an empty GET request for the given URL.
///
/// # Panics
///
/// Panics when the URL is not a valid URI; intended for test code only.
#[must_use]
pub fn get_request(url: &str) -> Request {
    http::Request::builder()
        .method(http::Method::GET)
        .uri(url)
        .body(Bytes::new())
        .unwrap()
}

/// Build a JSON request with the given method, URL and body.
///
/// # Panics
///
/// Panics when the URL is not a valid URI; intended for test code only.
#[must_use]
pub fn json_request(method: http::Method, url: &str, body: &serde_json::Value) -> Request {
    http::Request::builder()
        .method(method)
        .uri(url)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(Bytes::from(body.to_string()))
        .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_script_is_consumed_in_order() {
        let transport = ScriptedTransport::new()
            .with_status(500)
            .with_error(TransportError::Connect("scripted".to_string()))
            .with_status(200);

        let response = transport.handle(get_request("http://t/")).await.unwrap();
        assert_eq!(response.status(), 500);

        let error = transport.handle(get_request("http://t/")).await.unwrap_err();
        assert!(matches!(error, TransportError::Connect(_)));

        let response = transport.handle(get_request("http://t/")).await.unwrap();
        assert_eq!(response.status(), 200);

        // Exhausted scripts serve the fallback.
        let response = transport.handle(get_request("http://t/")).await.unwrap();
        assert_eq!(response.status(), 200);

        assert_eq!(transport.attempt_count().await, 4);
        let attempts = transport.attempts().await;
        assert_eq!(attempts[0].uri, "http://t/");
        assert_eq!(attempts[0].method, http::Method::GET);
    }

    #[tokio::test]
    async fn test_fallback_status() {
        let transport = ScriptedTransport::new().with_fallback_status(503);
        let response = transport.handle(get_request("http://t/")).await.unwrap();
        assert_eq!(response.status(), 503);
    }
}
