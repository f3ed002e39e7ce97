//! Ready-made fixtures: a sample mock API and fast transport settings.

use serde_json::json;
use std::time::Duration;
use svc_mock_server::{HttpError, MockRouter, ParamType, json_response};
use svc_transport::TransportConfig;

/// Initialize tracing for a test binary.
///
/// Safe to call from every test; only the first call installs the
/// subscriber.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

/// Transport settings tuned for paused-clock tests: tiny jitter, short
/// cache TTL, small backoff cap.
#[must_use]
pub fn fast_config() -> TransportConfig {
    TransportConfig::default()
        .with_jitter(Duration::from_millis(1))
        .with_cache_ttl(Duration::from_millis(200))
        .with_max_backoff(Duration::from_millis(50))
}

/// A small sample API used across the test suites.
///
/// Routes:
/// - `GET /hello` answers `{"hello": "world"}`
/// - `GET /items/{item_name}` echoes the name
/// - `GET /items/{item_name}/sizes/{item_size}` echoes name and integer size
/// - `POST /items` echoes the `detail` field of the body with 201, or
///   fails with a 422 `noDetail` exception
///
/// # Panics
///
/// Panics when registration fails, which would be a defect in the fixture
/// itself; intended for test code only.
#[must_use]
pub fn sample_router() -> MockRouter {
    let mut router = MockRouter::new();
    router
        .get("/hello", &[], |_ctx| {
            Ok(json_response(200, &json!({ "hello": "world" })))
        })
        .unwrap();
    router
        .get(
            "/items/{item_name}",
            &[("item_name", ParamType::Str)],
            |ctx| {
                let name = ctx.params.str("item_name")?;
                Ok(json_response(200, &json!({ "expected": name })))
            },
        )
        .unwrap();
    router
        .get(
            "/items/{item_name}/sizes/{item_size}",
            &[("item_name", ParamType::Str), ("item_size", ParamType::Int)],
            |ctx| {
                let name = ctx.params.str("item_name")?;
                let size = ctx.params.int("item_size")?;
                Ok(json_response(200, &json!({ "expected": [name, size] })))
            },
        )
        .unwrap();
    router
        .post("/items", &[], |ctx| {
            let body: serde_json::Value = serde_json::from_slice(ctx.request.body())
                .map_err(|error| HttpError::new(400, "malformedBody", error.to_string(), json!({})))?;
            let Some(detail) = body.get("detail") else {
                return Err(HttpError::new(
                    422,
                    "noDetail",
                    "No detail found in the request body",
                    json!({}),
                ));
            };
            Ok(json_response(201, &json!({ "expected": detail })))
        })
        .unwrap();
    router
}
