//! Transport adapter plugging a [`MockRouter`] into the client stack.
//!
//! Installed as the innermost transport, the adapter lets a fully layered
//! client (retry, rate limiting, caching) be exercised end to end without
//! opening a single socket.

use crate::router::MockRouter;
use async_trait::async_trait;
use std::sync::Arc;
use svc_transport::{Request, Response, Transport, TransportResult};

/// A [`Transport`] that answers requests from a [`MockRouter`] instead of
/// the network.
///
/// Unhandled [`crate::HttpError`]s are rendered as structured JSON error
/// responses, so from the client's point of view the mock behaves exactly
/// like a remote server that maps its exceptions on the wire.
#[derive(Clone)]
pub struct MockTransport {
    router: Arc<MockRouter>,
}

impl MockTransport {
    /// Wrap a router for use as the bottom of a transport stack.
    #[must_use]
    pub fn new(router: Arc<MockRouter>) -> Self {
        Self { router }
    }
}

impl From<MockRouter> for MockTransport {
    fn from(router: MockRouter) -> Self {
        Self::new(Arc::new(router))
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn handle(&self, request: Request) -> TransportResult<Response> {
        match self.router.handle(request) {
            Ok(response) => Ok(response),
            Err(error) => Ok(error.to_response()),
        }
    }
}
