//! Mock endpoint router for simulating a remote HTTP API in tests.
//!
//! This crate provides a miniature URL router with type-safe path-parameter
//! extraction:
//! - [`MockRouter`] registers `{name}`-templated paths per HTTP method and
//!   dispatches intercepted requests to handlers, longest pattern first
//! - [`HttpError`] carries machine-readable diagnostics
//!   (status code, exception ID, description, structured data)
//! - [`MockTransport`] plugs a router into the `svc-transport` stack so a
//!   client can be exercised without any network I/O

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod params;
pub mod router;
pub mod transport;

pub use error::{HttpError, RegistrationError};
pub use params::{ParamType, PathParams, PathValue};
pub use router::{Handler, HandlerContext, MockRouter, json_response};
pub use transport::MockTransport;
