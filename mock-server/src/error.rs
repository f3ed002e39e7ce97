//! Error types for the mock endpoint router.
//!
//! Routing errors carry structured diagnostic data (path, method, value,
//! expected type) for machine-readable consumption, mirroring the error
//! body format `{"exception_id", "description", "data"}` used on the wire.

use bytes::Bytes;
use serde_json::json;
use thiserror::Error;

/// A domain-level HTTP exception raised by a handler or by the router.
///
/// Carries everything needed to build a structured error response: the
/// status code, a camel-cased exception identifier, a human-readable
/// description and free-form structured data.
#[derive(Error, Debug, Clone)]
#[error("{status_code} [{exception_id}]: {description}")]
pub struct HttpError {
    /// HTTP status code of the mapped response
    pub status_code: u16,
    /// Machine-readable exception identifier
    pub exception_id: String,
    /// Human-readable description
    pub description: String,
    /// Structured diagnostic data
    pub data: serde_json::Value,
}

impl HttpError {
    /// Create an exception with the given status, ID and description.
    #[must_use]
    pub fn new(
        status_code: u16,
        exception_id: impl Into<String>,
        description: impl Into<String>,
        data: serde_json::Value,
    ) -> Self {
        Self {
            status_code,
            exception_id: exception_id.into(),
            description: description.into(),
            data,
        }
    }

    /// 404-equivalent raised when no registered pattern matches a request.
    #[must_use]
    pub fn no_matching_route(path: &str, method: &str) -> Self {
        Self::new(
            404,
            "pageNotFound",
            format!("No registered path found for url '{path}' and method '{method}'"),
            json!({ "path": path, "method": method }),
        )
    }

    /// 422-equivalent raised when a captured path value cannot be converted
    /// to its declared type.
    #[must_use]
    pub fn type_coercion(value: &str, expected: &str, path: &str) -> Self {
        Self::new(
            422,
            "malformedUrl",
            format!("Unable to cast '{value}' to {expected} for path '{path}'"),
            json!({ "value": value, "parameter_type": expected, "path": path }),
        )
    }

    /// Render the exception as its JSON response body.
    #[must_use]
    pub fn body(&self) -> serde_json::Value {
        json!({
            "exception_id": self.exception_id,
            "description": self.description,
            "data": self.data,
        })
    }

    /// Render the exception as a full HTTP response.
    #[must_use]
    pub fn to_response(&self) -> http::Response<Bytes> {
        let body = Bytes::from(self.body().to_string());
        let mut response = http::Response::new(body);
        *response.status_mut() = http::StatusCode::from_u16(self.status_code)
            .unwrap_or(http::StatusCode::INTERNAL_SERVER_ERROR);
        response.headers_mut().insert(
            http::header::CONTENT_TYPE,
            http::HeaderValue::from_static("application/json"),
        );
        response
    }
}

/// Startup-time registration failure: the declared parameters and the path
/// template disagree. Always fatal; never deferred to the first request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    /// A placeholder in the template has no declared parameter type
    #[error("placeholder `{name}` in `{pattern}` is missing a type declaration")]
    UntypedParameter {
        /// Name of the untyped placeholder
        name: String,
        /// The path template being registered
        pattern: String,
    },

    /// A declared parameter does not occur in the template
    #[error("declared parameter `{name}` is not a placeholder in `{pattern}`")]
    UnknownParameter {
        /// Name of the stray parameter
        name: String,
        /// The path template being registered
        pattern: String,
    },

    /// A placeholder occurs more than once in the template
    #[error("placeholder `{name}` occurs more than once in `{pattern}`")]
    DuplicatePlaceholder {
        /// Name of the repeated placeholder
        name: String,
        /// The path template being registered
        pattern: String,
    },

    /// The template could not be compiled into a matcher
    #[error("invalid path template `{pattern}`: {reason}")]
    InvalidTemplate {
        /// The path template being registered
        pattern: String,
        /// Why compilation failed
        reason: String,
    },
}
