//! Typed path parameters.
//!
//! Captured path values are always strings; each registered endpoint
//! declares the scalar type every placeholder converts to, and conversion
//! happens before the handler is invoked. This replaces reflection-based
//! argument binding with an explicit name → typed value map.

use crate::error::HttpError;
use std::collections::HashMap;

/// The scalar types a path parameter can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    /// A signed integer
    Int,
    /// A floating point number
    Float,
    /// A plain string (no conversion)
    Str,
    /// A boolean (`true`/`false`/`1`/`0`)
    Bool,
}

impl ParamType {
    /// Name used in diagnostics.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Float => "float",
            Self::Str => "str",
            Self::Bool => "bool",
        }
    }

    /// Convert a captured string to a typed value.
    ///
    /// # Errors
    ///
    /// Returns a 422-equivalent [`HttpError`] naming the value, the target
    /// type and the request path when conversion fails.
    pub fn coerce(self, raw: &str, path: &str) -> Result<PathValue, HttpError> {
        let coercion_failed = || HttpError::type_coercion(raw, self.name(), path);
        match self {
            Self::Str => Ok(PathValue::Str(raw.to_string())),
            Self::Int => raw
                .parse::<i64>()
                .map(PathValue::Int)
                .map_err(|_| coercion_failed()),
            Self::Float => raw
                .parse::<f64>()
                .map(PathValue::Float)
                .map_err(|_| coercion_failed()),
            Self::Bool => match raw.to_ascii_lowercase().as_str() {
                "true" | "1" => Ok(PathValue::Bool(true)),
                "false" | "0" => Ok(PathValue::Bool(false)),
                _ => Err(coercion_failed()),
            },
        }
    }
}

/// A path value after type conversion.
#[derive(Debug, Clone, PartialEq)]
pub enum PathValue {
    /// A converted integer
    Int(i64),
    /// A converted float
    Float(f64),
    /// An as-is string
    Str(String),
    /// A converted boolean
    Bool(bool),
}

/// The typed parameters captured from a matched path.
#[derive(Debug, Clone, Default)]
pub struct PathParams {
    values: HashMap<String, PathValue>,
}

impl PathParams {
    pub(crate) fn insert(&mut self, name: String, value: PathValue) {
        self.values.insert(name, value);
    }

    /// Look up a raw typed value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PathValue> {
        self.values.get(name)
    }

    /// Number of captured parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no parameters were captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Fetch an integer parameter.
    ///
    /// # Errors
    ///
    /// Fails with an internal [`HttpError`] if the parameter is missing or
    /// was declared with a different type; both indicate a defect in the
    /// endpoint registration, not in the request.
    pub fn int(&self, name: &str) -> Result<i64, HttpError> {
        match self.get(name) {
            Some(PathValue::Int(value)) => Ok(*value),
            other => Err(wrong_parameter(name, "int", other)),
        }
    }

    /// Fetch a float parameter.
    ///
    /// # Errors
    ///
    /// See [`Self::int`].
    pub fn float(&self, name: &str) -> Result<f64, HttpError> {
        match self.get(name) {
            Some(PathValue::Float(value)) => Ok(*value),
            other => Err(wrong_parameter(name, "float", other)),
        }
    }

    /// Fetch a string parameter.
    ///
    /// # Errors
    ///
    /// See [`Self::int`].
    pub fn str(&self, name: &str) -> Result<&str, HttpError> {
        match self.get(name) {
            Some(PathValue::Str(value)) => Ok(value),
            other => Err(wrong_parameter(name, "str", other)),
        }
    }

    /// Fetch a boolean parameter.
    ///
    /// # Errors
    ///
    /// See [`Self::int`].
    pub fn bool(&self, name: &str) -> Result<bool, HttpError> {
        match self.get(name) {
            Some(PathValue::Bool(value)) => Ok(*value),
            other => Err(wrong_parameter(name, "bool", other)),
        }
    }
}

fn wrong_parameter(name: &str, expected: &str, found: Option<&PathValue>) -> HttpError {
    HttpError::new(
        500,
        "parameterMismatch",
        format!("handler requested parameter `{name}` as {expected}"),
        serde_json::json!({
            "parameter": name,
            "expected": expected,
            "found": format!("{found:?}"),
        }),
    )
}
