//! Pattern-matching URL router for mock endpoints.
//!
//! Endpoints are registered per HTTP method with a path template such as
//! `/items/{item_id}` plus an explicit parameter type map. Templates
//! compile into anchored regexes with named capture groups, and per-method
//! route lists are kept sorted longest-template-first so that a more
//! specific path is never shadowed by a shorter prefix of itself.

use crate::error::{HttpError, RegistrationError};
use crate::params::{ParamType, PathParams};
use bytes::Bytes;
use http::Method;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;
use svc_transport::{Request, Response, clone_request};

/// An endpoint handler: typed path parameters in, response or exception out.
pub type Handler = Arc<dyn Fn(HandlerContext) -> Result<Response, HttpError> + Send + Sync>;

/// Maps an exception raised during dispatch to a synthetic response.
pub type ExceptionHandler = Arc<dyn Fn(&Request, &HttpError) -> Response + Send + Sync>;

/// Everything a handler gets to see: the intercepted request (headers and
/// body included) and the typed path parameters.
pub struct HandlerContext {
    /// The original intercepted request
    pub request: Request,
    /// Typed values captured from the path
    pub params: PathParams,
}

/// An endpoint with its template compiled for matching.
struct RegisteredEndpoint {
    template: String,
    matcher: Regex,
    param_types: HashMap<String, ParamType>,
    handler: Handler,
}

/// A miniature URL router simulating a remote HTTP API deterministically.
#[derive(Default)]
pub struct MockRouter {
    routes: HashMap<Method, Vec<RegisteredEndpoint>>,
    exception_handler: Option<ExceptionHandler>,
}

impl MockRouter {
    /// Create a router without an exception handler: dispatch errors
    /// propagate to the caller.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a router whose dispatch errors (router- and handler-raised
    /// alike) are mapped to responses by the given handler.
    #[must_use]
    pub fn with_exception_handler<F>(handler: F) -> Self
    where
        F: Fn(&Request, &HttpError) -> Response + Send + Sync + 'static,
    {
        Self {
            routes: HashMap::new(),
            exception_handler: Some(Arc::new(handler)),
        }
    }

    /// Register an endpoint.
    ///
    /// `params` declares the scalar type of every `{placeholder}` in the
    /// template; the set of declared names must match the placeholders
    /// exactly.
    ///
    /// # Errors
    ///
    /// Fails immediately (never at first request) when a placeholder is
    /// untyped, a declared parameter has no placeholder, a placeholder
    /// repeats, or the template cannot be compiled.
    pub fn register<H>(
        &mut self,
        method: Method,
        pattern: &str,
        params: &[(&str, ParamType)],
        handler: H,
    ) -> Result<(), RegistrationError>
    where
        H: Fn(HandlerContext) -> Result<Response, HttpError> + Send + Sync + 'static,
    {
        let (matcher, names) = compile_template(pattern)?;

        let declared: HashMap<String, ParamType> = params
            .iter()
            .map(|(name, ty)| ((*name).to_string(), *ty))
            .collect();
        for name in &names {
            if !declared.contains_key(name) {
                return Err(RegistrationError::UntypedParameter {
                    name: name.clone(),
                    pattern: pattern.to_string(),
                });
            }
        }
        for name in declared.keys() {
            if !names.contains(name) {
                return Err(RegistrationError::UnknownParameter {
                    name: name.clone(),
                    pattern: pattern.to_string(),
                });
            }
        }

        let endpoint = RegisteredEndpoint {
            template: pattern.to_string(),
            matcher,
            param_types: declared,
            handler: Arc::new(handler),
        };

        // Longest template first; equal lengths keep registration order.
        let routes = self.routes.entry(method).or_default();
        let position = routes
            .iter()
            .position(|existing| existing.template.len() < pattern.len())
            .unwrap_or(routes.len());
        routes.insert(position, endpoint);
        Ok(())
    }

    /// Register a `GET` endpoint.
    ///
    /// # Errors
    ///
    /// See [`Self::register`].
    pub fn get<H>(
        &mut self,
        pattern: &str,
        params: &[(&str, ParamType)],
        handler: H,
    ) -> Result<(), RegistrationError>
    where
        H: Fn(HandlerContext) -> Result<Response, HttpError> + Send + Sync + 'static,
    {
        self.register(Method::GET, pattern, params, handler)
    }

    /// Register a `POST` endpoint.
    ///
    /// # Errors
    ///
    /// See [`Self::register`].
    pub fn post<H>(
        &mut self,
        pattern: &str,
        params: &[(&str, ParamType)],
        handler: H,
    ) -> Result<(), RegistrationError>
    where
        H: Fn(HandlerContext) -> Result<Response, HttpError> + Send + Sync + 'static,
    {
        self.register(Method::POST, pattern, params, handler)
    }

    /// Register a `PUT` endpoint.
    ///
    /// # Errors
    ///
    /// See [`Self::register`].
    pub fn put<H>(
        &mut self,
        pattern: &str,
        params: &[(&str, ParamType)],
        handler: H,
    ) -> Result<(), RegistrationError>
    where
        H: Fn(HandlerContext) -> Result<Response, HttpError> + Send + Sync + 'static,
    {
        self.register(Method::PUT, pattern, params, handler)
    }

    /// Register a `PATCH` endpoint.
    ///
    /// # Errors
    ///
    /// See [`Self::register`].
    pub fn patch<H>(
        &mut self,
        pattern: &str,
        params: &[(&str, ParamType)],
        handler: H,
    ) -> Result<(), RegistrationError>
    where
        H: Fn(HandlerContext) -> Result<Response, HttpError> + Send + Sync + 'static,
    {
        self.register(Method::PATCH, pattern, params, handler)
    }

    /// Register a `DELETE` endpoint.
    ///
    /// # Errors
    ///
    /// See [`Self::register`].
    pub fn delete<H>(
        &mut self,
        pattern: &str,
        params: &[(&str, ParamType)],
        handler: H,
    ) -> Result<(), RegistrationError>
    where
        H: Fn(HandlerContext) -> Result<Response, HttpError> + Send + Sync + 'static,
    {
        self.register(Method::DELETE, pattern, params, handler)
    }

    /// Route an intercepted request to the registered endpoint.
    ///
    /// # Errors
    ///
    /// Without an exception handler, dispatch failures (no matching route,
    /// type coercion, handler-raised exceptions) are returned as
    /// [`HttpError`]s; with one, they are mapped to responses.
    pub fn handle(&self, request: Request) -> Result<Response, HttpError> {
        let original = self
            .exception_handler
            .as_ref()
            .map(|_| clone_request(&request));
        match self.dispatch(request) {
            Ok(response) => Ok(response),
            Err(error) => match (&self.exception_handler, original) {
                (Some(handler), Some(request)) => Ok(handler(&request, &error)),
                _ => Err(error),
            },
        }
    }

    fn dispatch(&self, request: Request) -> Result<Response, HttpError> {
        let path = request.uri().path().to_string();
        let method = request.method().clone();

        for endpoint in self.routes.get(&method).into_iter().flatten() {
            let Some(captures) = endpoint.matcher.captures(&path) else {
                continue;
            };

            let mut params = PathParams::default();
            for (name, param_type) in &endpoint.param_types {
                let raw = captures.name(name).map(|m| m.as_str()).ok_or_else(|| {
                    HttpError::new(
                        500,
                        "missingCapture",
                        format!("no capture for parameter `{name}`"),
                        serde_json::json!({ "parameter": name, "path": path }),
                    )
                })?;
                params.insert(name.clone(), param_type.coerce(raw, &path)?);
            }

            let context = HandlerContext { request, params };
            return (endpoint.handler)(context);
        }

        Err(HttpError::no_matching_route(&path, method.as_str()))
    }
}

/// Build a JSON response, the common currency of mock handlers.
#[must_use]
pub fn json_response(status: u16, body: &serde_json::Value) -> Response {
    let mut response = http::Response::new(Bytes::from(body.to_string()));
    *response.status_mut() =
        http::StatusCode::from_u16(status).unwrap_or(http::StatusCode::INTERNAL_SERVER_ERROR);
    response.headers_mut().insert(
        http::header::CONTENT_TYPE,
        http::HeaderValue::from_static("application/json"),
    );
    response
}

/// Compile a path template into an anchored regex with one named capture
/// group per `{placeholder}`, e.g. `/work-packages/{package_id}` becomes
/// `^/work-packages/(?P<package_id>[^/]+)$`.
fn compile_template(pattern: &str) -> Result<(Regex, Vec<String>), RegistrationError> {
    let invalid = |reason: String| RegistrationError::InvalidTemplate {
        pattern: pattern.to_string(),
        reason,
    };

    let placeholder =
        Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").map_err(|error| invalid(error.to_string()))?;

    let mut names: Vec<String> = Vec::new();
    let mut compiled = String::from("^");
    let mut tail = 0;
    for captures in placeholder.captures_iter(pattern) {
        let (Some(whole), Some(name)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        if names.iter().any(|existing| existing == name.as_str()) {
            return Err(RegistrationError::DuplicatePlaceholder {
                name: name.as_str().to_string(),
                pattern: pattern.to_string(),
            });
        }
        compiled.push_str(&regex::escape(&pattern[tail..whole.start()]));
        compiled.push_str(&format!("(?P<{}>[^/]+)", name.as_str()));
        names.push(name.as_str().to_string());
        tail = whole.end();
    }
    let literal_tail = &pattern[tail..];
    if literal_tail.contains('{') || literal_tail.contains('}') {
        return Err(invalid("unbalanced placeholder braces".to_string()));
    }
    compiled.push_str(&regex::escape(literal_tail));
    compiled.push('$');

    let matcher = Regex::new(&compiled).map_err(|error| invalid(error.to_string()))?;
    Ok((matcher, names))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn get_request(path: &str) -> Request {
        http::Request::builder()
            .method(Method::GET)
            .uri(format!("http://localhost{path}"))
            .body(Bytes::new())
            .unwrap()
    }

    fn post_request(path: &str, body: &serde_json::Value) -> Request {
        http::Request::builder()
            .method(Method::POST)
            .uri(format!("http://localhost{path}"))
            .body(Bytes::from(body.to_string()))
            .unwrap()
    }

    fn sample_router() -> MockRouter {
        let mut router = MockRouter::new();
        router
            .get("/hello", &[], |_ctx| {
                Ok(json_response(200, &json!({ "hello": "world" })))
            })
            .unwrap();
        router
            .get("/items/{item_name}", &[("item_name", ParamType::Str)], |ctx| {
                let name = ctx.params.str("item_name")?;
                Ok(json_response(200, &json!({ "expected": name })))
            })
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
                    .map_err(|error| {
                        HttpError::new(400, "malformedBody", error.to_string(), json!({}))
                    })?;
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

    fn body_json(response: &Response) -> serde_json::Value {
        serde_json::from_slice(response.body()).unwrap()
    }

    #[test]
    fn test_simplest_get() {
        let router = sample_router();
        let response = router.handle(get_request("/hello")).unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(body_json(&response), json!({ "hello": "world" }));
    }

    #[test]
    fn test_non_existent_path() {
        let router = sample_router();
        let error = router.handle(get_request("/does/not/exist")).unwrap_err();
        assert_eq!(error.status_code, 404);
        assert_eq!(error.exception_id, "pageNotFound");
        assert_eq!(error.data["method"], "GET");
    }

    #[test]
    fn test_wrong_method_is_not_found() {
        let router = sample_router();
        let request = http::Request::builder()
            .method(Method::PATCH)
            .uri("http://localhost/hello")
            .body(Bytes::new())
            .unwrap();
        let error = router.handle(request).unwrap_err();
        assert_eq!(error.status_code, 404);
    }

    #[test]
    fn test_one_path_variable() {
        let router = sample_router();
        let response = router.handle(get_request("/items/beach_ball")).unwrap();
        assert_eq!(body_json(&response), json!({ "expected": "beach_ball" }));
    }

    #[test]
    fn test_two_path_variables_with_casting() {
        let router = sample_router();
        // The string "4" must stay a string while "9" becomes an integer.
        let response = router.handle(get_request("/items/4/sizes/9")).unwrap();
        assert_eq!(body_json(&response), json!({ "expected": ["4", 9] }));
    }

    #[test]
    fn test_bad_input_yields_422() {
        let router = sample_router();
        let error = router.handle(get_request("/items/pass/sizes/fail")).unwrap_err();
        assert_eq!(error.status_code, 422);
        assert_eq!(error.exception_id, "malformedUrl");
        assert_eq!(error.data["value"], "fail");
    }

    #[test]
    fn test_specificity_wins_in_either_registration_order() {
        // Register the longer pattern first this time; the sample router
        // registers it second.
        let mut router = MockRouter::new();
        router
            .get(
                "/items/{id}/sizes/{size}",
                &[("id", ParamType::Int), ("size", ParamType::Int)],
                |ctx| {
                    Ok(json_response(
                        200,
                        &json!({ "matched": "long", "size": ctx.params.int("size")? }),
                    ))
                },
            )
            .unwrap();
        router
            .get("/items/{id}", &[("id", ParamType::Str)], |_ctx| {
                Ok(json_response(200, &json!({ "matched": "short" })))
            })
            .unwrap();

        for router in [&router, &sample_router()] {
            let response = router.handle(get_request("/items/42/sizes/9")).unwrap();
            assert_ne!(body_json(&response).get("matched"), Some(&json!("short")));
        }

        let response = router.handle(get_request("/items/42/sizes/9")).unwrap();
        assert_eq!(body_json(&response)["matched"], "long");
        assert_eq!(body_json(&response)["size"], 9);
    }

    #[test]
    fn test_post_reads_request_body() {
        let router = sample_router();
        let response = router
            .handle(post_request("/items", &json!({ "detail": { "a key": "a value" } })))
            .unwrap();
        assert_eq!(response.status(), 201);
        assert_eq!(body_json(&response)["expected"], json!({ "a key": "a value" }));
    }

    #[test]
    fn test_post_without_detail_raises_domain_exception() {
        let router = sample_router();
        let error = router
            .handle(post_request("/items", &json!({})))
            .unwrap_err();
        assert_eq!(error.status_code, 422);
        assert_eq!(error.exception_id, "noDetail");
    }

    #[test]
    fn test_exception_handler_maps_errors_to_responses() {
        let mut router = MockRouter::with_exception_handler(|_request, error| {
            error.to_response()
        });
        router
            .post("/items", &[], |_ctx| {
                Err(HttpError::new(422, "noDetail", "No detail", json!({})))
            })
            .unwrap();

        let response = router
            .handle(post_request("/items", &json!({})))
            .unwrap();
        assert_eq!(response.status(), 422);
        assert_eq!(body_json(&response)["exception_id"], "noDetail");

        // Router-raised errors go through the same handler.
        let response = router.handle(get_request("/nope")).unwrap();
        assert_eq!(response.status(), 404);
    }

    #[test]
    fn test_untyped_placeholder_fails_at_registration() {
        let mut router = MockRouter::new();
        let error = router
            .get("/items/{item_id}", &[], |_ctx| {
                Ok(json_response(200, &json!({})))
            })
            .unwrap_err();
        assert_eq!(
            error,
            RegistrationError::UntypedParameter {
                name: "item_id".to_string(),
                pattern: "/items/{item_id}".to_string(),
            }
        );
    }

    #[test]
    fn test_stray_parameter_fails_at_registration() {
        let mut router = MockRouter::new();
        let error = router
            .get("/items", &[("item_id", ParamType::Int)], |_ctx| {
                Ok(json_response(200, &json!({})))
            })
            .unwrap_err();
        assert!(matches!(
            error,
            RegistrationError::UnknownParameter { .. }
        ));
    }

    #[test]
    fn test_duplicate_placeholder_fails_at_registration() {
        let mut router = MockRouter::new();
        let error = router
            .get("/pairs/{id}/{id}", &[("id", ParamType::Int)], |_ctx| {
                Ok(json_response(200, &json!({})))
            })
            .unwrap_err();
        assert!(matches!(
            error,
            RegistrationError::DuplicatePlaceholder { .. }
        ));
    }

    #[test]
    fn test_unbalanced_braces_fail_at_registration() {
        let mut router = MockRouter::new();
        let error = router
            .get("/items/{item_id", &[], |_ctx| {
                Ok(json_response(200, &json!({})))
            })
            .unwrap_err();
        assert!(matches!(error, RegistrationError::InvalidTemplate { .. }));
    }

    #[test]
    fn test_compile_template_shape() {
        let (matcher, names) = compile_template("/work-packages/{package_id}").unwrap();
        assert_eq!(names, vec!["package_id".to_string()]);
        let captures = matcher.captures("/work-packages/12").unwrap();
        assert_eq!(captures.name("package_id").unwrap().as_str(), "12");
        assert!(!matcher.is_match("/work-packages/12/files"));
    }
}
