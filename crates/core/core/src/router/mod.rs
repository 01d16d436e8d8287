//! Framework-agnostic router for plugin routes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// HTTP methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Method {
    GET,
    POST,
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Method::GET => write!(f, "GET"),
            Method::POST => write!(f, "POST"),
        }
    }
}

/// A generic HTTP request representation.
#[derive(Debug, Clone)]
pub struct Request {
    /// HTTP method.
    pub method: Method,
    /// Request path.
    pub path: String,
    /// Request headers (lowercase keys).
    pub headers: HashMap<String, String>,
    /// Request body (JSON).
    pub body: Option<Value>,
    /// Client IP address, when the transport knows it.
    pub ip: Option<String>,
}

impl Request {
    /// Creates a new request.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HashMap::new(),
            body: None,
            ip: None,
        }
    }

    /// Sets a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into().to_lowercase(), value.into());
        self
    }

    /// Sets the JSON body.
    pub fn with_json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Gets a header value.
    pub fn header(&self, name: &str) -> Option<&String> {
        self.headers.get(&name.to_lowercase())
    }

    /// Gets a cookie value from the `cookie` header.
    pub fn cookie(&self, name: &str) -> Option<String> {
        self.header("cookie")?
            .split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.to_string())
    }

    /// Deserializes the body to a type.
    pub fn json<T: for<'de> Deserialize<'de>>(&self) -> Option<T> {
        self.body
            .as_ref()
            .and_then(|b| serde_json::from_value(b.clone()).ok())
    }
}

/// A generic HTTP response representation.
#[derive(Debug, Clone)]
pub struct Response {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: HashMap<String, String>,
    /// Response body (JSON).
    pub body: Option<Value>,
}

impl Response {
    /// Creates a new response with status code.
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: None,
        }
    }

    /// Creates a 200 OK response.
    pub fn ok() -> Self {
        Self::new(200)
    }

    /// Sets the response body as JSON.
    pub fn json<T: Serialize>(mut self, body: T) -> Self {
        self.body = serde_json::to_value(body).ok();
        self.headers
            .insert("content-type".to_string(), "application/json".to_string());
        self
    }

    /// Sets a header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into().to_lowercase(), value.into());
        self
    }

    /// Sets a cookie.
    pub fn cookie(self, name: &str, value: &str, options: CookieOptions) -> Self {
        let cookie_str = format!(
            "{}={}{}{}{}{}{}",
            name,
            value,
            options
                .path
                .map(|p| format!("; Path={}", p))
                .unwrap_or_default(),
            if options.http_only { "; HttpOnly" } else { "" },
            if options.secure { "; Secure" } else { "" },
            options
                .same_site
                .map(|s| format!("; SameSite={}", s))
                .unwrap_or_default(),
            options
                .max_age
                .map(|a| format!("; Max-Age={}", a))
                .unwrap_or_default(),
        );
        self.header("set-cookie", cookie_str)
    }
}

/// Cookie options.
#[derive(Debug, Clone, Default)]
pub struct CookieOptions {
    pub http_only: bool,
    pub secure: bool,
    pub same_site: Option<String>,
    pub max_age: Option<i64>,
    pub path: Option<String>,
}

impl CookieOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn secure() -> Self {
        Self {
            http_only: true,
            secure: true,
            same_site: Some("Lax".to_string()),
            path: Some("/".to_string()),
            ..Default::default()
        }
    }

    pub fn max_age(mut self, seconds: i64) -> Self {
        self.max_age = Some(seconds);
        self
    }
}

/// Trait for request handlers.
#[async_trait]
pub trait RequestHandler: Send + Sync {
    /// Handles a request and returns a response.
    async fn handle(&self, req: Request) -> Response;
}

/// A route definition.
pub struct Route {
    /// The HTTP method.
    pub method: Method,
    /// The path pattern.
    pub path: String,
    /// The handler function.
    pub handler: Box<dyn RequestHandler>,
    /// Route metadata for documentation.
    pub metadata: RouteMetadata,
}

/// Metadata for route documentation.
#[derive(Debug, Clone, Default)]
pub struct RouteMetadata {
    /// Short summary.
    pub summary: Option<String>,
    /// Detailed description.
    pub description: Option<String>,
    /// Tags for grouping.
    pub tags: Vec<String>,
}

impl Route {
    /// Creates a new route.
    pub fn new(method: Method, path: impl Into<String>, handler: impl RequestHandler + 'static) -> Self {
        Self {
            method,
            path: path.into(),
            handler: Box::new(handler),
            metadata: RouteMetadata::default(),
        }
    }

    /// Sets the summary.
    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.metadata.summary = Some(summary.into());
        self
    }

    /// Sets the description.
    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.metadata.description = Some(desc.into());
        self
    }

    /// Adds a tag.
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.metadata.tags.push(tag.into());
        self
    }

    /// Returns the path prefixed with the router's base path.
    pub fn full_path(&self, base_path: &str) -> String {
        format!("{}{}", base_path.trim_end_matches('/'), self.path)
    }
}

/// A router that collects routes from plugins.
pub struct Router {
    /// Base path prefix.
    pub base_path: String,
    /// Collected routes.
    routes: Vec<Route>,
}

impl Router {
    /// Creates a new router with a base path.
    pub fn new(base_path: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            routes: Vec::new(),
        }
    }

    /// Adds a route.
    pub fn route(&mut self, route: Route) {
        self.routes.push(route);
    }

    /// Returns all routes.
    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter()
    }

    /// Consumes the router, yielding its routes.
    pub fn into_routes(self) -> Vec<Route> {
        self.routes
    }

    /// Finds the route registered for a method and relative path.
    pub fn find(&self, method: Method, path: &str) -> Option<&Route> {
        self.routes
            .iter()
            .find(|r| r.method == method && r.path == path)
    }

    /// Returns the number of routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns true if there are no routes.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new("/api/auth")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    #[async_trait]
    impl RequestHandler for Echo {
        async fn handle(&self, req: Request) -> Response {
            Response::ok().json(serde_json::json!({ "path": req.path }))
        }
    }

    #[test]
    fn test_cookie_parsing() {
        let req = Request::new(Method::GET, "/")
            .with_header("Cookie", "theme=dark; otp_csrf_session=abc123; lang=ar");
        assert_eq!(req.cookie("otp_csrf_session").as_deref(), Some("abc123"));
        assert_eq!(req.cookie("missing"), None);
    }

    #[test]
    fn test_set_cookie_header() {
        let resp = Response::ok().cookie("session_token", "tok", CookieOptions::secure().max_age(60));
        assert_eq!(
            resp.headers.get("set-cookie").map(String::as_str),
            Some("session_token=tok; Path=/; HttpOnly; Secure; SameSite=Lax; Max-Age=60")
        );
    }

    #[tokio::test]
    async fn test_router_find() {
        let mut router = Router::new("/api/auth/");
        router.route(Route::new(Method::POST, "/echo", Echo).tag("test"));

        let route = router.find(Method::POST, "/echo").unwrap();
        assert_eq!(route.full_path(&router.base_path), "/api/auth/echo");
        assert!(router.find(Method::GET, "/echo").is_none());

        let resp = route.handler.handle(Request::new(Method::POST, "/echo")).await;
        assert_eq!(resp.body.unwrap()["path"], "/echo");
    }
}
