//! Route mounting.

use axum::body::Bytes;
use axum::response::{IntoResponse, Response};
use axum::routing::{MethodRouter, get, post};
use http::{HeaderMap, Uri};
use phone_otp_core::error::OtpError;
use phone_otp_core::router::{Method, RequestHandler, Router};
use std::sync::Arc;

use crate::{OtpErrorResponse, to_auth_request, to_axum_response};

/// Builds an axum router serving every route collected in `router`.
///
/// Paths are prefixed with the router's base path.
///
/// # Example
///
/// ```rust,ignore
/// let app = axum::Router::new().merge(mount(routes));
/// ```
pub fn mount<S>(router: Router) -> axum::Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let base_path = router.base_path.clone();
    let mut app = axum::Router::new();

    for route in router.into_routes() {
        let path = route.full_path(&base_path);
        tracing::debug!(
            method = ?route.method,
            path = %path,
            summary = route.metadata.summary.as_deref().unwrap_or(""),
            tags = ?route.metadata.tags,
            "mounting route"
        );

        let handler: Arc<dyn RequestHandler> = Arc::from(route.handler);
        app = app.route(&path, method_router(route.method, handler));
    }

    app
}

fn method_router<S>(method: Method, handler: Arc<dyn RequestHandler>) -> MethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    let handle = move |method: http::Method, uri: Uri, headers: HeaderMap, body: Bytes| {
        let handler = handler.clone();
        async move { dispatch(handler, method, uri, headers, body).await }
    };

    match method {
        Method::GET => get(handle),
        Method::POST => post(handle),
    }
}

async fn dispatch(
    handler: Arc<dyn RequestHandler>,
    method: http::Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let json = if body.is_empty() {
        None
    } else {
        match serde_json::from_slice(&body) {
            Ok(value) => Some(value),
            Err(_) => {
                return OtpErrorResponse(OtpError::invalid_input("request body is not valid JSON"))
                    .into_response();
            }
        }
    };

    let Some(request) = to_auth_request(&method, &uri, &headers, json) else {
        return http::StatusCode::METHOD_NOT_ALLOWED.into_response();
    };

    to_axum_response(handler.handle(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use phone_otp_core::router::{Request, Response as OtpResponse, Route};
    use tower::ServiceExt;

    struct Echo;

    #[async_trait]
    impl RequestHandler for Echo {
        async fn handle(&self, req: Request) -> OtpResponse {
            OtpResponse::ok().json(serde_json::json!({
                "path": req.path,
                "body": req.body,
            }))
        }
    }

    fn app() -> axum::Router {
        let mut router = Router::default();
        router.route(Route::new(Method::POST, "/phone-number/request-code", Echo));
        router.route(Route::new(Method::GET, "/phone-number/csrf-token", Echo));
        mount(router)
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_mount_dispatches_json_body() {
        let response = app()
            .oneshot(
                http::Request::post("/api/auth/phone-number/request-code")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"phoneNumber":"96891234567"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), http::StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["path"], "/api/auth/phone-number/request-code");
        assert_eq!(body["body"]["phoneNumber"], "96891234567");
    }

    #[tokio::test]
    async fn test_mount_rejects_malformed_json() {
        let response = app()
            .oneshot(
                http::Request::post("/api/auth/phone-number/request-code")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), http::StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["code"], "INVALID_INPUT");
    }

    #[tokio::test]
    async fn test_mount_method_mismatch() {
        let response = app()
            .oneshot(
                http::Request::get("/api/auth/phone-number/request-code")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), http::StatusCode::METHOD_NOT_ALLOWED);
    }
}
