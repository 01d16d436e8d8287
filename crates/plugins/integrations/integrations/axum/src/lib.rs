//! # Phone OTP Axum Integration
//!
//! Mounts the framework-agnostic routes contributed by plugins onto an
//! [`axum::Router`].
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use phone_otp_axum::mount;
//! use phone_otp_core::{AuthPlugin, Router};
//!
//! let mut routes = Router::default();
//! plugin.register_routes(&mut routes);
//!
//! let app = mount(routes);
//! axum::serve(listener, app).await?;
//! ```

mod routes;

pub use routes::mount;

use axum::response::{IntoResponse, Response};
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use phone_otp_core::error::OtpError;
use phone_otp_core::router::{Method as OtpMethod, Request as OtpRequest, Response as OtpResponse};
use std::collections::HashMap;

/// Converts the parts of an axum request into a plugin request.
///
/// Returns `None` for methods no plugin route uses.
pub fn to_auth_request(
    method: &http::Method,
    uri: &http::Uri,
    headers: &HeaderMap,
    body: Option<serde_json::Value>,
) -> Option<OtpRequest> {
    let method = match *method {
        http::Method::GET => OtpMethod::GET,
        http::Method::POST => OtpMethod::POST,
        _ => return None,
    };

    let mut auth_headers = HashMap::new();
    for (key, value) in headers.iter() {
        if let Ok(v) = value.to_str() {
            auth_headers.insert(key.to_string(), v.to_string());
        }
    }

    let ip = auth_headers
        .get("x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string());

    Some(OtpRequest {
        method,
        path: uri.path().to_string(),
        headers: auth_headers,
        body,
        ip,
    })
}

/// Converts a plugin response to an axum response.
pub fn to_axum_response(auth_response: OtpResponse) -> Response {
    let status =
        StatusCode::from_u16(auth_response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let mut response = match auth_response.body {
        Some(body) => axum::Json(body).into_response(),
        None => status.into_response(),
    };

    *response.status_mut() = status;

    // Add headers
    for (key, value) in auth_response.headers {
        if let (Ok(name), Ok(val)) = (HeaderName::try_from(key), HeaderValue::try_from(value)) {
            response.headers_mut().insert(name, val);
        }
    }

    response
}

/// Wrapper for OtpError that implements IntoResponse.
#[derive(Debug)]
pub struct OtpErrorResponse(pub OtpError);

impl IntoResponse for OtpErrorResponse {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = serde_json::json!({
            "ok": false,
            "message": self.0.user_message(),
            "code": self.0.error_code(),
        });

        (status, axum::Json(body)).into_response()
    }
}

impl From<OtpError> for OtpErrorResponse {
    fn from(err: OtpError) -> Self {
        OtpErrorResponse(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_auth_request() {
        let mut headers = HeaderMap::new();
        headers.insert("cookie", HeaderValue::from_static("otp_csrf_session=abc"));
        headers.insert("x-forwarded-for", HeaderValue::from_static("10.0.0.7, 10.0.0.1"));
        let uri: http::Uri = "/api/auth/phone-number/csrf-token?lang=ar".parse().unwrap();

        let req = to_auth_request(&http::Method::GET, &uri, &headers, None).unwrap();
        assert_eq!(req.method, OtpMethod::GET);
        assert_eq!(req.path, "/api/auth/phone-number/csrf-token");
        assert_eq!(req.cookie("otp_csrf_session").as_deref(), Some("abc"));
        assert_eq!(req.ip.as_deref(), Some("10.0.0.7"));

        assert!(to_auth_request(&http::Method::DELETE, &uri, &headers, None).is_none());
    }

    #[test]
    fn test_to_axum_response() {
        let response = to_axum_response(
            OtpResponse::new(401)
                .json(serde_json::json!({ "ok": false }))
                .header("set-cookie", "a=b; Path=/"),
        );
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers().get("set-cookie").unwrap(), "a=b; Path=/");
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "application/json"
        );
    }

    #[test]
    fn test_error_response_status() {
        let response = OtpErrorResponse::from(OtpError::IssueThrottled {
            retry_after_seconds: 30,
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }
}
