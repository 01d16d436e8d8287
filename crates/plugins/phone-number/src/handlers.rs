//! Request handlers for the Phone Number plugin.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use phone_otp_core::csrf::{CSRF_SESSION_COOKIE, CsrfGuard};
use phone_otp_core::error::OtpError;
use phone_otp_core::router::{CookieOptions, Request, RequestHandler, Response};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::issuer::OtpIssuer;
use crate::verifier::OtpVerifier;

/// Cookie carrying the session token after a successful sign-in.
pub const SESSION_COOKIE: &str = "session_token";

/// Header accepted as an alternative to `csrfToken` in the body.
pub const CSRF_HEADER: &str = "x-csrf-token";

/// Response body shared by both steps of the flow.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowResponse {
    pub ok: bool,
    pub message: String,
    /// Machine-readable error code, only set on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl FlowResponse {
    fn success(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
            code: None,
            expires_at: None,
            user_id: None,
        }
    }
}

fn error_response(err: &OtpError) -> Response {
    Response::new(err.status_code()).json(FlowResponse {
        ok: false,
        message: err.user_message(),
        code: Some(err.error_code()),
        expires_at: None,
        user_id: None,
    })
}

fn invalid_body() -> Response {
    error_response(&OtpError::invalid_input("invalid request body"))
}

/// Rejects the request unless its token matches the caller's cookie.
fn check_csrf(csrf: &CsrfGuard, req: &Request, body_token: Option<&str>) -> Result<(), Response> {
    let session_key = req.cookie(CSRF_SESSION_COOKIE);
    let token = body_token.or_else(|| req.header(CSRF_HEADER).map(String::as_str));

    if csrf.verify(session_key.as_deref(), token) {
        Ok(())
    } else {
        tracing::warn!(
            path = %req.path,
            ip = req.ip.as_deref().unwrap_or("-"),
            "rejected request with invalid anti-forgery token"
        );
        Err(error_response(&OtpError::InvalidCsrfToken))
    }
}

/// Handler for GET /phone-number/csrf-token
pub struct CsrfTokenHandler {
    pub(crate) csrf: Arc<CsrfGuard>,
}

#[async_trait]
impl RequestHandler for CsrfTokenHandler {
    async fn handle(&self, req: Request) -> Response {
        let existing = req.cookie(CSRF_SESSION_COOKIE).filter(|key| !key.is_empty());
        let session_key = existing.clone().unwrap_or_else(CsrfGuard::new_session_key);
        let token = self.csrf.token_for(&session_key);

        let response = Response::ok().json(serde_json::json!({ "csrfToken": token }));
        if existing.is_some() {
            response
        } else {
            response.cookie(CSRF_SESSION_COOKIE, &session_key, CookieOptions::secure())
        }
    }
}

/// Request body for requesting a code.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestCodeRequest {
    /// Phone number to send the code to.
    pub phone_number: String,
    pub csrf_token: Option<String>,
}

/// Handler for POST /phone-number/request-code
pub struct RequestCodeHandler {
    pub(crate) issuer: Arc<OtpIssuer>,
    pub(crate) csrf: Arc<CsrfGuard>,
}

#[async_trait]
impl RequestHandler for RequestCodeHandler {
    async fn handle(&self, req: Request) -> Response {
        let Some(body) = req.json::<RequestCodeRequest>() else {
            return invalid_body();
        };
        if let Err(rejected) = check_csrf(&self.csrf, &req, body.csrf_token.as_deref()) {
            return rejected;
        }

        match self.issuer.issue(&body.phone_number).await {
            Ok(issued) => Response::ok().json(FlowResponse {
                expires_at: Some(issued.expires_at),
                ..FlowResponse::success(format!(
                    "Verification code sent to {}",
                    issued.identifier
                ))
            }),
            Err(e) => error_response(&e),
        }
    }
}

/// Request body for submitting a code.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitCodeRequest {
    pub phone_number: String,
    pub code: String,
    pub csrf_token: Option<String>,
}

/// Handler for POST /phone-number/submit-code
pub struct SubmitCodeHandler {
    pub(crate) verifier: Arc<OtpVerifier>,
    pub(crate) csrf: Arc<CsrfGuard>,
}

#[async_trait]
impl RequestHandler for SubmitCodeHandler {
    async fn handle(&self, req: Request) -> Response {
        let Some(body) = req.json::<SubmitCodeRequest>() else {
            return invalid_body();
        };
        if let Err(rejected) = check_csrf(&self.csrf, &req, body.csrf_token.as_deref()) {
            return rejected;
        }

        match self.verifier.verify(&body.phone_number, &body.code).await {
            Ok(auth) => {
                let max_age = auth.session.max_age_seconds();
                Response::ok()
                    .json(FlowResponse {
                        user_id: Some(auth.user.id.clone()),
                        ..FlowResponse::success("Signed in successfully.")
                    })
                    .cookie(
                        SESSION_COOKIE,
                        &auth.session.token,
                        CookieOptions::secure().max_age(max_age),
                    )
            }
            Err(e) => error_response(&e),
        }
    }
}
