use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use phone_otp_core::traits::Notifier;
use phone_otp_core::types::DeliveryResult;
use phone_otp_server::{AppConfig, PhoneOtpServer};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

const CONFIG: &str = r#"
[server]
csrf_secret = "test-secret"

[sms]
user_id = "account"
password = "pw"
"#;

#[derive(Default)]
struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    fn last_code(&self) -> String {
        let messages = self.messages.lock().unwrap();
        messages
            .last()
            .and_then(|m| m.split_whitespace().last())
            .unwrap()
            .to_string()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, _identifier: &str, message: &str) -> DeliveryResult {
        self.messages.lock().unwrap().push(message.to_string());
        DeliveryResult::Success
    }
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn cookie_pair(response: &axum::response::Response) -> String {
    response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string()
}

fn post(path: &str, cookie: &str, body: serde_json::Value) -> Request<Body> {
    Request::post(path)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::COOKIE, cookie)
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_sign_in_over_http() {
    let notifier = Arc::new(RecordingNotifier::default());
    let config = AppConfig::from_toml_str(CONFIG).unwrap();
    let server = PhoneOtpServer::with_notifier(config, notifier.clone());
    let app = server.app();

    let response = app
        .clone()
        .oneshot(
            Request::get("/api/auth/phone-number/csrf-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let csrf_cookie = cookie_pair(&response);
    assert!(csrf_cookie.starts_with("otp_csrf_session="));
    let token = json_body(response).await["csrfToken"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .clone()
        .oneshot(post(
            "/api/auth/phone-number/request-code",
            &csrf_cookie,
            serde_json::json!({ "phoneNumber": "+968 9123 4567", "csrfToken": token }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await["message"],
        "Verification code sent to 96891234567"
    );

    let response = app
        .clone()
        .oneshot(post(
            "/api/auth/phone-number/submit-code",
            &csrf_cookie,
            serde_json::json!({
                "phoneNumber": "96891234567",
                "code": notifier.last_code(),
                "csrfToken": token,
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(cookie_pair(&response).starts_with("session_token="));

    // Replay of the same code is refused.
    let response = app
        .oneshot(post(
            "/api/auth/phone-number/submit-code",
            &csrf_cookie,
            serde_json::json!({
                "phoneNumber": "96891234567",
                "code": notifier.last_code(),
                "csrfToken": token,
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["code"], "CODE_EXPIRED_OR_UNKNOWN");
}

#[tokio::test]
async fn test_forged_token_is_forbidden() {
    let config = AppConfig::from_toml_str(CONFIG).unwrap();
    let notifier = Arc::new(RecordingNotifier::default());
    let app = PhoneOtpServer::with_notifier(config, notifier.clone()).app();

    let response = app
        .oneshot(post(
            "/api/auth/phone-number/request-code",
            "otp_csrf_session=abc",
            serde_json::json!({ "phoneNumber": "96891234567", "csrfToken": "nope" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(notifier.messages.lock().unwrap().is_empty());
}
