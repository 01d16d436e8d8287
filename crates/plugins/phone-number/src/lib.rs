//! # Phone Number Plugin
//!
//! Passwordless sign-in with a phone number and a one-time code sent by SMS.
//! A code is requested for a number, delivered through a [`Notifier`], and
//! exchanged for a session exactly once. First-time numbers are registered
//! on successful verification.

mod config;
mod handlers;
mod issuer;
mod phone;
mod verifier;

pub use config::{CODE_PLACEHOLDER, PhoneNumberConfig, PhoneValidatorFn};
pub use handlers::{
    CSRF_HEADER, CsrfTokenHandler, FlowResponse, RequestCodeHandler, RequestCodeRequest,
    SESSION_COOKIE, SubmitCodeHandler, SubmitCodeRequest,
};
pub use issuer::{IssuedCode, OtpIssuer};
pub use phone::{MAX_PHONE_DIGITS, MIN_PHONE_DIGITS, normalize_phone_number};
pub use verifier::{Authenticated, OtpVerifier};

use phone_otp_core::clock::{Clock, SystemClock};
use phone_otp_core::csrf::CsrfGuard;
use phone_otp_core::router::{Method, Route, Router};
use phone_otp_core::traits::{AuthPlugin, IdentityProvider, Notifier};
use phone_otp_utils::CodeStore;
use std::sync::Arc;

/// The Phone Number authentication plugin.
pub struct PhoneNumberPlugin {
    config: Arc<PhoneNumberConfig>,
    issuer: Arc<OtpIssuer>,
    verifier: Arc<OtpVerifier>,
    csrf: Arc<CsrfGuard>,
}

impl PhoneNumberPlugin {
    /// Wires the issuer and verifier around a shared code store.
    pub fn new(
        config: PhoneNumberConfig,
        store: Arc<dyn CodeStore>,
        notifier: Arc<dyn Notifier>,
        identities: Arc<dyn IdentityProvider>,
        csrf: Arc<CsrfGuard>,
    ) -> Self {
        Self::with_clock(config, store, notifier, identities, csrf, Arc::new(SystemClock))
    }

    /// Same as [`PhoneNumberPlugin::new`], with throttling driven by `clock`.
    pub fn with_clock(
        config: PhoneNumberConfig,
        store: Arc<dyn CodeStore>,
        notifier: Arc<dyn Notifier>,
        identities: Arc<dyn IdentityProvider>,
        csrf: Arc<CsrfGuard>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let config = Arc::new(config);
        let issuer = OtpIssuer::new(store.clone(), notifier, config.clone()).with_clock(clock);
        let verifier = OtpVerifier::new(store, identities, config.clone());

        Self {
            config,
            issuer: Arc::new(issuer),
            verifier: Arc::new(verifier),
            csrf,
        }
    }

    /// Gets the plugin configuration.
    pub fn config(&self) -> &PhoneNumberConfig {
        &self.config
    }

    pub fn issuer(&self) -> Arc<OtpIssuer> {
        self.issuer.clone()
    }

    pub fn verifier(&self) -> Arc<OtpVerifier> {
        self.verifier.clone()
    }
}

impl AuthPlugin for PhoneNumberPlugin {
    fn id(&self) -> &'static str {
        "phone_number"
    }

    fn name(&self) -> &'static str {
        "Phone Number Authentication"
    }

    fn register_routes(&self, router: &mut Router) {
        // GET /phone-number/csrf-token
        router.route(
            Route::new(
                Method::GET,
                "/phone-number/csrf-token",
                CsrfTokenHandler {
                    csrf: self.csrf.clone(),
                },
            )
            .summary("Get anti-forgery token")
            .description("Issues the token that must accompany the code request and submission.")
            .tag("phone-number"),
        );

        // POST /phone-number/request-code
        router.route(
            Route::new(
                Method::POST,
                "/phone-number/request-code",
                RequestCodeHandler {
                    issuer: self.issuer.clone(),
                    csrf: self.csrf.clone(),
                },
            )
            .summary("Send code to phone")
            .description("Sends a one-time code to the specified phone number, replacing any earlier code.")
            .tag("phone-number"),
        );

        // POST /phone-number/submit-code
        router.route(
            Route::new(
                Method::POST,
                "/phone-number/submit-code",
                SubmitCodeHandler {
                    verifier: self.verifier.clone(),
                    csrf: self.csrf.clone(),
                },
            )
            .summary("Sign in with code")
            .description("Verifies the code, registers first-time numbers and starts a session.")
            .tag("phone-number"),
        );
    }
}

impl std::fmt::Debug for PhoneNumberPlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhoneNumberPlugin")
            .field("config", &self.config)
            .finish()
    }
}
