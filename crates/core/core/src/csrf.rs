//! Anti-forgery tokens bound to a browser session.
//!
//! A token is `hex(HMAC-SHA256(secret, session_key))`. The session key lives
//! in a cookie, the token travels in the request body, and a forged request
//! from another origin has the cookie but cannot compute the token.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Cookie carrying the session key the token is bound to.
pub const CSRF_SESSION_COOKIE: &str = "otp_csrf_session";

/// Issues and checks anti-forgery tokens.
#[derive(Clone)]
pub struct CsrfGuard {
    secret: Vec<u8>,
}

impl CsrfGuard {
    /// Creates a guard with the given server secret.
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
        }
    }

    /// Generates a fresh random session key.
    pub fn new_session_key() -> String {
        uuid::Uuid::new_v4().simple().to_string()
    }

    /// Computes the token for a session key.
    pub fn token_for(&self, session_key: &str) -> String {
        // HMAC accepts keys of any length.
        let mut mac = match HmacSha256::new_from_slice(&self.secret) {
            Ok(mac) => mac,
            Err(_) => return String::new(),
        };
        mac.update(session_key.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Checks a submitted token against the caller's session key.
    pub fn verify(&self, session_key: Option<&str>, token: Option<&str>) -> bool {
        let (Some(session_key), Some(token)) = (session_key, token) else {
            return false;
        };
        if session_key.is_empty() || token.is_empty() {
            return false;
        }

        let expected = self.token_for(session_key);
        expected.as_bytes().ct_eq(token.as_bytes()).into()
    }
}

impl std::fmt::Debug for CsrfGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CsrfGuard")
            .field("secret", &"<redacted>")
            .finish()
    }
}
