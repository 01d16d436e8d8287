//! Core data types.
//!
//! `User` and `Session` are what the identity provider hands back after a
//! successful verification. `DeliveryResult` is the vendor-neutral outcome of
//! a notification attempt.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Role assigned to accounts created through phone sign-in.
pub const DEFAULT_ROLE: &str = "customer";

/// Represents an account keyed by its phone number.
///
/// # Example
///
/// ```rust
/// use phone_otp_core::User;
///
/// let user = User::new("96891234567");
/// assert_eq!(user.role, "customer");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier for the user
    pub id: String,

    /// Normalized phone number, the account's login name
    pub phone_number: String,

    /// Role granted to the account
    pub role: String,

    /// Timestamp when the user was created
    pub created_at: DateTime<Utc>,

    /// Timestamp when the user was last updated
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Creates a new customer account for the given phone number.
    pub fn new(phone_number: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            phone_number: phone_number.into(),
            role: DEFAULT_ROLE.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets the role.
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = role.into();
        self.updated_at = Utc::now();
        self
    }
}

/// Represents an authenticated session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Unique identifier for the session
    pub id: String,

    /// The ID of the user this session belongs to
    pub user_id: String,

    /// The session token (set as the auth cookie)
    pub token: String,

    /// When the session expires
    pub expires_at: DateTime<Utc>,

    /// Timestamp when the session was created
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Default session lifetime, matching a "remember me" login.
    pub fn default_duration() -> Duration {
        Duration::days(14)
    }

    /// Creates a new session for the given user with the default lifetime.
    pub fn new(user_id: impl Into<String>) -> Self {
        Self::with_expiration(user_id, Self::default_duration())
    }

    /// Creates a new session with a custom expiration duration.
    pub fn with_expiration(user_id: impl Into<String>, duration: Duration) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            token: uuid::Uuid::new_v4().to_string(),
            expires_at: now + duration,
            created_at: now,
        }
    }

    /// Checks if the session has expired.
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }

    /// Remaining lifetime in whole seconds, zero once expired.
    pub fn max_age_seconds(&self) -> i64 {
        (self.expires_at - Utc::now()).num_seconds().max(0)
    }
}

/// A provider-level rejection reported by a notifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderFailure {
    /// Provider-specific status, kept for logs only.
    pub code: String,
    /// Human-readable reason.
    pub reason: String,
}

impl ProviderFailure {
    /// Creates a new provider failure.
    pub fn new(code: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            reason: reason.into(),
        }
    }
}

/// Outcome of a single notification attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryResult {
    /// The provider accepted the message.
    Success,
    /// The provider answered but refused the message.
    ProviderError(ProviderFailure),
    /// The provider could not be reached.
    TransportError(String),
}

impl DeliveryResult {
    /// Returns true if the message was accepted.
    pub fn is_success(&self) -> bool {
        matches!(self, DeliveryResult::Success)
    }

    /// Returns the failure reason, if any.
    pub fn failure_reason(&self) -> Option<String> {
        match self {
            DeliveryResult::Success => None,
            DeliveryResult::ProviderError(failure) => Some(failure.reason.clone()),
            DeliveryResult::TransportError(message) => Some(message.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_creation() {
        let user = User::new("96891234567");
        assert_eq!(user.phone_number, "96891234567");
        assert_eq!(user.role, DEFAULT_ROLE);
        assert!(!user.id.is_empty());
    }

    #[test]
    fn test_session_expiration() {
        let session = Session::with_expiration("user_id", Duration::seconds(-1));
        assert!(session.is_expired());
        assert_eq!(session.max_age_seconds(), 0);
    }

    #[test]
    fn test_sessions_get_distinct_tokens() {
        let a = Session::new("user_id");
        let b = Session::new("user_id");
        assert_ne!(a.token, b.token);
    }

    #[test]
    fn test_delivery_result_reason() {
        assert_eq!(DeliveryResult::Success.failure_reason(), None);
        let failed = DeliveryResult::ProviderError(ProviderFailure::new("4", "Credit is low"));
        assert_eq!(failed.failure_reason().as_deref(), Some("Credit is low"));
    }
}
