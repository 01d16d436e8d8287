//! Error types for phone OTP login.
//!
//! `OtpError` is the tagged result every issue/verify call reports to its
//! caller. `StoreError` and `IdentityError` are raised by the collaborators
//! and folded into `OtpError` at the component boundary.

use thiserror::Error;

/// The main error type for OTP issuance and verification.
///
/// Every variant maps to a distinct user-facing message. None of them reveal
/// whether an identity is already registered for the phone number.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OtpError {
    // ==================== Input Errors ====================
    /// The phone number is empty or not a valid phone number.
    #[error("Invalid phone number")]
    InvalidIdentifier,

    /// A required verification field is empty or malformed.
    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    /// The anti-forgery token is missing or does not match the caller's session.
    #[error("Invalid anti-forgery token")]
    InvalidCsrfToken,

    // ==================== Verification Errors ====================
    /// The submitted code does not match the live code.
    #[error("Incorrect verification code")]
    CodeIncorrect,

    /// No live code exists: never issued, expired, already used or burned.
    #[error("Verification code expired or unknown")]
    CodeExpiredOrUnknown,

    // ==================== Issuance Errors ====================
    /// The notifier could not deliver the code. The stored code stays live.
    #[error("Delivery failed: {reason}")]
    DeliveryFailed { reason: String },

    /// Too many codes were requested for this phone number.
    #[error("Too many codes requested. Try again in {retry_after_seconds} seconds")]
    IssueThrottled { retry_after_seconds: u64 },

    // ==================== Collaborator Errors ====================
    /// The identity provider failed to resolve, create or log in the user.
    #[error("Identity provider error: {message}")]
    IdentityProvider { message: String },

    /// The code store failed to persist or read a record.
    #[error("Storage error: {message}")]
    Storage { message: String },
}

impl OtpError {
    /// Creates a new invalid input error.
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }

    /// Creates a new delivery failure.
    pub fn delivery(reason: impl Into<String>) -> Self {
        Self::DeliveryFailed {
            reason: reason.into(),
        }
    }

    /// Creates a new identity provider error.
    pub fn identity(message: impl Into<String>) -> Self {
        Self::IdentityProvider {
            message: message.into(),
        }
    }

    /// Creates a new storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Returns true if the caller may retry the same operation.
    ///
    /// `CodeIncorrect` is retryable until the code expires; delivery failures
    /// and throttling can be retried by re-issuing.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::CodeIncorrect | Self::DeliveryFailed { .. } | Self::IssueThrottled { .. }
        )
    }

    /// Returns a machine-readable error code for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidIdentifier => "INVALID_IDENTIFIER",
            Self::InvalidInput { .. } => "INVALID_INPUT",
            Self::InvalidCsrfToken => "INVALID_CSRF_TOKEN",
            Self::CodeIncorrect => "CODE_INCORRECT",
            Self::CodeExpiredOrUnknown => "CODE_EXPIRED_OR_UNKNOWN",
            Self::DeliveryFailed { .. } => "DELIVERY_FAILED",
            Self::IssueThrottled { .. } => "ISSUE_THROTTLED",
            Self::IdentityProvider { .. } => "IDENTITY_PROVIDER_ERROR",
            Self::Storage { .. } => "STORAGE_ERROR",
        }
    }

    /// Returns the message shown to the person signing in.
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidIdentifier => "Please enter a valid mobile number.".to_string(),
            Self::InvalidInput { .. } => "Mobile number and verification code are required.".to_string(),
            Self::InvalidCsrfToken => "Your session has expired. Please reload the page.".to_string(),
            Self::CodeIncorrect => "The verification code is incorrect. Please try again.".to_string(),
            Self::CodeExpiredOrUnknown => {
                "The verification code has expired. Please request a new one.".to_string()
            }
            Self::DeliveryFailed { reason } => format!("Failed to send the verification code: {reason}"),
            Self::IssueThrottled { retry_after_seconds } => format!(
                "Too many codes requested. Please wait {retry_after_seconds} seconds and try again."
            ),
            Self::IdentityProvider { .. } | Self::Storage { .. } => {
                "Something went wrong. Please try again.".to_string()
            }
        }
    }

    /// Returns an HTTP status code appropriate for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidIdentifier | Self::InvalidInput { .. } => 400,
            Self::CodeIncorrect | Self::CodeExpiredOrUnknown => 401,
            Self::InvalidCsrfToken => 403,
            Self::IssueThrottled { .. } => 429,
            Self::DeliveryFailed { .. } => 502,
            Self::IdentityProvider { .. } | Self::Storage { .. } => 500,
        }
    }
}

/// A Result type alias using OtpError.
pub type OtpResult<T> = Result<T, OtpError>;

/// Failure of an expiring code store backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The backend is unreachable or rejected the operation.
    #[error("Code store unavailable: {0}")]
    Unavailable(String),

    /// The code lifetime does not fit the store's clock range.
    #[error("Code lifetime out of range: {0}")]
    TtlOutOfRange(String),
}

impl From<StoreError> for OtpError {
    fn from(err: StoreError) -> Self {
        Self::storage(err.to_string())
    }
}

/// Errors reported by an identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    /// An identity already exists for this phone number.
    #[error("Duplicate entry: user with phone_number={0} already exists")]
    Duplicate(String),

    /// The identity does not exist.
    #[error("User not found: {0}")]
    NotFound(String),

    /// The backing user database failed.
    #[error("Identity backend error: {0}")]
    Backend(String),
}

impl From<IdentityError> for OtpError {
    fn from(err: IdentityError) -> Self {
        Self::identity(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = OtpError::CodeIncorrect;
        assert_eq!(err.to_string(), "Incorrect verification code");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(OtpError::InvalidIdentifier.status_code(), 400);
        assert_eq!(OtpError::CodeExpiredOrUnknown.status_code(), 401);
        assert_eq!(OtpError::InvalidCsrfToken.status_code(), 403);
        assert_eq!(OtpError::delivery("gateway down").status_code(), 502);
    }

    #[test]
    fn test_user_messages_are_distinct() {
        let errors = [
            OtpError::InvalidIdentifier,
            OtpError::invalid_input("empty code"),
            OtpError::InvalidCsrfToken,
            OtpError::CodeIncorrect,
            OtpError::CodeExpiredOrUnknown,
            OtpError::delivery("Credit is low"),
            OtpError::IssueThrottled {
                retry_after_seconds: 30,
            },
            OtpError::identity("db down"),
        ];
        let messages: std::collections::HashSet<_> =
            errors.iter().map(OtpError::user_message).collect();
        assert_eq!(messages.len(), errors.len());
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let err = OtpError::identity("connection refused on 10.0.0.3");
        assert!(!err.user_message().contains("10.0.0.3"));
    }

    #[test]
    fn test_retryable() {
        assert!(OtpError::CodeIncorrect.is_retryable());
        assert!(!OtpError::CodeExpiredOrUnknown.is_retryable());
    }

    #[test]
    fn test_collaborator_errors_convert() {
        let err: OtpError = IdentityError::Backend("timeout".into()).into();
        assert_eq!(err.error_code(), "IDENTITY_PROVIDER_ERROR");

        let err: OtpError = StoreError::Unavailable("redis".into()).into();
        assert_eq!(err.error_code(), "STORAGE_ERROR");

        let err: OtpError = StoreError::TtlOutOfRange("1e13 seconds".into()).into();
        assert_eq!(err.status_code(), 500);
    }
}
