//! iSmart gateway status codes.

use phone_otp_core::types::{DeliveryResult, ProviderFailure};

/// Status returned by the gateway in the response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsmartStatus {
    /// `1`: the message was accepted.
    Success,
    /// `2`: the account (company) does not exist.
    UnknownAccount,
    /// `3`: wrong user id or password.
    AuthFailed,
    /// `4`: not enough credit left.
    InsufficientCredit,
    /// `5`: the recipient number was rejected.
    InvalidRecipient,
    /// `9`: the recipient number has the wrong length.
    InvalidRecipientLength,
    /// `11`: the gateway reported an unknown error.
    UnknownError,
    /// Anything else, including a non-numeric body.
    Unrecognized,
}

impl IsmartStatus {
    /// Parses a raw response body.
    pub fn parse(body: &str) -> Self {
        // Bodies are JSON-ish: a bare number, sometimes quoted.
        let trimmed = body.trim().trim_matches('"').trim();
        match trimmed.parse::<i64>() {
            Ok(1) => Self::Success,
            Ok(2) => Self::UnknownAccount,
            Ok(3) => Self::AuthFailed,
            Ok(4) => Self::InsufficientCredit,
            Ok(5) => Self::InvalidRecipient,
            Ok(9) => Self::InvalidRecipientLength,
            Ok(11) => Self::UnknownError,
            _ => Self::Unrecognized,
        }
    }

    /// Short machine-readable name.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::UnknownAccount => "unknown_account",
            Self::AuthFailed => "auth_failed",
            Self::InsufficientCredit => "insufficient_credit",
            Self::InvalidRecipient => "invalid_recipient",
            Self::InvalidRecipientLength => "invalid_recipient_length",
            Self::UnknownError => "unknown_error",
            Self::Unrecognized => "unrecognized",
        }
    }

    /// Reason shown to the person requesting the code.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Success => "sent",
            Self::UnknownAccount => "the SMS account does not exist",
            Self::AuthFailed => "the SMS gateway rejected its credentials",
            Self::InsufficientCredit => "the SMS account is out of credit",
            Self::InvalidRecipient => "invalid mobile number, please check it",
            Self::InvalidRecipientLength => "the mobile number has an invalid length",
            Self::UnknownError => "the SMS gateway reported an unknown error",
            Self::Unrecognized => "please try again",
        }
    }

    /// Converts the status into a delivery result.
    pub fn into_delivery_result(self) -> DeliveryResult {
        match self {
            Self::Success => DeliveryResult::Success,
            other => DeliveryResult::ProviderError(ProviderFailure::new(other.code(), other.reason())),
        }
    }
}
