//! Configuration for the Phone Number plugin.

use phone_otp_utils::{DEFAULT_CODE_TTL_SECS, RateLimitConfig};
use std::sync::Arc;
use std::time::Duration;

use crate::phone::normalize_phone_number;

/// Placeholder replaced by the code in [`PhoneNumberConfig::message_template`].
pub const CODE_PLACEHOLDER: &str = "{code}";

/// Type alias for phone number validator.
pub type PhoneValidatorFn = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Configuration for the Phone Number plugin.
#[derive(Clone)]
pub struct PhoneNumberConfig {
    /// Length of the OTP code. Default: 6.
    pub otp_length: u32,
    /// OTP expiration time in seconds. Default: 300 (5 minutes).
    pub expires_in: u64,
    /// Mismatches tolerated before a code is burned. Default: unlimited.
    pub allowed_attempts: Option<u32>,
    /// Throttling of code requests per phone number. Default: disabled.
    pub issue_rate_limit: RateLimitConfig,
    /// Upper bound on a single delivery attempt. Default: 10 seconds.
    pub delivery_timeout: Duration,
    /// Country code prepended to numbers entered in national format.
    pub default_country_code: Option<String>,
    /// SMS body; `{code}` is replaced by the code.
    pub message_template: String,
    /// Optional extra check run on the normalized number.
    pub phone_number_validator: Option<PhoneValidatorFn>,
}

impl Default for PhoneNumberConfig {
    fn default() -> Self {
        Self {
            otp_length: 6,
            expires_in: DEFAULT_CODE_TTL_SECS as u64,
            allowed_attempts: None,
            issue_rate_limit: RateLimitConfig::disabled(),
            delivery_timeout: Duration::from_secs(10),
            default_country_code: None,
            message_template: format!("Your OTP code is: {CODE_PLACEHOLDER}"),
            phone_number_validator: None,
        }
    }
}

impl PhoneNumberConfig {
    /// Creates a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the OTP length.
    pub fn otp_length(mut self, length: u32) -> Self {
        self.otp_length = length;
        self
    }

    /// Sets the expiration time in seconds.
    pub fn expires_in(mut self, seconds: u64) -> Self {
        self.expires_in = seconds;
        self
    }

    /// Burns a code after this many mismatches.
    pub fn allowed_attempts(mut self, attempts: u32) -> Self {
        self.allowed_attempts = Some(attempts);
        self
    }

    /// Throttles code requests per phone number.
    pub fn issue_rate_limit(mut self, limit: RateLimitConfig) -> Self {
        self.issue_rate_limit = limit;
        self
    }

    /// Sets the delivery timeout.
    pub fn delivery_timeout(mut self, timeout: Duration) -> Self {
        self.delivery_timeout = timeout;
        self
    }

    /// Sets the country code for national-format numbers.
    pub fn default_country_code(mut self, code: impl Into<String>) -> Self {
        self.default_country_code = Some(code.into());
        self
    }

    /// Sets the SMS body template.
    pub fn message_template(mut self, template: impl Into<String>) -> Self {
        self.message_template = template.into();
        self
    }

    /// Sets a phone number validator.
    pub fn phone_number_validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.phone_number_validator = Some(Arc::new(validator));
        self
    }

    /// Lifetime of an issued code, or `None` if `expires_in` does not fit a
    /// `chrono::Duration`.
    pub fn code_ttl(&self) -> Option<chrono::Duration> {
        chrono::Duration::try_seconds(i64::try_from(self.expires_in).ok()?)
    }

    /// Normalizes and validates a phone number.
    ///
    /// Returns `None` for anything that is not a plausible phone number.
    pub fn normalize(&self, raw: &str) -> Option<String> {
        let normalized = normalize_phone_number(raw, self.default_country_code.as_deref())?;
        match &self.phone_number_validator {
            Some(validator) if !validator(&normalized) => None,
            _ => Some(normalized),
        }
    }

    /// Renders the SMS body for a code.
    pub fn render_message(&self, code: &str) -> String {
        if self.message_template.contains(CODE_PLACEHOLDER) {
            self.message_template.replace(CODE_PLACEHOLDER, code)
        } else {
            format!("{} {}", self.message_template, code)
        }
    }
}

impl std::fmt::Debug for PhoneNumberConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhoneNumberConfig")
            .field("otp_length", &self.otp_length)
            .field("expires_in", &self.expires_in)
            .field("allowed_attempts", &self.allowed_attempts)
            .field("issue_rate_limit", &self.issue_rate_limit)
            .field("delivery_timeout", &self.delivery_timeout)
            .field("default_country_code", &self.default_country_code)
            .field("phone_number_validator", &self.phone_number_validator.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PhoneNumberConfig::default();
        assert_eq!(config.otp_length, 6);
        assert_eq!(config.code_ttl(), Some(chrono::Duration::seconds(300)));
        assert!(config.allowed_attempts.is_none());
        assert!(!config.issue_rate_limit.enabled);
    }

    #[test]
    fn test_render_message() {
        let config = PhoneNumberConfig::default();
        assert_eq!(config.render_message("042917"), "Your OTP code is: 042917");

        let config = PhoneNumberConfig::new().message_template("Code:");
        assert_eq!(config.render_message("042917"), "Code: 042917");
    }

    #[test]
    fn test_custom_validator() {
        let config = PhoneNumberConfig::new().phone_number_validator(|p| p.starts_with("968"));
        assert_eq!(config.normalize("+968 9123 4567").as_deref(), Some("96891234567"));
        assert_eq!(config.normalize("+1 415 555 0100"), None);
    }

    #[test]
    fn test_code_ttl_out_of_range() {
        assert_eq!(PhoneNumberConfig::default().expires_in(u64::MAX).code_ttl(), None);
        assert_eq!(
            PhoneNumberConfig::default()
                .expires_in(10_000_000_000_000_000)
                .code_ttl(),
            None
        );
    }
}
