//! # Phone OTP Utilities
//!
//! Building blocks shared by the issuer and verifier:
//! - OTP generation from the OS CSPRNG
//! - The expiring code store with atomic single-use consumption
//! - Issue throttling

mod generator;
mod rate_limit;
mod store;
mod verification;

pub use generator::{OtpConfig, OtpGenerator};
pub use rate_limit::{RateLimitConfig, RateLimitResult, RateLimiter};
pub use store::{CodeStore, MemoryCodeStore, spawn_sweeper};
pub use verification::ConsumeOutcome;

use chrono::{DateTime, Duration, Utc};
use phone_otp_core::error::StoreError;
use serde::{Deserialize, Serialize};

/// Default lifetime of an issued code.
pub const DEFAULT_CODE_TTL_SECS: i64 = 300;

/// A stored one-time code for a single phone number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtpRecord {
    /// The normalized phone number this code is for.
    pub identifier: String,
    /// The code value.
    pub code: String,
    /// When this code was issued.
    pub issued_at: DateTime<Utc>,
    /// When this code stops being valid.
    pub expires_at: DateTime<Utc>,
    /// Whether this code has been used.
    pub consumed: bool,
    /// Wrong codes submitted against this record.
    #[serde(default)]
    pub failed_attempts: u32,
}

impl OtpRecord {
    /// Creates a new record issued at `now`.
    ///
    /// Fails if `now + ttl` is not representable.
    pub fn new(
        identifier: impl Into<String>,
        code: impl Into<String>,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<Self, StoreError> {
        let expires_at = now
            .checked_add_signed(ttl)
            .ok_or_else(|| StoreError::TtlOutOfRange(format!("{} seconds", ttl.num_seconds())))?;

        Ok(Self {
            identifier: identifier.into(),
            code: code.into(),
            issued_at: now,
            expires_at,
            consumed: false,
            failed_attempts: 0,
        })
    }

    /// Checks if the code has expired at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Checks if the code can still be consumed at `now`.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        !self.consumed && !self.is_expired(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_lifetime() {
        let now = Utc::now();
        let record = OtpRecord::new(
            "96891234567",
            "123456",
            now,
            Duration::seconds(DEFAULT_CODE_TTL_SECS),
        )
        .unwrap();

        assert_eq!(record.expires_at - record.issued_at, Duration::seconds(300));
        assert!(record.is_live(now));
        assert!(record.is_live(now + Duration::seconds(299)));
        assert!(!record.is_live(now + Duration::seconds(300)));
    }

    #[test]
    fn test_consumed_record_is_not_live() {
        let now = Utc::now();
        let mut record = OtpRecord::new("96891234567", "123456", now, Duration::minutes(5)).unwrap();
        record.consumed = true;
        assert!(!record.is_live(now));
    }

    #[test]
    fn test_unrepresentable_expiry() {
        let err = OtpRecord::new("96891234567", "123456", Utc::now(), Duration::MAX).unwrap_err();
        assert!(matches!(err, StoreError::TtlOutOfRange(_)));
    }
}
