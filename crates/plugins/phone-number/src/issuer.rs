//! Code issuance.

use chrono::{DateTime, Utc};
use phone_otp_core::clock::{Clock, SystemClock};
use phone_otp_core::error::{OtpError, OtpResult, StoreError};
use phone_otp_core::traits::Notifier;
use phone_otp_core::types::DeliveryResult;
use phone_otp_utils::{CodeStore, OtpConfig, OtpGenerator, RateLimitResult, RateLimiter};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::PhoneNumberConfig;

/// Throttle windows kept before finished ones are dropped.
const THROTTLE_PRUNE_THRESHOLD: usize = 1024;

/// Receipt for a stored code. The code itself is never handed back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedCode {
    /// The normalized phone number the code was sent to.
    pub identifier: String,
    /// When the code stops being accepted.
    pub expires_at: DateTime<Utc>,
}

/// Generates, stores and delivers one-time codes.
pub struct OtpIssuer {
    store: Arc<dyn CodeStore>,
    notifier: Arc<dyn Notifier>,
    config: Arc<PhoneNumberConfig>,
    generator: OtpGenerator,
    throttle: Mutex<RateLimiter>,
    clock: Arc<dyn Clock>,
}

impl OtpIssuer {
    /// Creates an issuer on the system clock.
    pub fn new(
        store: Arc<dyn CodeStore>,
        notifier: Arc<dyn Notifier>,
        config: Arc<PhoneNumberConfig>,
    ) -> Self {
        Self {
            generator: OtpGenerator::new(OtpConfig::numeric(config.otp_length)),
            throttle: Mutex::new(RateLimiter::new(config.issue_rate_limit.clone())),
            store,
            notifier,
            config,
            clock: Arc::new(SystemClock),
        }
    }

    /// Reads time for throttling from `clock`.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Issues a new code for `raw_identifier` and sends it.
    ///
    /// Any previous code for the number is replaced. If delivery fails the
    /// stored code stays live and `DeliveryFailed` is returned, so the caller
    /// can re-issue. Exactly one delivery attempt is made.
    pub async fn issue(&self, raw_identifier: &str) -> OtpResult<IssuedCode> {
        let identifier = self
            .config
            .normalize(raw_identifier)
            .ok_or(OtpError::InvalidIdentifier)?;

        let verdict = {
            let now = self.clock.now();
            let mut throttle = self.throttle.lock().await;
            if throttle.tracked_keys() >= THROTTLE_PRUNE_THRESHOLD {
                throttle.cleanup(now);
            }
            throttle.check(&identifier, now)
        };
        if let RateLimitResult::Limited {
            retry_after_seconds,
            ..
        } = verdict
        {
            tracing::warn!(identifier = %identifier, retry_after_seconds, "code request throttled");
            return Err(OtpError::IssueThrottled {
                retry_after_seconds,
            });
        }

        let ttl = self.config.code_ttl().ok_or_else(|| {
            StoreError::TtlOutOfRange(format!("{} seconds", self.config.expires_in))
        })?;
        let code = self.generator.generate();
        let record = self.store.put(&identifier, &code, ttl).await?;

        tracing::info!(identifier = %identifier, expires_at = %record.expires_at, "issued one-time code");

        let message = self.config.render_message(&code);
        self.deliver(&identifier, &message).await?;

        Ok(IssuedCode {
            identifier,
            expires_at: record.expires_at,
        })
    }

    async fn deliver(&self, identifier: &str, message: &str) -> OtpResult<()> {
        let attempt = self.notifier.send(identifier, message);
        let outcome = match tokio::time::timeout(self.config.delivery_timeout, attempt).await {
            Ok(outcome) => outcome,
            Err(_) => {
                tracing::warn!(
                    identifier = %identifier,
                    timeout_ms = self.config.delivery_timeout.as_millis() as u64,
                    "code delivery timed out"
                );
                return Err(OtpError::delivery("the SMS gateway did not respond in time"));
            }
        };

        match outcome {
            DeliveryResult::Success => {
                tracing::info!(identifier = %identifier, "code delivered");
                Ok(())
            }
            DeliveryResult::ProviderError(failure) => {
                tracing::warn!(
                    identifier = %identifier,
                    provider_code = %failure.code,
                    reason = %failure.reason,
                    "SMS provider rejected code"
                );
                Err(OtpError::delivery(failure.reason))
            }
            DeliveryResult::TransportError(error) => {
                tracing::warn!(identifier = %identifier, error = %error, "SMS gateway unreachable");
                Err(OtpError::delivery("the SMS gateway could not be reached"))
            }
        }
    }
}

impl std::fmt::Debug for OtpIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OtpIssuer")
            .field("config", &self.config)
            .finish()
    }
}
