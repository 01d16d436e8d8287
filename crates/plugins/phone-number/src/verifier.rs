//! Code verification and sign-in.

use phone_otp_core::error::{IdentityError, OtpError, OtpResult};
use phone_otp_core::traits::IdentityProvider;
use phone_otp_core::types::{Session, User};
use phone_otp_utils::{CodeStore, ConsumeOutcome};
use std::sync::Arc;

use crate::config::PhoneNumberConfig;

/// A successful sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authenticated {
    /// The signed-in account.
    pub user: User,
    /// The freshly started session.
    pub session: Session,
    /// Whether the account was registered by this sign-in. Not exposed to
    /// the person signing in.
    pub created: bool,
}

/// Checks submitted codes and signs the phone number in.
///
/// Per phone number: `NoCode -> Issued -> {Consumed | Expired}`, with
/// `Issued -> Issued` on re-issue.
pub struct OtpVerifier {
    store: Arc<dyn CodeStore>,
    identities: Arc<dyn IdentityProvider>,
    config: Arc<PhoneNumberConfig>,
}

impl OtpVerifier {
    /// Creates a verifier.
    pub fn new(
        store: Arc<dyn CodeStore>,
        identities: Arc<dyn IdentityProvider>,
        config: Arc<PhoneNumberConfig>,
    ) -> Self {
        Self {
            store,
            identities,
            config,
        }
    }

    /// Verifies `submitted` for `raw_identifier` and starts a session.
    pub async fn verify(&self, raw_identifier: &str, submitted: &str) -> OtpResult<Authenticated> {
        let submitted = submitted.trim();
        if raw_identifier.trim().is_empty() || submitted.is_empty() {
            return Err(OtpError::invalid_input("phone number and code are required"));
        }
        let identifier = self
            .config
            .normalize(raw_identifier)
            .ok_or_else(|| OtpError::invalid_input("malformed phone number"))?;

        let outcome = self
            .store
            .consume_limited(&identifier, submitted, self.config.allowed_attempts)
            .await?;

        match outcome {
            ConsumeOutcome::Invalid => {
                tracing::info!(identifier = %identifier, "no live code for verification");
                Err(OtpError::CodeExpiredOrUnknown)
            }
            ConsumeOutcome::Mismatch => {
                tracing::info!(identifier = %identifier, "incorrect code submitted");
                Err(OtpError::CodeIncorrect)
            }
            ConsumeOutcome::Exhausted => {
                tracing::warn!(identifier = %identifier, "too many incorrect codes, code burned");
                Err(OtpError::CodeIncorrect)
            }
            ConsumeOutcome::Consumed => {
                if let Err(e) = self.store.delete(&identifier).await {
                    // The record is already consumed, so it cannot be replayed.
                    tracing::warn!(identifier = %identifier, error = %e, "failed to delete consumed code");
                }
                self.sign_in(&identifier).await
            }
        }
    }

    async fn sign_in(&self, identifier: &str) -> OtpResult<Authenticated> {
        let (user, created) = self.resolve_or_create(identifier).await?;
        let session = self.identities.start_session(&user).await?;

        tracing::info!(user_id = %user.id, session_id = %session.id, "phone sign-in succeeded");
        Ok(Authenticated {
            user,
            session,
            created,
        })
    }

    async fn resolve_or_create(&self, identifier: &str) -> OtpResult<(User, bool)> {
        if let Some(user) = self.identities.find_by_identifier(identifier).await? {
            return Ok((user, false));
        }

        match self.identities.create_identity(identifier).await {
            Ok(user) => Ok((user, true)),
            Err(IdentityError::Duplicate(_)) => {
                // Lost a registration race; the other request created it.
                self.identities
                    .find_by_identifier(identifier)
                    .await?
                    .map(|user| (user, false))
                    .ok_or_else(|| OtpError::identity("user disappeared after duplicate registration"))
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl std::fmt::Debug for OtpVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OtpVerifier")
            .field("config", &self.config)
            .field("allowed_attempts", &self.config.allowed_attempts)
            .finish()
    }
}
