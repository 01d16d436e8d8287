//! Core traits.
//!
//! This module defines the seams between the OTP flow and the outside world:
//! the identity provider that owns accounts and sessions, the notifier that
//! delivers codes, and the plugin interface that contributes routes.

use async_trait::async_trait;

use crate::error::IdentityError;
use crate::router::Router;
use crate::types::{DeliveryResult, Session, User};

/// Trait for the system that owns user accounts and issues sessions.
///
/// Implementations must enforce a unique phone number per user. A second
/// `create_identity` for the same phone number returns
/// [`IdentityError::Duplicate`] rather than creating another user.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Looks up the user registered under this phone number.
    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<User>, IdentityError>;

    /// Registers a new user for this phone number.
    async fn create_identity(&self, identifier: &str) -> Result<User, IdentityError>;

    /// Logs the user in and returns the new session.
    async fn start_session(&self, user: &User) -> Result<Session, IdentityError>;
}

/// Trait for out-of-band code delivery (SMS gateways and the like).
///
/// A call makes exactly one delivery attempt. Vendor status codes are mapped
/// to [`DeliveryResult`] inside the implementation.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Sends `message` to the phone number `identifier`.
    async fn send(&self, identifier: &str, message: &str) -> DeliveryResult;
}

/// Trait for plugins that contribute request handlers.
pub trait AuthPlugin: Send + Sync {
    /// Returns the unique identifier for this plugin.
    fn id(&self) -> &'static str;

    /// Returns a human-readable name for this plugin.
    fn name(&self) -> &'static str;

    /// Registers routes for this plugin.
    fn register_routes(&self, _router: &mut Router) {}
}
