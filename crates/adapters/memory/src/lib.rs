//! # Phone OTP Memory Adapter
//!
//! An in-memory identity provider, primarily intended for testing and
//! development purposes.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use phone_otp_adapter_memory::MemoryIdentityProvider;
//!
//! let identities = Arc::new(MemoryIdentityProvider::new());
//! let verifier = OtpVerifier::new(store, identities, config);
//! ```

use async_trait::async_trait;
use chrono::Duration;
use phone_otp_core::error::IdentityError;
use phone_otp_core::traits::IdentityProvider;
use phone_otp_core::types::{Session, User};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory storage for a single entity type.
type Store<T> = Arc<RwLock<HashMap<String, T>>>;

/// In-memory identity provider.
///
/// Users are keyed by phone number, which makes the phone number a unique
/// constraint. Data is lost when the process exits.
#[derive(Debug, Clone)]
pub struct MemoryIdentityProvider {
    users: Store<User>,
    sessions: Store<Session>,
    session_duration: Duration,
}

impl MemoryIdentityProvider {
    /// Creates a new in-memory provider with the default session lifetime.
    pub fn new() -> Self {
        Self::with_session_duration(Session::default_duration())
    }

    /// Creates a provider issuing sessions of the given lifetime.
    pub fn with_session_duration(session_duration: Duration) -> Self {
        Self {
            users: Arc::new(RwLock::new(HashMap::new())),
            sessions: Arc::new(RwLock::new(HashMap::new())),
            session_duration,
        }
    }

    /// Clears all stored data.
    pub async fn clear(&self) {
        self.users.write().await.clear();
        self.sessions.write().await.clear();
    }

    /// Returns the number of users stored.
    pub async fn user_count(&self) -> usize {
        self.users.read().await.len()
    }

    /// Returns the number of sessions stored.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Gets a session by token.
    pub async fn get_session_by_token(&self, token: &str) -> Option<Session> {
        self.sessions.read().await.get(token).cloned()
    }

    /// Gets all sessions for a user.
    pub async fn get_sessions_by_user_id(&self, user_id: &str) -> Vec<Session> {
        self.sessions
            .read()
            .await
            .values()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect()
    }
}

impl Default for MemoryIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentityProvider {
    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<User>, IdentityError> {
        let users = self.users.read().await;
        Ok(users.get(identifier).cloned())
    }

    async fn create_identity(&self, identifier: &str) -> Result<User, IdentityError> {
        let mut users = self.users.write().await;

        if users.contains_key(identifier) {
            return Err(IdentityError::Duplicate(identifier.to_string()));
        }

        let user = User::new(identifier);
        users.insert(identifier.to_string(), user.clone());
        tracing::info!(user_id = %user.id, "registered new phone account");
        Ok(user)
    }

    async fn start_session(&self, user: &User) -> Result<Session, IdentityError> {
        if !self.users.read().await.contains_key(&user.phone_number) {
            return Err(IdentityError::NotFound(user.id.clone()));
        }

        let session = Session::with_expiration(user.id.clone(), self.session_duration);
        self.sessions
            .write()
            .await
            .insert(session.token.clone(), session.clone());
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_and_find_user() {
        let provider = MemoryIdentityProvider::new();

        let created = provider.create_identity("96891234567").await.unwrap();
        assert_eq!(created.phone_number, "96891234567");
        assert_eq!(created.role, "customer");

        let fetched = provider.find_by_identifier("96891234567").await.unwrap();
        assert_eq!(fetched, Some(created));
        assert!(provider.find_by_identifier("96800000000").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_phone_rejected() {
        let provider = MemoryIdentityProvider::new();
        provider.create_identity("96891234567").await.unwrap();

        let result = provider.create_identity("96891234567").await;
        assert_eq!(result, Err(IdentityError::Duplicate("96891234567".to_string())));
        assert_eq!(provider.user_count().await, 1);
    }

    #[tokio::test]
    async fn test_session_operations() {
        let provider = MemoryIdentityProvider::with_session_duration(Duration::hours(1));
        let user = provider.create_identity("96891234567").await.unwrap();

        let session = provider.start_session(&user).await.unwrap();
        assert_eq!(session.user_id, user.id);
        assert!(!session.is_expired());

        let fetched = provider.get_session_by_token(&session.token).await;
        assert_eq!(fetched, Some(session));
        assert_eq!(provider.get_sessions_by_user_id(&user.id).await.len(), 1);
    }

    #[tokio::test]
    async fn test_session_for_unknown_user() {
        let provider = MemoryIdentityProvider::new();
        let stranger = User::new("96800000000");

        let result = provider.start_session(&stranger).await;
        assert!(matches!(result, Err(IdentityError::NotFound(_))));
        assert_eq!(provider.session_count().await, 0);
    }
}
