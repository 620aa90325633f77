/// Refresh Token Management
///
/// Handles refresh token generation, storage, resolution and revocation.
/// Refresh tokens are:
/// - Cryptographically secure random 64-character strings
/// - Long-lived (60 days by default) and bound to one user
/// - Never extended; a new one only comes from a new login
/// - Revoked individually, so other sessions of the same user keep working
/// - Kept after expiry or revocation for auditing

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use uuid::Uuid;

use crate::error::{AppError, RefreshTokenError};

pub const REFRESH_TOKEN_LENGTH: usize = 64;

/// Persisted refresh token record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshToken {
    pub token: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl RefreshToken {
    /// Build a fresh, unrevoked record for `user_id`
    pub fn new(user_id: Uuid, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            token: generate_refresh_token(),
            user_id,
            created_at: now,
            updated_at: now,
            expires_at: now + ttl,
            revoked_at: None,
        }
    }

    /// Owning user if the token can still mint access tokens at `now`
    ///
    /// Revocation is reported ahead of expiry.
    pub fn check_usable(&self, now: DateTime<Utc>) -> Result<Uuid, RefreshTokenError> {
        if self.revoked_at.is_some() {
            return Err(RefreshTokenError::Revoked);
        }

        if now >= self.expires_at {
            return Err(RefreshTokenError::Expired);
        }

        Ok(self.user_id)
    }
}

/// Result of a revocation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevokeOutcome {
    Revoked,
    AlreadyRevoked,
    NotFound,
}

/// Storage backend for refresh tokens
///
/// `revoke_refresh_token` must set `revoked_at` only when it is still null,
/// atomically with respect to concurrent readers.
#[async_trait]
pub trait RefreshTokenRepository: Send + Sync {
    async fn insert_refresh_token(&self, token: &RefreshToken) -> Result<(), AppError>;

    async fn find_refresh_token(&self, token: &str) -> Result<Option<RefreshToken>, AppError>;

    async fn revoke_refresh_token(
        &self,
        token: &str,
        revoked_at: DateTime<Utc>,
    ) -> Result<RevokeOutcome, AppError>;
}

/// Generate a new cryptographically secure refresh token
pub fn generate_refresh_token() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(REFRESH_TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

/// Issues, resolves and revokes refresh tokens on top of a repository
#[derive(Clone)]
pub struct RefreshTokenStore {
    repository: Arc<dyn RefreshTokenRepository>,
}

impl RefreshTokenStore {
    pub fn new(repository: Arc<dyn RefreshTokenRepository>) -> Self {
        Self { repository }
    }

    /// Create and persist a new refresh token for `user_id`
    ///
    /// # Errors
    /// Returns error if the database operation fails
    pub async fn issue_for(&self, user_id: Uuid, ttl: Duration) -> Result<RefreshToken, AppError> {
        let refresh_token = RefreshToken::new(user_id, ttl);
        self.repository.insert_refresh_token(&refresh_token).await?;

        tracing::debug!(
            user_id = %user_id,
            expires_at = %refresh_token.expires_at,
            "Refresh token issued"
        );

        Ok(refresh_token)
    }

    /// Resolve a refresh token to the user it belongs to
    ///
    /// # Errors
    /// `RefreshTokenError::{NotFound, Revoked, Expired}` wrapped in `AppError::Auth`,
    /// or a database error.
    pub async fn resolve(&self, token: &str) -> Result<Uuid, AppError> {
        let record = match self.repository.find_refresh_token(token).await? {
            Some(record) => record,
            None => {
                tracing::warn!("Refresh token not found");
                return Err(RefreshTokenError::NotFound.into());
            }
        };

        record.check_usable(Utc::now()).map_err(|e| {
            match e {
                RefreshTokenError::Revoked => {
                    tracing::warn!(user_id = %record.user_id, "Attempt to use revoked refresh token")
                }
                _ => tracing::info!(user_id = %record.user_id, "Refresh token rejected: {}", e),
            }
            AppError::from(e)
        })
    }

    /// Revoke a single refresh token
    ///
    /// Re-revoking keeps the original `revoked_at`.
    pub async fn revoke(&self, token: &str) -> Result<RevokeOutcome, AppError> {
        let outcome = self.repository.revoke_refresh_token(token, Utc::now()).await?;

        match outcome {
            RevokeOutcome::Revoked => tracing::info!("Refresh token revoked"),
            RevokeOutcome::AlreadyRevoked => tracing::debug!("Refresh token was already revoked"),
            RevokeOutcome::NotFound => tracing::warn!("Revocation requested for unknown refresh token"),
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;

    fn store() -> (Arc<InMemoryStore>, RefreshTokenStore) {
        let backend = Arc::new(InMemoryStore::new());
        (backend.clone(), RefreshTokenStore::new(backend))
    }

    #[test]
    fn test_generate_refresh_token() {
        let token = generate_refresh_token();

        assert_eq!(token.len(), REFRESH_TOKEN_LENGTH);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_tokens_are_unique() {
        let tokens: std::collections::HashSet<String> =
            (0..1000).map(|_| generate_refresh_token()).collect();
        assert_eq!(tokens.len(), 1000);
    }

    #[test]
    fn test_check_usable() {
        let user_id = Uuid::new_v4();
        let mut record = RefreshToken::new(user_id, Duration::days(60));
        let now = Utc::now();

        assert_eq!(record.check_usable(now), Ok(user_id));
        assert_eq!(
            record.check_usable(record.expires_at),
            Err(RefreshTokenError::Expired)
        );

        record.revoked_at = Some(now);
        assert_eq!(record.check_usable(now), Err(RefreshTokenError::Revoked));
        assert_eq!(
            record.check_usable(record.expires_at + Duration::days(1)),
            Err(RefreshTokenError::Revoked)
        );
    }

    #[tokio::test]
    async fn test_issue_then_resolve() {
        let (_, tokens) = store();
        let user_id = Uuid::new_v4();

        let issued = tokens.issue_for(user_id, Duration::days(60)).await.unwrap();

        assert_eq!(issued.expires_at - issued.created_at, Duration::days(60));
        assert!(issued.revoked_at.is_none());
        assert_eq!(tokens.resolve(&issued.token).await.unwrap(), user_id);
    }

    #[tokio::test]
    async fn test_resolve_unknown_token() {
        let (_, tokens) = store();

        let err = tokens.resolve("does-not-exist").await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Auth(crate::error::AuthError::RefreshToken(RefreshTokenError::NotFound))
        ));
    }

    #[tokio::test]
    async fn test_resolve_expired_token() {
        let (_, tokens) = store();

        let issued = tokens
            .issue_for(Uuid::new_v4(), Duration::seconds(-1))
            .await
            .unwrap();

        let err = tokens.resolve(&issued.token).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Auth(crate::error::AuthError::RefreshToken(RefreshTokenError::Expired))
        ));
    }

    #[tokio::test]
    async fn test_revoked_token_stays_revoked() {
        let (backend, tokens) = store();
        let issued = tokens.issue_for(Uuid::new_v4(), Duration::days(60)).await.unwrap();

        assert_eq!(tokens.revoke(&issued.token).await.unwrap(), RevokeOutcome::Revoked);
        let first_revoked_at = backend
            .find_refresh_token(&issued.token)
            .await
            .unwrap()
            .and_then(|r| r.revoked_at);
        assert!(first_revoked_at.is_some());

        for _ in 0..3 {
            let err = tokens.resolve(&issued.token).await.unwrap_err();
            assert!(matches!(
                err,
                AppError::Auth(crate::error::AuthError::RefreshToken(RefreshTokenError::Revoked))
            ));
        }

        assert_eq!(
            tokens.revoke(&issued.token).await.unwrap(),
            RevokeOutcome::AlreadyRevoked
        );
        let second_revoked_at = backend
            .find_refresh_token(&issued.token)
            .await
            .unwrap()
            .and_then(|r| r.revoked_at);
        assert_eq!(first_revoked_at, second_revoked_at);
    }

    #[tokio::test]
    async fn test_revoke_unknown_token() {
        let (_, tokens) = store();

        assert_eq!(tokens.revoke("nope").await.unwrap(), RevokeOutcome::NotFound);
    }

    #[tokio::test]
    async fn test_revoking_one_session_keeps_others() {
        let (_, tokens) = store();
        let user_id = Uuid::new_v4();

        let phone = tokens.issue_for(user_id, Duration::days(60)).await.unwrap();
        let laptop = tokens.issue_for(user_id, Duration::days(60)).await.unwrap();
        assert_ne!(phone.token, laptop.token);

        tokens.revoke(&phone.token).await.unwrap();

        assert!(tokens.resolve(&phone.token).await.is_err());
        assert_eq!(tokens.resolve(&laptop.token).await.unwrap(), user_id);
    }

    #[tokio::test]
    async fn test_concurrent_revocations_transition_once() {
        let (_, tokens) = store();
        let issued = tokens.issue_for(Uuid::new_v4(), Duration::days(60)).await.unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let tokens = tokens.clone();
                let token = issued.token.clone();
                tokio::spawn(async move { tokens.revoke(&token).await.unwrap() })
            })
            .collect();

        let mut revoked = 0;
        for handle in handles {
            if handle.await.unwrap() == RevokeOutcome::Revoked {
                revoked += 1;
            }
        }

        assert_eq!(revoked, 1);
    }
}
