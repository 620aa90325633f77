/// JWT Claims structure
///
/// Registered claims (RFC 7519) carried by an access token. The subject is
/// the user id; nothing else about the user is embedded.

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TokenError;

/// Issuer tag stamped into and required from every access token
pub const ISSUER: &str = "chirpy";

/// JWT Claims for access tokens
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Issuer
    pub iss: String,
    /// Subject (user ID as UUID string)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Create claims for `user_id` valid for `ttl` from now
    pub fn new(user_id: Uuid, ttl: Duration) -> Self {
        let now = Utc::now().timestamp();
        Self {
            iss: ISSUER.to_string(),
            sub: user_id.to_string(),
            iat: now,
            exp: now + ttl.num_seconds(),
        }
    }

    /// Extract user ID from claims
    pub fn user_id(&self) -> Result<Uuid, TokenError> {
        Uuid::parse_str(&self.sub).map_err(|_| TokenError::Malformed)
    }

    /// A token is dead from its expiry second onwards
    pub fn is_expired_at(&self, now: i64) -> bool {
        now >= self.exp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_creation() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id, Duration::hours(1));

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.iss, ISSUER);
        assert_eq!(claims.exp - claims.iat, 3600);
        assert!(!claims.is_expired_at(Utc::now().timestamp()));
    }

    #[test]
    fn test_expiry_boundary() {
        let claims = Claims::new(Uuid::new_v4(), Duration::seconds(10));

        assert!(!claims.is_expired_at(claims.exp - 1));
        assert!(claims.is_expired_at(claims.exp));
        assert!(claims.is_expired_at(claims.exp + 1));
    }

    #[test]
    fn test_user_id_extraction() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id, Duration::hours(1));

        assert_eq!(claims.user_id(), Ok(user_id));
    }

    #[test]
    fn test_invalid_user_id() {
        let mut claims = Claims::new(Uuid::new_v4(), Duration::hours(1));
        claims.sub = "invalid-uuid".to_string();

        assert_eq!(claims.user_id(), Err(TokenError::Malformed));
    }
}
