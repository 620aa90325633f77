/// Authorization gate for protected operations
///
/// Request states:
/// 1. unauthenticated: pull the bearer token, failure is `Unauthorized`
/// 2. token present: validate it, every codec failure is `Unauthorized`
/// 3. authenticated: ownership checks decide between allowed and `Forbidden`

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::auth::bearer::{extract_api_key, extract_bearer};
use crate::auth::jwt::validate_access_token;
use crate::error::AuthError;

/// Identity established from a valid access token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
}

/// Establish the caller's identity from an `Authorization` header value
pub fn authenticate(header: Option<&str>, secret: &str) -> Result<AuthenticatedUser, AuthError> {
    let token = extract_bearer(header).map_err(AuthError::Bearer)?;
    let user_id = validate_access_token(token, secret).map_err(AuthError::Token)?;

    Ok(AuthenticatedUser { user_id })
}

/// Allow an identity-scoped mutation only for the resource owner
pub fn authorize_owner(user: &AuthenticatedUser, owner_id: Uuid) -> Result<(), AuthError> {
    if user.user_id == owner_id {
        Ok(())
    } else {
        Err(AuthError::Forbidden)
    }
}

/// Check a webhook caller's `X-Api-Key` header value against the configured key
pub fn verify_api_key(header: Option<&str>, expected: &str) -> Result<(), AuthError> {
    let presented = extract_api_key(header).map_err(AuthError::Bearer)?;

    if digests_match(presented, expected) {
        Ok(())
    } else {
        Err(AuthError::InvalidApiKey)
    }
}

fn digests_match(a: &str, b: &str) -> bool {
    let a = Sha256::digest(a.as_bytes());
    let b = Sha256::digest(b.as_bytes());

    a.as_slice().ct_eq(b.as_slice()).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::issue_access_token;
    use crate::error::{BearerError, TokenError};
    use chrono::Duration;

    const SECRET: &str = "gate-test-secret";

    fn header_for(user_id: Uuid, ttl: Duration) -> String {
        let token = issue_access_token(user_id, SECRET, ttl).unwrap();
        format!("Bearer {}", token)
    }

    #[test]
    fn test_authenticate_valid_token() {
        let user_id = Uuid::new_v4();
        let header = header_for(user_id, Duration::hours(1));

        assert_eq!(
            authenticate(Some(&header), SECRET),
            Ok(AuthenticatedUser { user_id })
        );
    }

    #[test]
    fn test_authenticate_missing_or_malformed_header() {
        assert_eq!(
            authenticate(None, SECRET),
            Err(AuthError::Bearer(BearerError::MissingHeader))
        );
        assert_eq!(
            authenticate(Some("Basic abc123"), SECRET),
            Err(AuthError::Bearer(BearerError::Malformed))
        );
    }

    #[test]
    fn test_authenticate_rejects_bad_tokens() {
        let user_id = Uuid::new_v4();

        let expired = header_for(user_id, Duration::hours(-1));
        assert_eq!(
            authenticate(Some(&expired), SECRET),
            Err(AuthError::Token(TokenError::Expired))
        );

        let valid = header_for(user_id, Duration::hours(1));
        assert_eq!(
            authenticate(Some(&valid), "another-secret"),
            Err(AuthError::Token(TokenError::InvalidSignature))
        );

        assert_eq!(
            authenticate(Some("Bearer garbage"), SECRET),
            Err(AuthError::Token(TokenError::Malformed))
        );
    }

    #[test]
    fn test_authenticated_failures_are_all_unauthorized() {
        let failures = [
            authenticate(None, SECRET),
            authenticate(Some("Bearer"), SECRET),
            authenticate(Some("Bearer garbage"), SECRET),
        ];

        for failure in failures {
            assert!(failure.unwrap_err().is_unauthorized());
        }
    }

    #[test]
    fn test_authorize_owner() {
        let owner = AuthenticatedUser { user_id: Uuid::new_v4() };
        let stranger = AuthenticatedUser { user_id: Uuid::new_v4() };

        assert_eq!(authorize_owner(&owner, owner.user_id), Ok(()));
        assert_eq!(
            authorize_owner(&stranger, owner.user_id),
            Err(AuthError::Forbidden)
        );
    }

    #[test]
    fn test_verify_api_key() {
        assert_eq!(verify_api_key(Some("polka-key"), "polka-key"), Ok(()));
        assert_eq!(
            verify_api_key(Some("other-key"), "polka-key"),
            Err(AuthError::InvalidApiKey)
        );
        assert_eq!(
            verify_api_key(None, "polka-key"),
            Err(AuthError::Bearer(BearerError::MissingHeader))
        );
        assert_eq!(
            verify_api_key(Some("ApiKey polka-key"), "polka-key"),
            Err(AuthError::Bearer(BearerError::Malformed))
        );
    }

    #[test]
    fn test_digests_match_requires_exact_key() {
        assert!(digests_match("polka-key", "polka-key"));
        assert!(!digests_match("polka-kez", "polka-key"));
        assert!(!digests_match("polka-key ", "polka-key"));
        assert!(!digests_match("polka", "polka-key"));
        assert!(!digests_match("", "polka-key"));
    }
}
