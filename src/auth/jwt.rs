/// JWT Token Generation and Validation
///
/// Access tokens are HS256-signed JWTs. The accepted algorithm is fixed here,
/// never taken from the token header, so a token signed with any other
/// algorithm fails signature verification.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::auth::claims::{Claims, ISSUER};
use crate::error::{AppError, TokenError};

const TOKEN_ALGORITHM: Algorithm = Algorithm::HS256;

/// Issue a signed access token for `user_id` that expires after `ttl`
///
/// # Errors
/// Returns error if token encoding fails
pub fn issue_access_token(user_id: Uuid, secret: &str, ttl: Duration) -> Result<String, AppError> {
    let claims = Claims::new(user_id, ttl);

    encode(
        &Header::new(TOKEN_ALGORITHM),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
}

/// Verify an access token and return its claims
///
/// # Errors
/// - `InvalidSignature`: wrong secret, tampered signature or unexpected algorithm
/// - `Expired`: the current time is at or past `exp`
/// - `Malformed`: anything that does not decode to a well-formed claim set
pub fn decode_access_claims(token: &str, secret: &str) -> Result<Claims, TokenError> {
    let mut validation = Validation::new(TOKEN_ALGORITHM);
    validation.leeway = 0;
    validation.set_issuer(&[ISSUER]);
    validation.set_required_spec_claims(&["exp", "iss", "sub"]);

    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => TokenError::InvalidSignature,
        ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Malformed,
    })?;

    // the library accepts exp == now; the token is dead from that second on
    if claims.is_expired_at(Utc::now().timestamp()) {
        return Err(TokenError::Expired);
    }

    Ok(claims)
}

/// Verify an access token and return the user id it was issued to
pub fn validate_access_token(token: &str, secret: &str) -> Result<Uuid, TokenError> {
    decode_access_claims(token, secret)?.user_id()
}
