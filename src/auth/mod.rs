/// Authentication module
///
/// Password hashing, access token issuance/validation, refresh token
/// management, header credential extraction and the authorization gate.

mod bearer;
mod claims;
mod gate;
mod jwt;
mod password;
mod refresh_token;

pub use bearer::{api_key, bearer_token, extract_api_key, extract_bearer, API_KEY_HEADER};
pub use claims::{Claims, ISSUER};
pub use gate::{authenticate, authorize_owner, verify_api_key, AuthenticatedUser};
pub use jwt::{decode_access_claims, issue_access_token, validate_access_token};
pub use password::{
    hash_password, validate_password, verify_against_dummy, verify_password, HASH_COST,
};
pub use refresh_token::{
    generate_refresh_token, RefreshToken, RefreshTokenRepository, RefreshTokenStore,
    RevokeOutcome,
};
