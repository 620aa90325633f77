/// Credential extraction from request headers
///
/// Two disjoint carriers:
/// - `Authorization: Bearer <token>` for user access and refresh tokens
/// - `X-Api-Key: <key>` for service-to-service webhook calls

use actix_web::http::header::{HeaderMap, AUTHORIZATION};

use crate::error::BearerError;

pub const API_KEY_HEADER: &str = "X-Api-Key";

const BEARER_SCHEME: &str = "Bearer";

/// Extract the token from an `Authorization` header value
///
/// The value must split on whitespace into exactly `Bearer` and a token.
pub fn extract_bearer(header: Option<&str>) -> Result<&str, BearerError> {
    let header = header.ok_or(BearerError::MissingHeader)?;

    let mut parts = header.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(BEARER_SCHEME), Some(token), None) if !token.is_empty() => Ok(token),
        _ => Err(BearerError::Malformed),
    }
}

/// Extract a webhook key from an `X-Api-Key` header value
pub fn extract_api_key(header: Option<&str>) -> Result<&str, BearerError> {
    let header = header.ok_or(BearerError::MissingHeader)?;

    let mut parts = header.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some(key), None) => Ok(key),
        _ => Err(BearerError::Malformed),
    }
}

/// Read a header as text; a present but non-UTF-8 value is malformed
fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Result<Option<&'a str>, BearerError> {
    headers
        .get(name)
        .map(|value| value.to_str().map_err(|_| BearerError::Malformed))
        .transpose()
}

/// Bearer token carried by a request
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, BearerError> {
    extract_bearer(header_str(headers, AUTHORIZATION.as_str())?)
}

/// Webhook key carried by a request
pub fn api_key(headers: &HeaderMap) -> Result<&str, BearerError> {
    extract_api_key(header_str(headers, API_KEY_HEADER)?)
}
