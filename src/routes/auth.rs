/// Authentication Routes
///
/// Login, access token refresh and refresh token revocation.

use actix_web::{web, HttpRequest, HttpResponse};
use serde::Serialize;

use crate::auth::{
    bearer_token, issue_access_token, verify_against_dummy, verify_password, RefreshTokenStore,
    RevokeOutcome,
};
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError, DatabaseError, ErrorContext};
use crate::logger::RequestId;
use crate::routes::users::{CredentialsRequest, UserResponse};
use crate::store::UserRepository;

/// Login response: the user plus a token pair
#[derive(Serialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub token: String,
    pub refresh_token: String,
}

/// Refresh response: a new access token only
#[derive(Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// POST /api/login
///
/// # Errors
/// - 401: unknown email or wrong password, indistinguishable
/// - 500: hashing or database failure
pub async fn login(
    form: web::Json<CredentialsRequest>,
    users: web::Data<dyn UserRepository>,
    refresh_tokens: web::Data<RefreshTokenStore>,
    jwt_config: web::Data<JwtSettings>,
    request_id: web::ReqData<RequestId>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new(&request_id, "user_login");

    let user = users.get_user_by_email(form.email.trim()).await?;
    let password = form.password.clone();

    let user = match user {
        Some(user) => {
            let hash = user.hashed_password.clone();
            let matches = web::block(move || verify_password(&password, &hash)).await??;
            matches.then_some(user)
        }
        None => {
            web::block(move || verify_against_dummy(&password)).await?;
            None
        }
    }
    .ok_or(AuthError::InvalidCredentials)?;

    let access_token =
        issue_access_token(user.id, &jwt_config.secret, jwt_config.access_token_ttl())?;
    let refresh_token = refresh_tokens
        .issue_for(user.id, jwt_config.refresh_token_ttl())
        .await?;

    tracing::info!(
        request_id = %context.request_id,
        operation = %context.operation,
        user_id = %user.id,
        "User logged in successfully"
    );

    Ok(HttpResponse::Ok().json(LoginResponse {
        user: UserResponse::from(user),
        token: access_token,
        refresh_token: refresh_token.token,
    }))
}

/// POST /api/refresh
///
/// Exchange a refresh token (as a bearer token) for a new access token.
/// The refresh token itself is left untouched.
///
/// # Errors
/// - 401: missing/malformed header, or unknown, revoked or expired refresh token
pub async fn refresh(
    req: HttpRequest,
    refresh_tokens: web::Data<RefreshTokenStore>,
    jwt_config: web::Data<JwtSettings>,
    request_id: web::ReqData<RequestId>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new(&request_id, "token_refresh");

    let token = bearer_token(req.headers())?;
    let user_id = refresh_tokens.resolve(token).await?;
    let access_token =
        issue_access_token(user_id, &jwt_config.secret, jwt_config.access_token_ttl())?;

    tracing::info!(
        request_id = %context.request_id,
        operation = %context.operation,
        user_id = %user_id,
        "Access token refreshed"
    );

    Ok(HttpResponse::Ok().json(TokenResponse {
        token: access_token,
    }))
}

/// POST /api/revoke
///
/// Revoke the refresh token carried as a bearer token. Revoking twice is
/// not an error.
///
/// # Errors
/// - 401: missing or malformed header
/// - 404: unknown refresh token
pub async fn revoke(
    req: HttpRequest,
    refresh_tokens: web::Data<RefreshTokenStore>,
) -> Result<HttpResponse, AppError> {
    let token = bearer_token(req.headers())?;

    match refresh_tokens.revoke(token).await? {
        RevokeOutcome::Revoked | RevokeOutcome::AlreadyRevoked => {
            Ok(HttpResponse::NoContent().finish())
        }
        RevokeOutcome::NotFound => Err(AppError::Database(DatabaseError::NotFound(
            "Refresh token not found".to_string(),
        ))),
    }
}
