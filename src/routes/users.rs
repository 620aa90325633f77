/// User Routes
///
/// Registration and credential updates.

use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{hash_password, validate_password, AuthenticatedUser};
use crate::error::{AppError, DatabaseError, ErrorContext};
use crate::logger::RequestId;
use crate::store::{User, UserRepository};
use crate::validators::is_valid_email;

/// Email and password pair used by registration, update and login
#[derive(Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

/// Public view of a user; never includes the password hash
#[derive(Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub email: String,
    pub is_chirpy_red: bool,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            created_at: user.created_at,
            updated_at: user.updated_at,
            email: user.email,
            is_chirpy_red: user.is_chirpy_red,
        }
    }
}

/// Validate the pair and hash the password off the async workers
async fn checked_credentials(form: &CredentialsRequest) -> Result<(String, String), AppError> {
    let email = is_valid_email(&form.email)?;
    validate_password(&form.password)?;

    let password = form.password.clone();
    let password_hash = web::block(move || hash_password(&password)).await??;

    Ok((email, password_hash))
}

/// POST /api/users
///
/// # Errors
/// - 400: invalid email or password
/// - 409: email already registered
/// - 500: hashing or database failure
pub async fn create_user(
    form: web::Json<CredentialsRequest>,
    users: web::Data<dyn UserRepository>,
    request_id: web::ReqData<RequestId>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new(&request_id, "user_registration");

    let (email, password_hash) = checked_credentials(&form).await?;
    let user = users.create_user(&email, &password_hash).await?;

    tracing::info!(
        request_id = %context.request_id,
        operation = %context.operation,
        user_id = %user.id,
        "User registered successfully"
    );

    Ok(HttpResponse::Created().json(UserResponse::from(user)))
}

/// PUT /api/users
///
/// Replace the caller's email and password. Requires an access token.
pub async fn update_user(
    form: web::Json<CredentialsRequest>,
    caller: web::ReqData<AuthenticatedUser>,
    users: web::Data<dyn UserRepository>,
    request_id: web::ReqData<RequestId>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new(&request_id, "user_update");

    let (email, password_hash) = checked_credentials(&form).await?;
    let user = users
        .update_user_credentials(caller.user_id, &email, &password_hash)
        .await?
        .ok_or_else(|| AppError::Database(DatabaseError::NotFound("User not found".to_string())))?;

    tracing::info!(
        request_id = %context.request_id,
        operation = %context.operation,
        user_id = %user.id,
        "User credentials updated"
    );

    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}
