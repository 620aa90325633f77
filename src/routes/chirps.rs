/// Chirp Routes

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::{authorize_owner, AuthenticatedUser};
use crate::error::{AppError, DatabaseError, ErrorContext, ValidationError};
use crate::logger::RequestId;
use crate::store::ChirpRepository;
use crate::validators::validate_chirp;

#[derive(Deserialize)]
pub struct ChirpRequest {
    pub body: String,
}

fn parse_chirp_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw)
        .map_err(|_| AppError::Validation(ValidationError::InvalidFormat("chirpID".to_string())))
}

fn chirp_not_found() -> AppError {
    AppError::Database(DatabaseError::NotFound("Chirp not found".to_string()))
}

/// POST /api/chirps
///
/// Requires an access token; the chirp is owned by the caller.
///
/// # Errors
/// - 400: empty body or longer than 140 characters
pub async fn create_chirp(
    form: web::Json<ChirpRequest>,
    caller: web::ReqData<AuthenticatedUser>,
    chirps: web::Data<dyn ChirpRepository>,
    request_id: web::ReqData<RequestId>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new(&request_id, "chirp_create");

    let body = validate_chirp(&form.body)?;
    let chirp = chirps.create_chirp(caller.user_id, &body).await?;

    tracing::info!(
        request_id = %context.request_id,
        operation = %context.operation,
        user_id = %caller.user_id,
        chirp_id = %chirp.id,
        "Chirp created"
    );

    Ok(HttpResponse::Created().json(chirp))
}

/// GET /api/chirps
pub async fn list_chirps(
    chirps: web::Data<dyn ChirpRepository>,
) -> Result<HttpResponse, AppError> {
    let chirps = chirps.list_chirps().await?;
    Ok(HttpResponse::Ok().json(chirps))
}

/// GET /api/chirps/{chirpID}
pub async fn get_chirp(
    path: web::Path<String>,
    chirps: web::Data<dyn ChirpRepository>,
) -> Result<HttpResponse, AppError> {
    let chirp_id = parse_chirp_id(&path)?;
    let chirp = chirps.get_chirp(chirp_id).await?.ok_or_else(chirp_not_found)?;

    Ok(HttpResponse::Ok().json(chirp))
}

/// DELETE /api/chirps/{chirpID}
///
/// # Errors
/// - 400: malformed chirp id
/// - 403: the caller does not own the chirp
/// - 404: no such chirp
pub async fn delete_chirp(
    path: web::Path<String>,
    caller: web::ReqData<AuthenticatedUser>,
    chirps: web::Data<dyn ChirpRepository>,
    request_id: web::ReqData<RequestId>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new(&request_id, "chirp_delete");

    let chirp_id = parse_chirp_id(&path)?;
    let chirp = chirps.get_chirp(chirp_id).await?.ok_or_else(chirp_not_found)?;

    authorize_owner(&caller, chirp.user_id)?;

    // the chirp can vanish between the lookup and the delete
    if !chirps.delete_chirp(chirp_id, caller.user_id).await? {
        return Err(chirp_not_found());
    }

    tracing::info!(
        request_id = %context.request_id,
        operation = %context.operation,
        user_id = %caller.user_id,
        chirp_id = %chirp_id,
        "Chirp deleted"
    );

    Ok(HttpResponse::NoContent().finish())
}
