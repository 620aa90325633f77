/// Payment provider webhooks
///
/// Authenticated by `ApiKeyMiddleware`; only `user.upgraded` has an effect.

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{AppError, DatabaseError, ValidationError};
use crate::store::UserRepository;

pub const USER_UPGRADED_EVENT: &str = "user.upgraded";

#[derive(Deserialize)]
pub struct WebhookRequest {
    pub event: String,
    #[serde(default)]
    pub data: WebhookData,
}

#[derive(Deserialize, Default)]
pub struct WebhookData {
    #[serde(default)]
    pub user_id: String,
}

/// POST /api/polka/webhooks
///
/// # Errors
/// - 400: malformed user id on an upgrade event
/// - 404: upgrade event for an unknown user
pub async fn polka_webhook(
    form: web::Json<WebhookRequest>,
    users: web::Data<dyn UserRepository>,
) -> Result<HttpResponse, AppError> {
    if form.event != USER_UPGRADED_EVENT {
        tracing::debug!(event = %form.event, "Ignoring webhook event");
        return Ok(HttpResponse::NoContent().finish());
    }

    let user_id = Uuid::parse_str(&form.data.user_id)
        .map_err(|_| AppError::Validation(ValidationError::InvalidFormat("user_id".to_string())))?;

    users
        .upgrade_to_chirpy_red(user_id)
        .await?
        .ok_or_else(|| AppError::Database(DatabaseError::NotFound("User not found".to_string())))?;

    tracing::info!(user_id = %user_id, "User upgraded to Chirpy Red");

    Ok(HttpResponse::NoContent().finish())
}
