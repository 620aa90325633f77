/// Admin Routes

use actix_web::{web, HttpResponse};

use crate::configuration::ApplicationSettings;
use crate::error::{AppError, AuthError};
use crate::middleware::HitCounter;
use crate::store::UserRepository;

/// GET /admin/metrics
pub async fn metrics(hits: web::Data<HitCounter>) -> HttpResponse {
    let page = format!(
        r#"<html>
  <body>
    <h1>Welcome, Chirpy Admin</h1>
    <p>Chirpy has been visited {} times!</p>
  </body>
</html>"#,
        hits.get()
    );

    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(page)
}

/// POST /admin/reset
///
/// Development only: zeroes the hit counter and deletes every user (their
/// chirps and refresh tokens go with them).
pub async fn reset(
    application: web::Data<ApplicationSettings>,
    hits: web::Data<HitCounter>,
    users: web::Data<dyn UserRepository>,
) -> Result<HttpResponse, AppError> {
    if !application.is_dev() {
        tracing::warn!(platform = %application.platform, "Reset attempted outside dev");
        return Err(AuthError::Forbidden.into());
    }

    users.delete_all_users().await?;
    hits.reset();

    tracing::info!("Hits and users reset");

    Ok(HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body("Hits reset to 0"))
}
