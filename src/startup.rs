use actix_files as fs;
use actix_web::dev::Server;
use actix_web::{guard, web, App, HttpServer};
use std::net::TcpListener;

use crate::configuration::Settings;
use crate::logger::LoggerMiddleware;
use crate::middleware::{ApiKeyMiddleware, HitCounter, HitCounterMiddleware, JwtMiddleware};
use crate::routes::{
    create_chirp, create_user, delete_chirp, get_chirp, health_check, list_chirps, login, metrics,
    polka_webhook, refresh, reset, revoke, update_user,
};
use crate::store::Repositories;

pub fn run(
    listener: TcpListener,
    repositories: Repositories,
    settings: Settings,
) -> Result<Server, std::io::Error> {
    let users = web::Data::from(repositories.users);
    let chirps = web::Data::from(repositories.chirps);
    let refresh_tokens = web::Data::new(repositories.refresh_tokens);
    let hits = web::Data::new(HitCounter::new());

    let jwt_config = settings.jwt;
    let webhook_config = settings.webhook;
    let static_dir = settings.application.static_dir.clone();
    let jwt_config_data = web::Data::new(jwt_config.clone());
    let application_data = web::Data::new(settings.application);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(LoggerMiddleware)
            .app_data(users.clone())
            .app_data(chirps.clone())
            .app_data(refresh_tokens.clone())
            .app_data(hits.clone())
            .app_data(jwt_config_data.clone())
            .app_data(application_data.clone())
            .service(
                web::scope("/api")
                    .route("/healthz", web::get().to(health_check))
                    .route("/users", web::post().to(create_user))
                    .service(
                        web::resource("/users")
                            .guard(guard::Put())
                            .wrap(JwtMiddleware::new(jwt_config.clone()))
                            .to(update_user),
                    )
                    .route("/login", web::post().to(login))
                    .route("/refresh", web::post().to(refresh))
                    .route("/revoke", web::post().to(revoke))
                    .route("/chirps", web::get().to(list_chirps))
                    .service(
                        web::resource("/chirps")
                            .guard(guard::Post())
                            .wrap(JwtMiddleware::new(jwt_config.clone()))
                            .to(create_chirp),
                    )
                    .route("/chirps/{chirp_id}", web::get().to(get_chirp))
                    .service(
                        web::resource("/chirps/{chirp_id}")
                            .guard(guard::Delete())
                            .wrap(JwtMiddleware::new(jwt_config.clone()))
                            .to(delete_chirp),
                    )
                    .service(
                        web::resource("/polka/webhooks")
                            .guard(guard::Post())
                            .wrap(ApiKeyMiddleware::new(webhook_config.clone()))
                            .to(polka_webhook),
                    ),
            )
            .service(
                web::scope("/admin")
                    .route("/metrics", web::get().to(metrics))
                    .route("/reset", web::post().to(reset)),
            )
            // Only file server traffic is counted
            .service(
                web::scope("/app")
                    .wrap(HitCounterMiddleware::new(hits.clone()))
                    .service(fs::Files::new("/", &static_dir).index_file("index.html")),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
