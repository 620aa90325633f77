//! Runs against a real Postgres when `DATABASE_URL` is set; otherwise each test
//! returns early.

use std::sync::Arc;

use chirpy::auth::{RefreshTokenRepository, RefreshTokenStore, RevokeOutcome};
use chirpy::error::{AppError, AuthError, DatabaseError, RefreshTokenError};
use chirpy::store::{ChirpRepository, PgStore, UserRepository};
use chrono::Duration;
use sqlx::PgPool;
use uuid::Uuid;

async fn connect() -> Option<Arc<PgStore>> {
    let url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("DATABASE_URL not set, skipping Postgres store test");
            return None;
        }
    };

    let pool = PgPool::connect(&url)
        .await
        .expect("Failed to connect to Postgres.");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate the database.");

    Some(Arc::new(PgStore::new(pool)))
}

fn unique_email() -> String {
    format!("{}@store.test", Uuid::new_v4())
}

#[tokio::test]
async fn refresh_token_lifecycle_on_postgres() {
    let Some(store) = connect().await else { return };
    let tokens = RefreshTokenStore::new(store.clone());

    let user = store.create_user(&unique_email(), "hash").await.unwrap();
    let issued = tokens.issue_for(user.id, Duration::days(60)).await.unwrap();

    assert_eq!(tokens.resolve(&issued.token).await.unwrap(), user.id);

    let stored = store
        .find_refresh_token(&issued.token)
        .await
        .unwrap()
        .expect("Refresh token was not stored");
    assert_eq!(stored.user_id, user.id);
    assert!(stored.revoked_at.is_none());

    assert_eq!(tokens.revoke(&issued.token).await.unwrap(), RevokeOutcome::Revoked);
    let first_revoked_at = store
        .find_refresh_token(&issued.token)
        .await
        .unwrap()
        .and_then(|t| t.revoked_at);
    assert!(first_revoked_at.is_some());

    assert_eq!(
        tokens.revoke(&issued.token).await.unwrap(),
        RevokeOutcome::AlreadyRevoked
    );
    let second_revoked_at = store
        .find_refresh_token(&issued.token)
        .await
        .unwrap()
        .and_then(|t| t.revoked_at);
    assert_eq!(first_revoked_at, second_revoked_at);

    let err = tokens.resolve(&issued.token).await.unwrap_err();
    assert!(matches!(
        err,
        AppError::Auth(AuthError::RefreshToken(RefreshTokenError::Revoked))
    ));
}

#[tokio::test]
async fn unknown_refresh_token_on_postgres() {
    let Some(store) = connect().await else { return };
    let tokens = RefreshTokenStore::new(store);

    assert_eq!(
        tokens.revoke("never-issued-token").await.unwrap(),
        RevokeOutcome::NotFound
    );
    let err = tokens.resolve("never-issued-token").await.unwrap_err();
    assert!(matches!(
        err,
        AppError::Auth(AuthError::RefreshToken(RefreshTokenError::NotFound))
    ));
}

#[tokio::test]
async fn concurrent_revocations_transition_once_on_postgres() {
    let Some(store) = connect().await else { return };
    let tokens = RefreshTokenStore::new(store.clone());

    let user = store.create_user(&unique_email(), "hash").await.unwrap();
    let issued = tokens.issue_for(user.id, Duration::days(60)).await.unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let tokens = tokens.clone();
            let token = issued.token.clone();
            tokio::spawn(async move { tokens.revoke(&token).await.unwrap() })
        })
        .collect();

    let mut revoked = 0;
    for handle in handles {
        if handle.await.unwrap() == RevokeOutcome::Revoked {
            revoked += 1;
        }
    }
    assert_eq!(revoked, 1);
}

#[tokio::test]
async fn duplicate_email_is_a_conflict_on_postgres() {
    let Some(store) = connect().await else { return };
    let email = unique_email();

    store.create_user(&email, "hash").await.unwrap();
    let err = store.create_user(&email, "hash").await.unwrap_err();

    assert!(matches!(
        err,
        AppError::Database(DatabaseError::UniqueConstraintViolation(_))
    ));
}

#[tokio::test]
async fn chirp_for_missing_user_is_not_found_on_postgres() {
    let Some(store) = connect().await else { return };

    let err = store.create_chirp(Uuid::new_v4(), "orphan").await.unwrap_err();

    assert!(matches!(err, AppError::Database(DatabaseError::NotFound(_))));
}
