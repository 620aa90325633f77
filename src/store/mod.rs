/// Persistence layer
///
/// Repository traits for users and chirps, with a Postgres backend for
/// deployments and an in-memory backend for tests and local runs. Both
/// backends also implement `RefreshTokenRepository`.

mod memory;
mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::{RefreshTokenRepository, RefreshTokenStore};
use crate::error::AppError;

pub use memory::InMemoryStore;
pub use postgres::PgStore;

/// Stored user account
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub email: String,
    pub hashed_password: String,
    pub is_chirpy_red: bool,
}

/// Stored chirp
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Chirp {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub body: String,
    pub user_id: Uuid,
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `DatabaseError::UniqueConstraintViolation` when the email is taken
    async fn create_user(&self, email: &str, hashed_password: &str) -> Result<User, AppError>;

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn update_user_credentials(
        &self,
        id: Uuid,
        email: &str,
        hashed_password: &str,
    ) -> Result<Option<User>, AppError>;

    async fn upgrade_to_chirpy_red(&self, id: Uuid) -> Result<Option<User>, AppError>;

    /// Removes every user together with their chirps and refresh tokens
    async fn delete_all_users(&self) -> Result<(), AppError>;
}

#[async_trait]
pub trait ChirpRepository: Send + Sync {
    async fn create_chirp(&self, user_id: Uuid, body: &str) -> Result<Chirp, AppError>;

    /// All chirps, oldest first
    async fn list_chirps(&self) -> Result<Vec<Chirp>, AppError>;

    async fn get_chirp(&self, id: Uuid) -> Result<Option<Chirp>, AppError>;

    /// Returns whether a chirp with that id and owner was deleted
    async fn delete_chirp(&self, id: Uuid, user_id: Uuid) -> Result<bool, AppError>;
}

/// Repositories shared with every request handler
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub chirps: Arc<dyn ChirpRepository>,
    pub refresh_tokens: RefreshTokenStore,
}

impl Repositories {
    pub fn new<S>(store: Arc<S>) -> Self
    where
        S: UserRepository + ChirpRepository + RefreshTokenRepository + 'static,
    {
        Self {
            users: store.clone(),
            chirps: store.clone(),
            refresh_tokens: RefreshTokenStore::new(store),
        }
    }

    pub fn postgres(pool: PgPool) -> Self {
        Self::new(Arc::new(PgStore::new(pool)))
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryStore::new()))
    }
}
