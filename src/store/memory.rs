/// In-memory store
///
/// A single mutex guards all tables, so every operation (including the
/// revoke check-and-set) is atomic. Never hold the guard across an await.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{Chirp, ChirpRepository, User, UserRepository};
use crate::auth::{RefreshToken, RefreshTokenRepository, RevokeOutcome};
use crate::error::{AppError, DatabaseError};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    chirps: Vec<Chirp>,
    refresh_tokens: HashMap<String, RefreshToken>,
}

#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, AppError> {
        self.tables
            .lock()
            .map_err(|_| AppError::Internal("In-memory store lock poisoned".to_string()))
    }
}

fn email_taken() -> AppError {
    AppError::Database(DatabaseError::UniqueConstraintViolation(
        "users_email_key".to_string(),
    ))
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn create_user(&self, email: &str, hashed_password: &str) -> Result<User, AppError> {
        let mut tables = self.lock()?;
        if tables.users.values().any(|u| u.email == email) {
            return Err(email_taken());
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            email: email.to_string(),
            hashed_password: hashed_password.to_string(),
            is_chirpy_red: false,
        };
        tables.users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let tables = self.lock()?;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn update_user_credentials(
        &self,
        id: Uuid,
        email: &str,
        hashed_password: &str,
    ) -> Result<Option<User>, AppError> {
        let mut tables = self.lock()?;
        if tables.users.values().any(|u| u.email == email && u.id != id) {
            return Err(email_taken());
        }

        Ok(tables.users.get_mut(&id).map(|user| {
            user.email = email.to_string();
            user.hashed_password = hashed_password.to_string();
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn upgrade_to_chirpy_red(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let mut tables = self.lock()?;
        Ok(tables.users.get_mut(&id).map(|user| {
            user.is_chirpy_red = true;
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn delete_all_users(&self) -> Result<(), AppError> {
        let mut tables = self.lock()?;
        tables.users.clear();
        tables.chirps.clear();
        tables.refresh_tokens.clear();
        Ok(())
    }
}

#[async_trait]
impl ChirpRepository for InMemoryStore {
    async fn create_chirp(&self, user_id: Uuid, body: &str) -> Result<Chirp, AppError> {
        let mut tables = self.lock()?;
        if !tables.users.contains_key(&user_id) {
            return Err(AppError::Database(DatabaseError::NotFound(
                "User not found".to_string(),
            )));
        }

        let now = Utc::now();
        let chirp = Chirp {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            body: body.to_string(),
            user_id,
        };
        tables.chirps.push(chirp.clone());

        Ok(chirp)
    }

    async fn list_chirps(&self) -> Result<Vec<Chirp>, AppError> {
        let tables = self.lock()?;
        // insertion order is creation order
        Ok(tables.chirps.clone())
    }

    async fn get_chirp(&self, id: Uuid) -> Result<Option<Chirp>, AppError> {
        let tables = self.lock()?;
        Ok(tables.chirps.iter().find(|c| c.id == id).cloned())
    }

    async fn delete_chirp(&self, id: Uuid, user_id: Uuid) -> Result<bool, AppError> {
        let mut tables = self.lock()?;
        let before = tables.chirps.len();
        tables.chirps.retain(|c| !(c.id == id && c.user_id == user_id));
        Ok(tables.chirps.len() < before)
    }
}

#[async_trait]
impl RefreshTokenRepository for InMemoryStore {
    async fn insert_refresh_token(&self, token: &RefreshToken) -> Result<(), AppError> {
        let mut tables = self.lock()?;
        if tables.refresh_tokens.contains_key(&token.token) {
            return Err(AppError::Database(DatabaseError::UniqueConstraintViolation(
                "refresh_tokens_pkey".to_string(),
            )));
        }

        tables
            .refresh_tokens
            .insert(token.token.clone(), token.clone());
        Ok(())
    }

    async fn find_refresh_token(&self, token: &str) -> Result<Option<RefreshToken>, AppError> {
        let tables = self.lock()?;
        Ok(tables.refresh_tokens.get(token).cloned())
    }

    async fn revoke_refresh_token(
        &self,
        token: &str,
        revoked_at: DateTime<Utc>,
    ) -> Result<RevokeOutcome, AppError> {
        let mut tables = self.lock()?;
        let outcome = match tables.refresh_tokens.get_mut(token) {
            None => RevokeOutcome::NotFound,
            Some(record) if record.revoked_at.is_some() => RevokeOutcome::AlreadyRevoked,
            Some(record) => {
                record.revoked_at = Some(revoked_at);
                record.updated_at = revoked_at;
                RevokeOutcome::Revoked
            }
        };
        Ok(outcome)
    }
}
