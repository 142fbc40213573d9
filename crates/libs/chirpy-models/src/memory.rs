//! In-memory implementation of the persistence capabilities.
//!
//! Mirrors the PostgreSQL schema closely enough to stand in for it: email
//! and token uniqueness, owner foreign keys, and cascading deletes. All
//! tables sit behind one lock, so every operation is atomic.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use diesel::result::DatabaseErrorKind;
use uuid::Uuid;

use crate::{
    chirp::{Chirp, ChirpCreate},
    prelude::*,
    refresh_token::{RefreshToken, RefreshTokenCreate},
    store::{ChirpStore, RefreshTokenStore, UserStore},
    user::{User, UserCreate},
};

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    refresh_tokens: HashMap<String, RefreshToken>,
    chirps: Vec<Chirp>,
}

/// Shared in-memory store. Clones see the same data.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

fn constraint(kind: DatabaseErrorKind, message: &str) -> Error {
    Error::Diesel(diesel::result::Error::DatabaseError(
        kind,
        Box::new(String::from(message)),
    ))
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Raw row for `token`, including inactive ones.
    pub fn refresh_token(&self, token: &str) -> Option<RefreshToken> {
        self.tables().refresh_tokens.get(token).cloned()
    }
}

impl UserStore for MemoryStore {
    fn create_user(&self, user: UserCreate) -> Result<User> {
        let mut tables = self.tables();
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(constraint(
                DatabaseErrorKind::UniqueViolation,
                "duplicate key value violates unique constraint \"users_email_key\"",
            ));
        }
        if tables.users.contains_key(&user.id) {
            return Err(constraint(
                DatabaseErrorKind::UniqueViolation,
                "duplicate key value violates unique constraint \"users_pkey\"",
            ));
        }

        let now = Utc::now();
        let row = User {
            id: user.id,
            created_at: now,
            updated_at: now,
            email: user.email,
            hashed_password: user.hashed_password,
            is_chirpy_red: false,
        };
        tables.users.insert(row.id, row.clone());
        Ok(row)
    }

    fn user_by_id(&self, id: &Uuid) -> Result<User> {
        self.tables().users.get(id).cloned().ok_or(Error::NotFound)
    }

    fn user_by_email(&self, email: &str) -> Result<User> {
        self.tables()
            .users
            .values()
            .find(|u| u.email == email)
            .cloned()
            .ok_or(Error::NotFound)
    }

    fn update_credentials(&self, id: &Uuid, email: &str, hashed_password: &str) -> Result<User> {
        let mut tables = self.tables();
        if tables.users.values().any(|u| u.email == email && u.id != *id) {
            return Err(constraint(
                DatabaseErrorKind::UniqueViolation,
                "duplicate key value violates unique constraint \"users_email_key\"",
            ));
        }

        let user = tables.users.get_mut(id).ok_or(Error::NotFound)?;
        user.email = String::from(email);
        user.hashed_password = String::from(hashed_password);
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    fn upgrade_user(&self, id: &Uuid) -> Result<User> {
        let mut tables = self.tables();
        let user = tables.users.get_mut(id).ok_or(Error::NotFound)?;
        user.is_chirpy_red = true;
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    fn delete_all_users(&self) -> Result<usize> {
        let mut tables = self.tables();
        let deleted = tables.users.len();
        tables.users.clear();
        tables.refresh_tokens.clear();
        tables.chirps.clear();
        Ok(deleted)
    }
}

impl RefreshTokenStore for MemoryStore {
    fn create_refresh_token(&self, token: RefreshTokenCreate) -> Result<RefreshToken> {
        let mut tables = self.tables();
        if !tables.users.contains_key(&token.user_id) {
            return Err(constraint(
                DatabaseErrorKind::ForeignKeyViolation,
                "insert or update on table \"refresh_tokens\" violates foreign key constraint",
            ));
        }
        if tables.refresh_tokens.contains_key(&token.token) {
            return Err(constraint(
                DatabaseErrorKind::UniqueViolation,
                "duplicate key value violates unique constraint \"refresh_tokens_pkey\"",
            ));
        }

        let row = RefreshToken {
            token: token.token,
            created_at: token.created_at,
            updated_at: token.updated_at,
            user_id: token.user_id,
            expires_at: token.expires_at,
            revoked_at: None,
        };
        tables.refresh_tokens.insert(row.token.clone(), row.clone());
        Ok(row)
    }

    fn active_user(&self, token: &str, now: DateTime<Utc>) -> Result<User> {
        let tables = self.tables();
        tables
            .refresh_tokens
            .get(token)
            .filter(|row| row.is_active(now))
            .and_then(|row| tables.users.get(&row.user_id))
            .cloned()
            .ok_or(Error::NotFound)
    }

    fn revoke_refresh_token(&self, token: &str, now: DateTime<Utc>) -> Result<()> {
        let mut tables = self.tables();
        if let Some(row) = tables.refresh_tokens.get_mut(token) {
            if row.revoked_at.is_none() {
                row.revoked_at = Some(now);
                row.updated_at = now;
            }
        }
        Ok(())
    }
}

impl ChirpStore for MemoryStore {
    fn create_chirp(&self, chirp: ChirpCreate) -> Result<Chirp> {
        let mut tables = self.tables();
        if !tables.users.contains_key(&chirp.user_id) {
            return Err(constraint(
                DatabaseErrorKind::ForeignKeyViolation,
                "insert or update on table \"chirps\" violates foreign key constraint",
            ));
        }

        let now = Utc::now();
        let row = Chirp {
            id: chirp.id,
            created_at: now,
            updated_at: now,
            body: chirp.body,
            user_id: chirp.user_id,
        };
        tables.chirps.push(row.clone());
        Ok(row)
    }

    fn chirp_by_id(&self, id: &Uuid) -> Result<Chirp> {
        self.tables()
            .chirps
            .iter()
            .find(|c| c.id == *id)
            .cloned()
            .ok_or(Error::NotFound)
    }

    fn list_chirps(&self, author: Option<&Uuid>) -> Result<Vec<Chirp>> {
        let mut chirps: Vec<Chirp> = self
            .tables()
            .chirps
            .iter()
            .filter(|c| author.is_none_or(|author| c.user_id == *author))
            .cloned()
            .collect();
        chirps.sort_by_key(|c| c.created_at);
        Ok(chirps)
    }

    fn delete_chirp(&self, id: &Uuid) -> Result<()> {
        let mut tables = self.tables();
        let before = tables.chirps.len();
        tables.chirps.retain(|c| c.id != *id);
        if tables.chirps.len() == before {
            return Err(Error::NotFound);
        }
        Ok(())
    }
}
