//! Persistence capabilities consumed by the session and chirp services.
//!
//! The traits are implemented by [`DbConnection`] (PostgreSQL) and by
//! [`MemoryStore`](crate::memory::MemoryStore). Implementations must give the
//! same answers: lookups that find nothing, and refresh tokens that are not
//! active, return [`Error::NotFound`](crate::error::Error::NotFound); every
//! other error is a storage failure.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    chirp::{Chirp, ChirpCreate},
    db::connection::DbConnection,
    prelude::*,
    refresh_token::{RefreshToken, RefreshTokenCreate},
    user::{User, UserCreate},
};

pub trait UserStore: Send + Sync {
    fn create_user(&self, user: UserCreate) -> Result<User>;

    fn user_by_id(&self, id: &Uuid) -> Result<User>;

    fn user_by_email(&self, email: &str) -> Result<User>;

    fn update_credentials(&self, id: &Uuid, email: &str, hashed_password: &str) -> Result<User>;

    /// Sets the upgrade flag on `id`.
    fn upgrade_user(&self, id: &Uuid) -> Result<User>;

    /// Removes every user together with their tokens and chirps.
    fn delete_all_users(&self) -> Result<usize>;
}

pub trait RefreshTokenStore: Send + Sync {
    fn create_refresh_token(&self, token: RefreshTokenCreate) -> Result<RefreshToken>;

    /// Owner of `token` iff it is active at `now`.
    fn active_user(&self, token: &str, now: DateTime<Utc>) -> Result<User>;

    /// Revokes `token` at `now`. Idempotent, and a no-op for unknown tokens.
    fn revoke_refresh_token(&self, token: &str, now: DateTime<Utc>) -> Result<()>;
}

pub trait ChirpStore: Send + Sync {
    fn create_chirp(&self, chirp: ChirpCreate) -> Result<Chirp>;

    fn chirp_by_id(&self, id: &Uuid) -> Result<Chirp>;

    /// Oldest first.
    fn list_chirps(&self, author: Option<&Uuid>) -> Result<Vec<Chirp>>;

    fn delete_chirp(&self, id: &Uuid) -> Result<()>;
}

impl UserStore for DbConnection {
    fn create_user(&self, user: UserCreate) -> Result<User> {
        user.save(self)
    }

    fn user_by_id(&self, id: &Uuid) -> Result<User> {
        User::fetch_by_id(id, self)
    }

    fn user_by_email(&self, email: &str) -> Result<User> {
        User::fetch_by_email(email, self)
    }

    fn update_credentials(&self, id: &Uuid, email: &str, hashed_password: &str) -> Result<User> {
        User::update_credentials(id, email, hashed_password, self)
    }

    fn upgrade_user(&self, id: &Uuid) -> Result<User> {
        User::upgrade(id, self)
    }

    fn delete_all_users(&self) -> Result<usize> {
        User::delete_all(self)
    }
}

impl RefreshTokenStore for DbConnection {
    fn create_refresh_token(&self, token: RefreshTokenCreate) -> Result<RefreshToken> {
        token.save(self)
    }

    fn active_user(&self, token: &str, now: DateTime<Utc>) -> Result<User> {
        RefreshToken::fetch_active_user(token, now, self)
    }

    fn revoke_refresh_token(&self, token: &str, now: DateTime<Utc>) -> Result<()> {
        RefreshToken::revoke(token, now, self)
    }
}

impl ChirpStore for DbConnection {
    fn create_chirp(&self, chirp: ChirpCreate) -> Result<Chirp> {
        chirp.save(self)
    }

    fn chirp_by_id(&self, id: &Uuid) -> Result<Chirp> {
        Chirp::fetch_by_id(id, self)
    }

    fn list_chirps(&self, author: Option<&Uuid>) -> Result<Vec<Chirp>> {
        Chirp::fetch_all(author, self)
    }

    fn delete_chirp(&self, id: &Uuid) -> Result<()> {
        Chirp::delete(id, self)
    }
}
