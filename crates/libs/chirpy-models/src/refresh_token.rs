//! Persisted refresh tokens.
//!
//! A refresh token is active while it has not been revoked and its
//! expiration has not passed. Revocation is one way: `revoked_at` is only
//! ever written while it is still `NULL`.

use chrono::{DateTime, TimeDelta, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::schema::{refresh_tokens, users};
use crate::{db::connection::DbConnection, prelude::*, user::User};

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations, PartialEq, Eq)]
#[diesel(belongs_to(User))]
#[diesel(table_name = crate::schema::refresh_tokens)]
#[diesel(primary_key(token))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct RefreshToken {
    pub token: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl RefreshToken {
    /// Whether the token can still be exchanged at `now`.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.revoked_at.is_none() && now <= self.expires_at
    }
}

#[derive(Insertable, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = crate::schema::refresh_tokens)]
pub struct RefreshTokenCreate {
    pub token: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl RefreshTokenCreate {
    /// A token for `owner` created at `now` and valid for `window`.
    ///
    /// # Returns
    ///
    /// * `Ok(RefreshTokenCreate)` - Row ready to be saved
    /// * `Err(Error::ExpiryOutOfRange)` - `now + window` is not a representable instant
    pub fn new(
        value: impl Into<String>,
        owner: Uuid,
        now: DateTime<Utc>,
        window: TimeDelta,
    ) -> Result<Self> {
        let expires_at = now
            .checked_add_signed(window)
            .ok_or(Error::ExpiryOutOfRange)?;

        Ok(Self {
            token: value.into(),
            user_id: owner,
            created_at: now,
            updated_at: now,
            expires_at,
        })
    }

    pub fn save(self, connection: &DbConnection) -> Result<RefreshToken> {
        let conn = &mut connection.pool.get()?;

        Ok(diesel::insert_into(refresh_tokens::table)
            .values(&self)
            .returning(RefreshToken::as_returning())
            .get_result(conn)?)
    }
}

impl RefreshToken {
    /// Owner of `target` if the token is active at `now`.
    ///
    /// Unknown, expired and revoked tokens all yield [`Error::NotFound`].
    pub fn fetch_active_user(
        target: &str,
        now: DateTime<Utc>,
        connection: &DbConnection,
    ) -> Result<User> {
        let conn = &mut connection.pool.get()?;

        users::table
            .inner_join(refresh_tokens::table)
            .filter(refresh_tokens::token.eq(target))
            .filter(refresh_tokens::revoked_at.is_null())
            .filter(refresh_tokens::expires_at.ge(now))
            .select(User::as_select())
            .first(conn)
            .optional()?
            .ok_or(Error::NotFound)
    }

    /// Marks `target` revoked at `now`.
    ///
    /// Already revoked and unknown tokens are left untouched; the call still
    /// succeeds.
    pub fn revoke(target: &str, now: DateTime<Utc>, connection: &DbConnection) -> Result<()> {
        let conn = &mut connection.pool.get()?;

        diesel::update(
            refresh_tokens::table
                .filter(refresh_tokens::token.eq(target))
                .filter(refresh_tokens::revoked_at.is_null()),
        )
        .set((
            refresh_tokens::revoked_at.eq(Some(now)),
            refresh_tokens::updated_at.eq(now),
        ))
        .execute(conn)?;
        Ok(())
    }
}
