//! User accounts.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::schema::users::dsl::*;
use crate::{db::connection::DbConnection, prelude::*};

/// A registered user. Only the hash of the password is ever stored.
#[derive(Debug, Clone, Queryable, Selectable, Identifiable, PartialEq, Eq)]
#[diesel(table_name = crate::schema::users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct User {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub email: String,
    pub hashed_password: String,
    /// Set by the billing webhook once the account is upgraded.
    pub is_chirpy_red: bool,
}

#[derive(Insertable, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = crate::schema::users)]
pub struct UserCreate {
    pub id: Uuid,
    pub email: String,
    pub hashed_password: String,
}

impl UserCreate {
    pub fn new(address: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: address.into(),
            hashed_password: password_hash.into(),
        }
    }

    pub fn save(self, connection: &DbConnection) -> Result<User> {
        let conn = &mut connection.pool.get()?;

        Ok(diesel::insert_into(users)
            .values(&self)
            .returning(User::as_returning())
            .get_result(conn)?)
    }
}

impl User {
    pub fn fetch_by_id(target: &Uuid, connection: &DbConnection) -> Result<Self> {
        let conn = &mut connection.pool.get()?;

        User::by_id(target)
            .select(User::as_select())
            .get_result(conn)
            .optional()?
            .ok_or(Error::NotFound)
    }

    pub fn fetch_by_email(target: &str, connection: &DbConnection) -> Result<Self> {
        let conn = &mut connection.pool.get()?;

        User::by_email(target)
            .select(User::as_select())
            .get_result(conn)
            .optional()?
            .ok_or(Error::NotFound)
    }

    /// Replaces the email and password hash of `target`.
    pub fn update_credentials(
        target: &Uuid,
        new_email: &str,
        new_hash: &str,
        connection: &DbConnection,
    ) -> Result<Self> {
        let conn = &mut connection.pool.get()?;

        diesel::update(User::by_id(target))
            .set((
                email.eq(new_email),
                hashed_password.eq(new_hash),
                updated_at.eq(Utc::now()),
            ))
            .returning(User::as_returning())
            .get_result(conn)
            .optional()?
            .ok_or(Error::NotFound)
    }

    /// Marks `target` as upgraded.
    pub fn upgrade(target: &Uuid, connection: &DbConnection) -> Result<Self> {
        let conn = &mut connection.pool.get()?;

        diesel::update(User::by_id(target))
            .set((is_chirpy_red.eq(true), updated_at.eq(Utc::now())))
            .returning(User::as_returning())
            .get_result(conn)
            .optional()?
            .ok_or(Error::NotFound)
    }

    /// Deletes every user. Refresh tokens and chirps follow through
    /// `ON DELETE CASCADE`.
    pub fn delete_all(connection: &DbConnection) -> Result<usize> {
        let conn = &mut connection.pool.get()?;
        Ok(diesel::delete(users).execute(conn)?)
    }
}

impl User {
    #[diesel::dsl::auto_type(no_type_alias)]
    pub fn by_id(target: &Uuid) -> _ {
        crate::schema::users::dsl::users.filter(id.eq(target))
    }

    #[diesel::dsl::auto_type(no_type_alias)]
    pub fn by_email(target: &str) -> _ {
        crate::schema::users::dsl::users.filter(email.eq(target))
    }
}
