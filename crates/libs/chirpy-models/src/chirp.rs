//! Chirps: short messages posted by users.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::schema::chirps;
use crate::{db::connection::DbConnection, prelude::*, user::User};

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations, PartialEq, Eq)]
#[diesel(belongs_to(User))]
#[diesel(table_name = crate::schema::chirps)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Chirp {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub body: String,
    pub user_id: Uuid,
}

#[derive(Insertable, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = crate::schema::chirps)]
pub struct ChirpCreate {
    pub id: Uuid,
    pub body: String,
    pub user_id: Uuid,
}

impl ChirpCreate {
    pub fn new(author: Uuid, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            body: text.into(),
            user_id: author,
        }
    }

    pub fn save(self, connection: &DbConnection) -> Result<Chirp> {
        let conn = &mut connection.pool.get()?;

        Ok(diesel::insert_into(chirps::table)
            .values(&self)
            .returning(Chirp::as_returning())
            .get_result(conn)?)
    }
}

impl Chirp {
    pub fn fetch_by_id(target: &Uuid, connection: &DbConnection) -> Result<Self> {
        let conn = &mut connection.pool.get()?;

        chirps::table
            .filter(chirps::id.eq(target))
            .select(Chirp::as_select())
            .get_result(conn)
            .optional()?
            .ok_or(Error::NotFound)
    }

    /// All chirps, oldest first, optionally restricted to one author.
    pub fn fetch_all(author: Option<&Uuid>, connection: &DbConnection) -> Result<Vec<Self>> {
        let conn = &mut connection.pool.get()?;

        let mut query = chirps::table
            .select(Chirp::as_select())
            .order(chirps::created_at.asc())
            .into_boxed();
        if let Some(author) = author {
            query = query.filter(chirps::user_id.eq(*author));
        }
        Ok(query.load(conn)?)
    }

    pub fn delete(target: &Uuid, connection: &DbConnection) -> Result<()> {
        let conn = &mut connection.pool.get()?;

        let deleted = diesel::delete(chirps::table.filter(chirps::id.eq(target))).execute(conn)?;
        if deleted == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }
}
