//! Database error types.

/// Database operation errors.
///
/// Everything except [`Error::NotFound`] means the storage itself failed.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Database connection pool error.
    #[error(transparent)]
    R2D2(#[from] diesel::r2d2::PoolError),

    /// Diesel ORM operation error.
    #[error(transparent)]
    Diesel(#[from] diesel::result::Error),

    /// Pending migrations could not be applied.
    #[error("Migration failed {0}")]
    Migration(String),

    /// A refresh token expiry does not fit in a timestamp.
    #[error("Refresh token expiry out of range")]
    ExpiryOutOfRange,

    /// The requested row does not exist or is not active.
    #[error("Not Found")]
    NotFound,
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound)
    }
}
