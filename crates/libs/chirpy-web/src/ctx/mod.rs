//! Request context management for web handlers.
//!
//! [`resolver::mw_ctx_resolver`] runs the authorize flow once per request and
//! leaves the outcome in the request extensions, where handlers pick it up by
//! taking a [`Ctx`] argument.

use uuid::Uuid;

pub mod resolver;

/// Identity of the caller, proven by a valid access token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ctx {
    pub user_id: Uuid,
}

impl Ctx {
    /// Creates a new request context.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chirpy_web::ctx::Ctx;
    /// use uuid::Uuid;
    ///
    /// let user_id = Uuid::new_v4();
    /// let ctx = Ctx::new(user_id);
    /// assert_eq!(ctx.user_id, user_id);
    /// ```
    pub fn new(user_id: Uuid) -> Self {
        Self { user_id }
    }
}
