//! Login, refresh, revoke and authorize flows.
//!
//! Two trust models meet here. Access tokens are self-contained and checked
//! locally by the [`AccessTokenCodec`]; refresh tokens are opaque and valid
//! only as long as the [`RefreshTokenStore`] says they are active. A session
//! moves `Anonymous -> Authenticated -> Refreshed* -> Revoked`, but nothing
//! stores that state: it is implied by the tokens a client holds.

use std::fmt;
use std::sync::Arc;

use chirpy_auth::{
    access_token::AccessTokenCodec,
    clock::{Clock, SystemClock},
    credential::bearer_token,
    password::{hash_password, verify_password},
    refresh_token::generate_refresh_token,
};
use chirpy_models::{
    refresh_token::RefreshTokenCreate,
    store::{RefreshTokenStore, UserStore},
    user::{User, UserCreate},
};
use chrono::TimeDelta;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::prelude::*;

/// Lifetimes applied to every session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub access_ttl: TimeDelta,
    pub refresh_window: TimeDelta,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            access_ttl: TimeDelta::hours(1),
            refresh_window: TimeDelta::days(60),
        }
    }
}

/// Everything a successful login hands back.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: User,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Clone)]
pub struct SessionService {
    users: Arc<dyn UserStore>,
    refresh_tokens: Arc<dyn RefreshTokenStore>,
    codec: AccessTokenCodec,
    clock: Arc<dyn Clock>,
    config: SessionConfig,
}

impl fmt::Debug for SessionService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionService")
            .field("codec", &self.codec)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SessionService {
    pub fn new(
        users: Arc<dyn UserStore>,
        refresh_tokens: Arc<dyn RefreshTokenStore>,
        codec: AccessTokenCodec,
    ) -> Self {
        Self {
            users,
            refresh_tokens,
            codec,
            clock: Arc::new(SystemClock),
            config: SessionConfig::default(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> SessionConfig {
        self.config
    }

    /// Creates an account. Only the Argon2 hash of `password` is stored.
    ///
    /// # Returns
    ///
    /// * `Ok(User)` - The stored user
    /// * `Err(Error::Models)` - The email is taken or the store failed
    pub fn register(&self, email: &str, password: &str) -> Result<User> {
        let hash = hash_password(password)?;
        let user = self.users.create_user(UserCreate::new(email, hash))?;
        info!("Registered user {}", user.id);
        Ok(user)
    }

    /// Exchanges an email and password for an access and a refresh token.
    ///
    /// An unknown email and a wrong password both fail with
    /// [`Error::AuthenticationFailed`]. Nothing is persisted unless every
    /// step succeeds.
    ///
    /// # Arguments
    ///
    /// * `email` - Exact, case-sensitive account email
    /// * `password` - Plaintext password
    ///
    /// # Returns
    ///
    /// * `Ok(Session)` - The user, an access token valid for
    ///   [`SessionConfig::access_ttl`] and a stored refresh token valid for
    ///   [`SessionConfig::refresh_window`]
    /// * `Err(Error::AuthenticationFailed)` - Unknown email or wrong password
    /// * `Err(Error)` - Token issue or storage failures
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::sync::Arc;
    ///
    /// use chirpy_auth::access_token::AccessTokenCodec;
    /// use chirpy_models::memory::MemoryStore;
    /// use chirpy_web::session::SessionService;
    ///
    /// let store = Arc::new(MemoryStore::new());
    /// let sessions = SessionService::new(store.clone(), store, AccessTokenCodec::new("secret"));
    ///
    /// sessions.register("a@b.com", "p1").unwrap();
    /// let session = sessions.login("a@b.com", "p1").unwrap();
    /// let header = format!("Bearer {}", session.access_token);
    /// assert_eq!(sessions.authorize(Some(&header)).unwrap(), session.user.id);
    /// assert!(sessions.login("a@b.com", "p2").is_err());
    /// ```
    pub fn login(&self, email: &str, password: &str) -> Result<Session> {
        let user = self.users.user_by_email(email).map_err(|err| {
            if err.is_not_found() {
                warn!("Login rejected: unknown email");
                Error::AuthenticationFailed
            } else {
                Error::Models(err)
            }
        })?;

        verify_password(password, &user.hashed_password).map_err(|err| {
            warn!("Login rejected for user {}: {err}", user.id);
            Error::AuthenticationFailed
        })?;

        let now = self.clock.now();
        let access_token = self.codec.issue_at(user.id, self.config.access_ttl, now)?;
        let refresh_token = generate_refresh_token()?;
        let row = RefreshTokenCreate::new(
            refresh_token.clone(),
            user.id,
            now,
            self.config.refresh_window,
        )?;
        self.refresh_tokens.create_refresh_token(row)?;

        info!("User {} logged in", user.id);
        Ok(Session {
            user,
            access_token,
            refresh_token,
        })
    }

    /// Issues a new access token for the owner of an active refresh token.
    ///
    /// The refresh token itself is neither rotated nor modified.
    ///
    /// # Arguments
    ///
    /// * `header` - Raw `Authorization` header carrying `Bearer <refresh token>`
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - A fresh access token for the token's owner
    /// * `Err(Error::Unauthorized)` - Missing header, or a token that is
    ///   unknown, expired or revoked
    pub fn refresh(&self, header: Option<&str>) -> Result<String> {
        let token = bearer_token(header).map_err(reject)?;
        let now = self.clock.now();

        let user = self
            .refresh_tokens
            .active_user(&token, now)
            .map_err(|err| {
                if err.is_not_found() {
                    debug!("Refresh rejected: token not active");
                    Error::Unauthorized
                } else {
                    Error::Models(err)
                }
            })?;

        let access_token = self.codec.issue_at(user.id, self.config.access_ttl, now)?;
        info!("Refreshed access token for user {}", user.id);
        Ok(access_token)
    }

    /// Revokes the refresh token in `header`.
    ///
    /// Succeeds for tokens that are already revoked, expired or unknown. A
    /// token keeps the timestamp of its first revocation.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The token can no longer be refreshed
    /// * `Err(Error::Unauthorized)` - No bearer credential in `header`
    pub fn revoke(&self, header: Option<&str>) -> Result<()> {
        let token = bearer_token(header).map_err(reject)?;
        self.refresh_tokens
            .revoke_refresh_token(&token, self.clock.now())?;
        info!("Refresh token revoked");
        Ok(())
    }

    /// Resolves the user behind the access token in `header`.
    ///
    /// # Arguments
    ///
    /// * `header` - Raw `Authorization` header carrying `Bearer <access token>`
    ///
    /// # Returns
    ///
    /// * `Ok(Uuid)` - Id of the user the token was issued to
    /// * `Err(Error::Unauthorized)` - Missing, malformed, forged or expired
    ///   access token
    pub fn authorize(&self, header: Option<&str>) -> Result<Uuid> {
        let token = bearer_token(header).map_err(reject)?;
        self.codec
            .validate_at(&token, self.clock.now())
            .map_err(reject)
    }

    /// Replaces the email and password of an authorized user.
    ///
    /// A user removed since their token was issued is [`Error::Unauthorized`].
    pub fn update_credentials(&self, user_id: &Uuid, email: &str, password: &str) -> Result<User> {
        let hash = hash_password(password)?;
        let user = self
            .users
            .update_credentials(user_id, email, &hash)
            .map_err(|err| {
                if err.is_not_found() {
                    warn!("Credential update for missing user {user_id}");
                    Error::Unauthorized
                } else {
                    Error::Models(err)
                }
            })?;
        info!("Updated credentials of user {}", user.id);
        Ok(user)
    }
}

/// Collapses a credential failure into [`Error::Unauthorized`], keeping
/// server-side failures as they are.
fn reject(err: chirpy_auth::error::Error) -> Error {
    if err.is_credential_rejection() {
        debug!("Credential rejected: {err}");
        Error::Unauthorized
    } else {
        Error::Auth(err)
    }
}
