//! Signed, self-contained access tokens.
//!
//! Access tokens are compact HS256 JWTs (`header.payload.signature`, each part
//! base64url) carrying [`Claims`]. They are never stored: validity is decided
//! from the token, the server secret and the current time alone, so a token
//! cannot be revoked and its short lifetime bounds exposure. Rotating the
//! secret invalidates every outstanding token at once.
//!
//! # Examples
//!
//! ```rust
//! use chirpy_auth::access_token::AccessTokenCodec;
//! use chrono::{TimeDelta, Utc};
//! use uuid::Uuid;
//!
//! let codec = AccessTokenCodec::new("MySuperSecret");
//! let user_id = Uuid::new_v4();
//! let now = Utc::now();
//!
//! let token = codec.issue_at(user_id, TimeDelta::hours(1), now).unwrap();
//! assert_eq!(codec.validate_at(&token, now).unwrap(), user_id);
//! assert!(codec.validate_at(&token, now + TimeDelta::hours(2)).is_err());
//! ```

use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::{ISS, prelude::*};

/// Signing algorithm for every access token.
const ALGORITHM: Algorithm = Algorithm::HS256;

/// Registered claims carried by an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Issuer, always [`ISS`].
    pub iss: String,
    /// Subject, the user id in hyphenated form.
    pub sub: String,
    /// Issued at (seconds since the epoch, UTC).
    pub iat: i64,
    /// Expiration (seconds since the epoch, UTC).
    pub exp: i64,
}

impl Claims {
    fn new(user_id: Uuid, ttl: TimeDelta, now: DateTime<Utc>) -> Result<Self> {
        let expiration = now.checked_add_signed(ttl).ok_or(Error::TokenLifetime)?;
        Ok(Self {
            iss: String::from(ISS),
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
        })
    }
}

/// Key pair derived from the server secret.
#[derive(Clone)]
struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl Keys {
    fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

/// Issues and validates access tokens under one server secret.
///
/// The secret is fixed at construction; build a new codec to rotate it.
#[derive(Clone)]
pub struct AccessTokenCodec {
    keys: Keys,
    validation: Validation,
}

impl fmt::Debug for AccessTokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessTokenCodec")
            .field("algorithm", &ALGORITHM)
            .field("keys", &"REDACTED")
            .finish()
    }
}

impl AccessTokenCodec {
    /// Creates a codec keyed with `secret`.
    ///
    /// # Arguments
    ///
    /// * `secret` - Raw bytes of the HS256 signing secret
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        let mut validation = Validation::new(ALGORITHM);
        // Expiry is checked against the caller's clock in `validate_at`.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_issuer(&[ISS]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);

        Self {
            keys: Keys::new(secret.as_ref()),
            validation,
        }
    }

    /// Issues a token for `user_id` valid from `now` until `now + ttl`.
    ///
    /// # Arguments
    ///
    /// * `user_id` - Subject of the token
    /// * `ttl` - Lifetime; a negative value yields an already expired token
    /// * `now` - Issue instant, recorded as `iat`
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - Compact signed JWT
    /// * `Err(Error::TokenLifetime)` - `now + ttl` is not a representable instant
    /// * `Err(Error::TokenCreation)` - Encoding failed
    pub fn issue_at(&self, user_id: Uuid, ttl: TimeDelta, now: DateTime<Utc>) -> Result<String> {
        let claims = Claims::new(user_id, ttl, now)?;
        Ok(encode(&Header::new(ALGORITHM), &claims, &self.keys.encoding)?)
    }

    /// Issues a token valid for `ttl` from the current wall-clock time.
    ///
    /// See [`AccessTokenCodec::issue_at`] for the possible errors.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chirpy_auth::access_token::AccessTokenCodec;
    /// use chrono::TimeDelta;
    /// use uuid::Uuid;
    ///
    /// let codec = AccessTokenCodec::new("MySuperSecret");
    /// let user_id = Uuid::new_v4();
    /// let token = codec.issue(user_id, TimeDelta::hours(1)).unwrap();
    /// assert_eq!(token.split('.').count(), 3);
    /// assert_eq!(codec.validate(&token).unwrap(), user_id);
    /// ```
    pub fn issue(&self, user_id: Uuid, ttl: TimeDelta) -> Result<String> {
        self.issue_at(user_id, ttl, Utc::now())
    }

    /// Verifies `token` as of `now` and returns the user it was issued to.
    ///
    /// Checks run in order: signature (and structure), expiry, subject.
    /// A token is still valid at exactly its expiration second.
    ///
    /// # Errors
    ///
    /// * [`Error::InvalidSignature`] - signed with another secret or tampered
    /// * [`Error::InvalidToken`] - not a well-formed token from this issuer
    /// * [`Error::TokenExpired`] - `now` is past the expiration
    /// * [`Error::InvalidSubject`] - subject is not a user id
    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Result<Uuid> {
        let claims = self.decode_claims(token)?;

        if now.timestamp() > claims.exp {
            return Err(Error::TokenExpired);
        }

        Uuid::parse_str(&claims.sub).map_err(|_| Error::InvalidSubject)
    }

    /// Verifies `token` against the current wall-clock time.
    ///
    /// # Returns
    ///
    /// * `Ok(Uuid)` - The user the token was issued to
    /// * `Err(Error)` - As for [`AccessTokenCodec::validate_at`]
    pub fn validate(&self, token: &str) -> Result<Uuid> {
        self.validate_at(token, Utc::now())
    }

    fn decode_claims(&self, token: &str) -> Result<Claims> {
        decode::<Claims>(token, &self.keys.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|err| {
                debug!("Rejected access token: {err}");
                match err.kind() {
                    ErrorKind::InvalidSignature => Error::InvalidSignature,
                    _ => Error::InvalidToken,
                }
            })
    }
}
