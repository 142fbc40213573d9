//! Password hashing and verification using Argon2.
//!
//! Hashes are PHC strings (`$argon2id$v=19$m=...,t=...,p=...$salt$hash`), so
//! the algorithm, cost parameters and salt travel with the hash. A fresh
//! salt is drawn from the OS for every call to [`hash_password`].
//!
//! # Examples
//!
//! ```rust
//! use chirpy_auth::password::{hash_password, verify_password};
//!
//! let hash = hash_password("p1").unwrap();
//! assert!(verify_password("p1", &hash).is_ok());
//! assert!(verify_password("p2", &hash).is_err());
//! ```

use argon2::{
    Argon2, PasswordHasher, PasswordVerifier,
    password_hash::{self, PasswordHashString, SaltString},
};
use rand::rngs::OsRng;

use crate::prelude::*;

/// Hashes `password` with Argon2id at the library's default cost.
///
/// # Returns
///
/// * `Ok(String)` - Self-describing hash ready for storage
/// * `Err(Error::PasswordHash)` - The hasher rejected its input or parameters
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    Ok(argon2.hash_password(password.as_bytes(), &salt)?.to_string())
}

/// Verifies `password` against a stored hash.
///
/// The comparison is constant-time. Every failure, including a stored hash
/// that does not parse, is reported as [`Error::PasswordMismatch`].
///
/// # Arguments
///
/// * `password` - Plaintext supplied by the caller
/// * `hash` - PHC string previously produced by [`hash_password`]
///
/// # Returns
///
/// * `Ok(())` - The password matches
/// * `Err(Error::PasswordMismatch)` - Wrong password or unusable hash
///
/// # Examples
///
/// ```rust
/// use chirpy_auth::{error::Error, password::{hash_password, verify_password}};
///
/// let hash = hash_password("hunter2").unwrap();
/// assert!(verify_password("hunter2", &hash).is_ok());
/// assert!(matches!(
///     verify_password("hunter2", "not-a-hash"),
///     Err(Error::PasswordMismatch)
/// ));
/// ```
pub fn verify_password(password: &str, hash: &str) -> Result<()> {
    let hash = PasswordHashString::new(hash).map_err(|_| Error::PasswordMismatch)?;

    Argon2::default()
        .verify_password(password.as_bytes(), &hash.password_hash())
        .map_err(|_| Error::PasswordMismatch)
}

impl From<password_hash::Error> for Error {
    fn from(value: password_hash::Error) -> Self {
        Self::PasswordHash(value)
    }
}
