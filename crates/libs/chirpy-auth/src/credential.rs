//! Scheme-qualified credential extraction from the `Authorization` header.
//!
//! The same routine serves both call sites: `Bearer <token>` for access and
//! refresh tokens, and `ApiKey <key>` for the billing webhook.

use std::fmt;

use subtle::ConstantTimeEq;

use crate::prelude::*;

/// Authorization scheme expected by a call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Bearer,
    ApiKey,
}

impl Scheme {
    /// Canonical lowercase name, used for case-insensitive matching.
    pub const fn as_str(self) -> &'static str {
        match self {
            Scheme::Bearer => "bearer",
            Scheme::ApiKey => "apikey",
        }
    }

    fn matches(self, raw: &str) -> bool {
        raw.eq_ignore_ascii_case(self.as_str())
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A credential parsed out of a single request. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub scheme: Scheme,
    pub value: String,
}

/// Parses a raw header value into a credential of the `expected` scheme.
///
/// # Errors
///
/// * [`Error::MissingCredential`] - header absent, empty or blank
/// * [`Error::MalformedCredential`] - not exactly two whitespace-separated
///   parts, wrong scheme, or empty value
///
/// # Examples
///
/// ```rust
/// use chirpy_auth::credential::{Scheme, extract_credential};
///
/// let credential = extract_credential(Some("bearer abc"), Scheme::Bearer).unwrap();
/// assert_eq!(credential.value, "abc");
/// assert!(extract_credential(Some("Bearer"), Scheme::Bearer).is_err());
/// ```
pub fn extract_credential(header: Option<&str>, expected: Scheme) -> Result<Credential> {
    let header = header.map(str::trim).unwrap_or_default();
    if header.is_empty() {
        return Err(Error::MissingCredential);
    }

    let mut parts = header.split_whitespace();
    let (Some(scheme), Some(value), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(Error::MalformedCredential);
    };

    if !expected.matches(scheme) || value.trim().is_empty() {
        return Err(Error::MalformedCredential);
    }

    Ok(Credential {
        scheme: expected,
        value: value.to_string(),
    })
}

/// Shorthand for the bearer call sites; returns only the token.
pub fn bearer_token(header: Option<&str>) -> Result<String> {
    Ok(extract_credential(header, Scheme::Bearer)?.value)
}

/// Shorthand for the webhook call site; returns only the key.
pub fn api_key(header: Option<&str>) -> Result<String> {
    Ok(extract_credential(header, Scheme::ApiKey)?.value)
}

/// Checks the `ApiKey` credential in `header` against `expected`.
///
/// The comparison runs in constant time with respect to the key contents.
///
/// # Arguments
///
/// * `header` - Raw `Authorization` header value, if present
/// * `expected` - The configured key
///
/// # Returns
///
/// * `Ok(())` - The header carries exactly `expected`
/// * `Err(Error::MissingCredential)` - No usable header
/// * `Err(Error::MalformedCredential)` - Not an `ApiKey <key>` header
/// * `Err(Error::InvalidApiKey)` - Well formed but the wrong key
///
/// # Examples
///
/// ```rust
/// use chirpy_auth::credential::verify_api_key;
///
/// assert!(verify_api_key(Some("ApiKey k1"), "k1").is_ok());
/// assert!(verify_api_key(Some("ApiKey k2"), "k1").is_err());
/// assert!(verify_api_key(Some("Bearer k1"), "k1").is_err());
/// ```
pub fn verify_api_key(header: Option<&str>, expected: &str) -> Result<()> {
    let presented = api_key(header)?;
    if bool::from(presented.as_bytes().ct_eq(expected.as_bytes())) {
        Ok(())
    } else {
        Err(Error::InvalidApiKey)
    }
}
