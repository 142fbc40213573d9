//! Authentication primitives for the Chirpy backend.
//!
//! - [`password`]: Argon2 password hashing and verification.
//! - [`credential`]: `Authorization` header parsing for bearer tokens and API keys.
//! - [`access_token`]: signed, short-lived access tokens (HS256 JWT).
//! - [`refresh_token`]: opaque refresh-token generation.
//! - [`clock`]: the time source every expiry check is evaluated against.

pub mod access_token;
pub mod clock;
pub mod credential;
pub mod error;
pub mod password;
pub mod prelude;
pub mod refresh_token;

/// Issuer claim written into, and required from, every access token.
pub const ISS: &str = "chirpy";
/// Name of the transport header carrying credentials.
pub const AUTH_HEADER: &str = "Authorization";
