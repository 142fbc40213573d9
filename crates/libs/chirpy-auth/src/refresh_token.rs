//! Opaque refresh-token generation.
//!
//! A refresh token carries no meaning of its own: it is 256 bits of OS
//! randomness rendered as printable text. Whether it is usable is decided
//! entirely by a persistence lookup, which is also where uniqueness is
//! enforced.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{RngCore, rngs::OsRng};

use crate::prelude::*;

/// Entropy per refresh token, in bytes.
pub const REFRESH_TOKEN_BYTES: usize = 32;

/// Generates a new refresh token.
///
/// The token is base64url without padding: 43 characters, safe in headers
/// and URLs.
///
/// # Examples
///
/// ```rust
/// use chirpy_auth::refresh_token::generate_refresh_token;
///
/// let token = generate_refresh_token().unwrap();
/// assert_eq!(token.len(), 43);
/// ```
pub fn generate_refresh_token() -> Result<String> {
    let mut buffer = [0u8; REFRESH_TOKEN_BYTES];
    OsRng.try_fill_bytes(&mut buffer)?;
    Ok(URL_SAFE_NO_PAD.encode(buffer))
}
