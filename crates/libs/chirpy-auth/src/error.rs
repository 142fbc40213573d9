//! Authentication error taxonomy.
//!
//! Variants carry the precise reason a check failed. Callers that face the
//! network are expected to collapse them into a coarse outcome before
//! answering; the detail is for logs only.

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The `Authorization` header is absent or blank.
    #[error("Credential Missing")]
    MissingCredential,

    /// The header is not `<scheme> <value>` with the expected scheme.
    #[error("Credential Malformed")]
    MalformedCredential,

    /// The access token could not be parsed or lacks required claims.
    #[error("Invalid Token")]
    InvalidToken,

    /// The access token signature does not match the server secret.
    #[error("Invalid Token Signature")]
    InvalidSignature,

    #[error("Token Expired")]
    TokenExpired,

    /// The access token subject is not a user id.
    #[error("Invalid Token Subject")]
    InvalidSubject,

    /// The presented API key does not match the configured one.
    #[error("Invalid Api Key")]
    InvalidApiKey,

    /// Password verification failed. Deliberately carries no reason.
    #[error("Password Mismatch")]
    PasswordMismatch,

    /// `issued_at + ttl` does not fit in a timestamp.
    #[error("Token Lifetime Out Of Range")]
    TokenLifetime,

    #[error(transparent)]
    TokenCreation(#[from] jsonwebtoken::errors::Error),

    #[error("Error hashing password {0}")]
    PasswordHash(argon2::password_hash::Error),

    #[error("Random source failure {0}")]
    Random(#[from] rand::Error),
}

impl Error {
    /// Whether the error describes a rejected credential rather than a
    /// server-side failure.
    pub fn is_credential_rejection(&self) -> bool {
        !matches!(
            self,
            Error::TokenLifetime
                | Error::TokenCreation(_)
                | Error::PasswordHash(_)
                | Error::Random(_)
        )
    }
}
