//! Main Crate Error
//!
//! [`Error`] keeps the precise cause of a failure for the logs. What leaves
//! the process is only its [`ErrorKind`], so a response never tells an
//! unknown email from a wrong password, or a revoked refresh token from one
//! that was never issued.

use axum::{Json, http::StatusCode, response::IntoResponse};
use serde_json::json;
use tracing::{error, warn};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Auth(#[from] chirpy_auth::error::Error),

    #[error(transparent)]
    Models(#[from] chirpy_models::error::Error),

    /// Login failed, whatever the reason.
    #[error("Authentication Failed")]
    AuthenticationFailed,

    /// A credential was missing, malformed, expired or not recognised.
    #[error("Unauthorized")]
    Unauthorized,

    #[error("API Forbidden")]
    ApiForbidden,

    #[error("Chirp is too long ({0} characters)")]
    ChirpTooLong(usize),

    #[error("Invalid sort order {0:?}")]
    InvalidSortOrder(String),

    #[error("Invalid id {0:?}")]
    InvalidId(String),

    #[error("Invalid webhook payload: {0}")]
    InvalidPayload(serde_json::Error),

    #[error("Chirp Not Found")]
    ChirpNotFound,

    #[error("User Not Found")]
    UserNotFound,

    #[error("Context Missing")]
    CtxMissing,
}

/// The coarse outcome reported to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Unauthorized,
    AuthenticationFailed,
    Forbidden,
    NotFound,
    BadRequest,
    Internal,
}

impl ErrorKind {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorKind::Unauthorized | ErrorKind::AuthenticationFailed => StatusCode::UNAUTHORIZED,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            ErrorKind::Unauthorized => "Unauthorized",
            ErrorKind::AuthenticationFailed => "Incorrect email or password",
            ErrorKind::Forbidden => "Access forbidden",
            ErrorKind::NotFound => "Not found",
            ErrorKind::BadRequest => "Bad request",
            ErrorKind::Internal => "Internal server error",
        }
    }
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Auth(err) if err.is_credential_rejection() => ErrorKind::Unauthorized,
            Error::Auth(_) => ErrorKind::Internal,
            Error::Models(err) if err.is_not_found() => ErrorKind::NotFound,
            Error::Models(_) => ErrorKind::Internal,
            Error::AuthenticationFailed => ErrorKind::AuthenticationFailed,
            Error::Unauthorized | Error::CtxMissing => ErrorKind::Unauthorized,
            Error::ApiForbidden => ErrorKind::Forbidden,
            Error::ChirpTooLong(_)
            | Error::InvalidSortOrder(_)
            | Error::InvalidId(_)
            | Error::InvalidPayload(_) => ErrorKind::BadRequest,
            Error::ChirpNotFound | Error::UserNotFound => ErrorKind::NotFound,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let kind = self.kind();
        if kind == ErrorKind::Internal {
            error!("Creating API error response for error: {:?}", self);
        } else {
            warn!("Creating API error response for error: {:?}", self);
        }

        let status = kind.status();
        let body = Json(json!({
            "error": {
                "message": kind.message(),
                "status": status.as_u16()
            }
        }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use chirpy_auth::error::Error as AuthError;
    use chirpy_models::error::Error as ModelsError;

    use super::*;

    #[test]
    fn credential_failures_are_unauthorized() {
        for err in [
            AuthError::MissingCredential,
            AuthError::MalformedCredential,
            AuthError::InvalidToken,
            AuthError::InvalidSignature,
            AuthError::TokenExpired,
            AuthError::InvalidSubject,
        ] {
            assert_eq!(Error::from(err).kind(), ErrorKind::Unauthorized);
        }
    }

    #[test]
    fn server_failures_are_internal() {
        assert_eq!(
            Error::from(AuthError::TokenLifetime).kind(),
            ErrorKind::Internal
        );
        assert_eq!(
            Error::from(ModelsError::Migration(String::from("boom"))).kind(),
            ErrorKind::Internal
        );
    }

    #[test]
    fn authentication_failure_shares_status_but_not_message() {
        let login = ErrorKind::AuthenticationFailed;
        let access = ErrorKind::Unauthorized;
        assert_eq!(login.status(), access.status());
        assert_ne!(login.message(), access.message());
    }

    #[test]
    fn response_carries_only_the_coarse_kind() {
        let response = Error::from(AuthError::InvalidSignature).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
