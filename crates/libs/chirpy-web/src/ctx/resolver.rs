//! Context resolver for extracting the caller from HTTP requests.

use axum::{
    body::Body,
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, request::Parts},
    middleware::Next,
    response::Response,
};
use chirpy_auth::AUTH_HEADER;

use crate::{ctx::Ctx, prelude::*, session::SessionService};

/// Outcome of resolving the request's bearer token.
///
/// `None` means the request carried no valid access token.
#[derive(Clone, Debug)]
pub struct ResolvedCtx(pub Option<Ctx>);

/// Reads the `Authorization` header as a string, if it is valid UTF-8.
pub fn auth_header(headers: &HeaderMap) -> Option<&str> {
    headers.get(AUTH_HEADER).and_then(|h| h.to_str().ok())
}

/// Middleware for resolving request context from access tokens.
///
/// Authorizes the bearer token, if any, and adds the resulting context to the
/// request extensions. It never rejects a request by itself; routes that need
/// an identity use [`crate::mw_auth::mw_require_auth`] or take a [`Ctx`].
///
/// # Examples
///
/// ```rust,no_run
/// use std::sync::Arc;
///
/// use axum::{Router, middleware};
/// use chirpy_auth::access_token::AccessTokenCodec;
/// use chirpy_models::memory::MemoryStore;
/// use chirpy_web::{ctx::resolver::mw_ctx_resolver, session::SessionService};
///
/// let store = Arc::new(MemoryStore::new());
/// let sessions = SessionService::new(store.clone(), store, AccessTokenCodec::new("secret"));
/// let app: Router<()> = Router::new()
///     .layer(middleware::from_fn_with_state(sessions, mw_ctx_resolver));
/// ```
pub async fn mw_ctx_resolver(
    State(sessions): State<SessionService>,
    headers: HeaderMap,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let ctx = sessions.authorize(auth_header(&headers)).ok().map(Ctx::new);
    req.extensions_mut().insert(ResolvedCtx(ctx));

    next.run(req).await
}

impl<S: Send + Sync> FromRequestParts<S> for Ctx {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        parts
            .extensions
            .get::<ResolvedCtx>()
            .ok_or(Error::CtxMissing)?
            .0
            .clone()
            .ok_or(Error::Unauthorized)
    }
}
