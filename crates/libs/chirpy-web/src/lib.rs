//! Web layer for the Chirpy backend.
//!
//! Ties the authentication primitives of `chirpy-auth` to the stores of
//! `chirpy-models`: the [`session::SessionService`] login, refresh, revoke
//! and authorize flows, the request context resolved from bearer tokens, the
//! API payloads, and the chirp and billing webhook operations.

pub mod chirp;
pub mod ctx;
pub mod error;
pub mod mw_auth;
pub mod prelude;
pub mod session;
pub mod user;
pub mod webhook;
