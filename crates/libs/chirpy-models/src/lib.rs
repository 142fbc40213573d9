//! Database models and persistence for Chirpy.
//!
//! Provides the Diesel models for users, refresh tokens and chirps, the
//! capability traits the services depend on ([`store`]), and two
//! implementations of them: PostgreSQL through [`db::connection::DbConnection`]
//! and an in-process [`memory::MemoryStore`].
//!
//! # Usage
//!
//! ```rust,no_run
//! use chirpy_models::db::{config::DbConfig, connection::DbConnection};
//! use chirpy_models::store::UserStore;
//!
//! let config = DbConfig::new("postgres://localhost/chirpy");
//! let db = DbConnection::new(&config).unwrap().setup().unwrap();
//! let user = db.user_by_email("a@b.com");
//! ```

pub mod chirp;
pub mod db;
pub mod error;
pub mod memory;
pub mod prelude;
pub mod refresh_token;
pub mod store;
pub mod user;
mod schema;
