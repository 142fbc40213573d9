//! Error types for the Chirpy API server.

/// Errors that stop the server from starting or serving.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    IO(#[from] std::io::Error),

    #[error(transparent)]
    Model(#[from] chirpy_models::error::Error),

    #[error("Environment variable {0} is not set")]
    MissingEnv(&'static str),

    #[error("Environment variable {0} is invalid")]
    InvalidEnv(&'static str),
}
