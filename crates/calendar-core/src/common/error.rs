//! Error types for the calendar services.
//!
//! This module defines the central `Error` enum, which captures every
//! request-level failure a service method can report. It implements
//! `From<Error>` for `tonic::Status` so that handlers can propagate errors to
//! clients with `?` and get an appropriate status code.
//!
//! ## Error Cases
//! - `InvalidRequest`: The request was malformed or violated a constraint.
//! - `Unauthenticated`: Credentials or token were not accepted.
//! - `AlreadyExists`: The entity being created is already present.
//! - `NotFound`: The addressed entity does not exist for this caller.
//! - `Database` / `Cache`: A backend call failed.
//! - `Upstream`: A call to another service returned a non-OK status.
//! - `Internal`: Anything else that should not happen.

use tonic::Status;

pub type Result<T> = core::result::Result<T, Error>;

/// Unified request-level error type.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The client request was invalid or violated constraints.
    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },

    /// The credentials or session token were not accepted.
    #[error("Unauthenticated")]
    Unauthenticated,

    #[error("{what} already exists")]
    AlreadyExists { what: String },

    #[error("{what} not found")]
    NotFound { what: String },

    #[error("Database error: {context}")]
    Database { context: String },

    #[error("Cache error: {context}")]
    Cache { context: String },

    /// Another service answered with a non-OK status. The status is passed
    /// through to our own caller untouched.
    #[error("Upstream error: {0}")]
    Upstream(#[from] Status),

    #[error("Internal error: {context}")]
    Internal { context: String },
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Error::Database {
            context: err.to_string(),
        }
    }
}

impl From<redis::RedisError> for Error {
    fn from(err: redis::RedisError) -> Self {
        Error::Cache {
            context: err.to_string(),
        }
    }
}

impl From<Error> for Status {
    fn from(err: Error) -> Self {
        match err {
            Error::InvalidRequest { reason } => Status::invalid_argument(reason),
            Error::Unauthenticated => Status::unauthenticated("Unauthenticated"),
            Error::AlreadyExists { what } => {
                Status::already_exists(format!("{what} already exists"))
            }
            Error::NotFound { what } => Status::not_found(format!("{what} not found")),
            Error::Database { context } => {
                Status::unavailable(format!("Database error: {context}"))
            }
            Error::Cache { context } => Status::unavailable(format!("Cache error: {context}")),
            Error::Upstream(status) => status,
            Error::Internal { context } => Status::internal(context),
        }
    }
}
