//! Common error types for PlastoPack

use thiserror::Error;

/// Common result type for PlastoPack operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the PlastoPack service
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    Validation(String),

    /// History recording attempted with nothing to snapshot.
    /// A logical precondition failure, not an I/O fault.
    #[error("No rates found to record")]
    EmptyStore,

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}
