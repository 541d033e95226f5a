//! Authentication error types.

use thiserror::Error;

use dessert_shop_core::{EmailError, UsernameError};

use crate::db::{ConstraintKind, RepositoryError};

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown identifier or wrong password. The two are indistinguishable.
    #[error("invalid authentication credentials")]
    InvalidCredentials,

    #[error("duplicate username")]
    DuplicateUsername,

    #[error("duplicate email")]
    DuplicateEmail,

    /// A uniqueness rule other than username or email was violated.
    #[error("duplicate record found")]
    DuplicateRecord,

    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("invalid username: {0}")]
    InvalidUsername(#[from] UsernameError),

    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[source] RepositoryError),
}

impl From<RepositoryError> for AuthError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::ConstraintViolation(ConstraintKind::Username) => {
                Self::DuplicateUsername
            }
            RepositoryError::ConstraintViolation(ConstraintKind::Email) => Self::DuplicateEmail,
            RepositoryError::ConstraintViolation(_) => Self::DuplicateRecord,
            other => Self::Repository(other),
        }
    }
}
