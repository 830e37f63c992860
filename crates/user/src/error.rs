use thiserror::Error;

/// Domain-specific errors for user operations
///
/// These errors represent business logic failures that should be
/// handled explicitly in the application layer (e.g., mapped to specific
/// HTTP status codes).
#[derive(Debug, Error)]
pub enum UserError {
    #[error("Email already registered")]
    EmailAlreadyExists,

    #[error("Bad credentials")]
    InvalidCredentials,

    #[error("No action tokens left")]
    OutOfActionTokens,

    #[error("Password hashing failed: {0}")]
    HashingError(String),

    #[error("Database error")]
    Database(#[from] sqlx::Error),
}

/// Result type for user operations that may fail with UserError
pub type UserResult<T> = Result<T, UserError>;
