use thiserror::Error;

/// Domain-specific errors for catalog operations
#[derive(Debug, Error)]
pub enum RecipeError {
    #[error("Recipe not found")]
    NotFound,

    #[error("Database error")]
    Database(#[from] sqlx::Error),
}

/// Result type for catalog operations that may fail with RecipeError
pub type RecipeResult<T> = Result<T, RecipeError>;
