use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use platewise_mealplan::MealPlanError;
use platewise_recipe::RecipeError;
use platewise_user::UserError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    User(#[from] UserError),

    #[error(transparent)]
    Recipe(#[from] RecipeError),

    #[error(transparent)]
    MealPlan(#[from] MealPlanError),

    #[error("Database error")]
    Database(#[from] sqlx::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone()),

            AppError::User(UserError::EmailAlreadyExists) => {
                (StatusCode::CONFLICT, "Email already registered".to_string())
            }
            AppError::User(UserError::InvalidCredentials) => {
                (StatusCode::UNAUTHORIZED, "Bad credentials".to_string())
            }
            AppError::User(UserError::OutOfActionTokens) => (
                StatusCode::FORBIDDEN,
                "No action tokens left for this account".to_string(),
            ),
            AppError::User(e) => {
                tracing::error!("User error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An unexpected error occurred. Please try again later.".to_string(),
                )
            }

            AppError::Recipe(RecipeError::NotFound) => {
                (StatusCode::NOT_FOUND, "Recipe not found".to_string())
            }
            AppError::Recipe(e) => {
                tracing::error!("Catalog error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An unexpected error occurred. Please try again later.".to_string(),
                )
            }

            AppError::MealPlan(MealPlanError::NoEligibleRecipes) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "No recipes match this diet and allergy profile".to_string(),
            ),
            AppError::MealPlan(MealPlanError::NoSwapCandidates) => (
                StatusCode::CONFLICT,
                "No alternative recipe available for this swap".to_string(),
            ),
            AppError::MealPlan(MealPlanError::SlotNotFound) => (
                StatusCode::NOT_FOUND,
                "Meal plan slot not found".to_string(),
            ),
            AppError::MealPlan(MealPlanError::Recipe(RecipeError::NotFound)) => {
                (StatusCode::NOT_FOUND, "Recipe not found".to_string())
            }
            AppError::MealPlan(e) => {
                tracing::error!("Meal planning error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An unexpected error occurred. Please try again later.".to_string(),
                )
            }

            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An unexpected error occurred. Please try again later.".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
