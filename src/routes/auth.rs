use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

use platewise_user::{authenticate, create_user, generate_jwt, NewUser, User};

use crate::error::AppError;
use crate::routes::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterPayload {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[validate(length(min = 1, message = "Dietary preference must not be empty"))]
    pub dietary_preference: String,
    #[serde(default)]
    pub allergies: Vec<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginPayload {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password must not be empty"))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub user: User,
    pub jwtoken: String,
}

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterPayload>,
) -> Result<(StatusCode, Json<User>), AppError> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let user = create_user(
        &state.pool,
        &NewUser {
            email: payload.email,
            password: payload.password,
            first_name: payload.first_name,
            last_name: payload.last_name,
            dietary_preference: payload.dietary_preference,
            allergies: payload.allergies,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<Json<LoginResponse>, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let user = authenticate(&state.pool, &payload.email, &payload.password).await?;

    let token = generate_jwt(
        user.id,
        user.email.clone(),
        &state.config.jwt.secret,
        state.config.jwt.expiration_days,
    )
    .map_err(|e| {
        tracing::error!("Failed to sign JWT: {:?}", e);
        AppError::Validation("Could not issue a session token".to_string())
    })?;

    tracing::info!(user_id = user.id, "user logged in");

    Ok(Json(LoginResponse {
        user,
        jwtoken: token,
    }))
}
