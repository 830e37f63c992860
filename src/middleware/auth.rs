use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use platewise_user::{user_by_id, validate_jwt, User};

use crate::routes::AppState;

/// Auth extension containing the authenticated user's row, resolved from the
/// JWT before the handler runs.
#[derive(Clone, Debug)]
pub struct CurrentUser(pub User);

fn unauthorized(message: &str) -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "error": message }))).into_response()
}

/// Authentication middleware that validates a bearer JWT
///
/// Extracts the Authorization header, validates the JWT, verifies the user
/// still exists, and inserts a CurrentUser extension. Rejects with 401 if:
/// - The header or bearer token is missing
/// - The token is invalid or expired
/// - The user no longer exists
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    let Some(token) = token else {
        tracing::warn!("Missing bearer token");
        return unauthorized("Authentication token is missing");
    };

    let claims = match validate_jwt(token, &state.config.jwt.secret) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!("Invalid JWT token: {:?}", e);
            return unauthorized("Invalid authentication token");
        }
    };

    match user_by_id(&state.pool, claims.sub).await {
        Ok(Some(user)) => {
            req.extensions_mut().insert(CurrentUser(user));
            next.run(req).await
        }
        Ok(None) => {
            tracing::warn!(user_id = claims.sub, "Token for unknown user");
            unauthorized("Invalid authentication token")
        }
        Err(e) => {
            tracing::error!("Database error checking user existence: {:?}", e);
            unauthorized("Invalid authentication token")
        }
    }
}
