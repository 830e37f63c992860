use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use crate::middleware::auth::CurrentUser;
use crate::routes::AppState;

/// Persists one request_logs row per authenticated call.
///
/// Runs inside the auth layer so the caller's id is already in the request
/// extensions. A failed insert is logged and ignored: auditing must not take
/// the endpoint down with it.
pub async fn request_log_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let user_id = req.extensions().get::<CurrentUser>().map(|u| u.0.id);
    let method = req.method().to_string();
    let url = req.uri().to_string();

    let response = next.run(req).await;

    if let Some(user_id) = user_id {
        let result = sqlx::query(
            r#"
            INSERT INTO request_logs (user_id, url, method, status_code, timestamp)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(user_id)
        .bind(&url)
        .bind(&method)
        .bind(response.status().as_u16() as i64)
        .bind(Utc::now().to_rfc3339())
        .execute(&state.pool)
        .await;

        if let Err(e) = result {
            tracing::error!("Failed to write request log: {:?}", e);
        }
    }

    response
}
