use axum::{
    extract::{Extension, Query, State},
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use platewise_mealplan::{PlannerProfile, WeekGrid};
use platewise_user::{spend_action_token, User};

use crate::error::AppError;
use crate::middleware::CurrentUser;
use crate::routes::AppState;

#[derive(Debug, Deserialize)]
pub struct GenerateQuery {
    /// ISO-8601 start date; defaults to the Monday of the current week.
    pub start: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct SwapPayload {
    pub recipe_id: i64,
    pub date: NaiveDate,
}

fn profile(user: &User) -> PlannerProfile {
    PlannerProfile {
        user_id: user.id,
        dietary_preference: user.dietary_preference.clone(),
        allergies: user.allergies.0.clone(),
    }
}

/// GET /meal/generate?start=YYYY-MM-DD
///
/// Costs one action token, charged before the plan is drawn.
pub async fn generate(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(query): Query<GenerateQuery>,
) -> Result<Json<WeekGrid>, AppError> {
    spend_action_token(&state.pool, user.id).await?;

    let start = query
        .start
        .unwrap_or_else(|| platewise_mealplan::monday_of(Utc::now().date_naive()));

    let grid = state.engine.generate(&profile(&user), start).await?;
    Ok(Json(grid))
}

/// GET /meal
pub async fn current(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<Option<WeekGrid>>, AppError> {
    let grid = state
        .engine
        .current_plan(&profile(&user), Utc::now().date_naive())
        .await?;
    Ok(Json(grid))
}

/// POST /meal/swap
pub async fn swap(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(payload): Json<SwapPayload>,
) -> Result<Json<WeekGrid>, AppError> {
    let grid = state
        .engine
        .swap(payload.recipe_id, payload.date, &profile(&user))
        .await?;
    Ok(Json(grid))
}
