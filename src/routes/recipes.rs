use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use platewise_recipe::{list_recipes_by_diet, recipe_detail, Recipe, RecipeDetail};

use crate::error::AppError;
use crate::routes::AppState;

#[derive(Debug, Deserialize)]
pub struct DietQuery {
    pub filter: String,
}

/// GET /recipe/diet?filter=vegan
pub async fn by_diet(
    State(state): State<AppState>,
    Query(query): Query<DietQuery>,
) -> Result<Json<Vec<Recipe>>, AppError> {
    let recipes = list_recipes_by_diet(&state.pool, &query.filter).await?;
    Ok(Json(recipes))
}

/// GET /recipe/id/{id}
pub async fn detail(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<RecipeDetail>, AppError> {
    let detail = recipe_detail(&state.pool, id).await?;
    Ok(Json(detail))
}
