mod auth;
mod health;
mod meal_plan;
mod recipes;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use sqlx::SqlitePool;
use tower_http::trace::TraceLayer;

use platewise_mealplan::MealPlanEngine;
use platewise_recipe::SqliteCatalog;

use crate::config::Config;
use crate::middleware::{auth_middleware, request_log_middleware};

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Config,
    pub engine: MealPlanEngine<SqliteCatalog>,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: Config) -> Self {
        let engine = MealPlanEngine::new(SqliteCatalog::new(pool.clone()), pool.clone());
        Self {
            pool,
            config,
            engine,
        }
    }
}

pub fn router(state: AppState) -> Router {
    let public = Router::new()
        .route("/user", post(auth::register))
        .route("/user/login", post(auth::login));

    // Layers wrap outside-in: auth is added last so it runs before the
    // request log, which needs the resolved user in the extensions.
    let protected = Router::new()
        .route("/recipe/diet", get(recipes::by_diet))
        .route("/recipe/id/{id}", get(recipes::detail))
        .route("/meal", get(meal_plan::current))
        .route("/meal/generate", get(meal_plan::generate))
        .route("/meal/swap", post(meal_plan::swap))
        .route_layer(from_fn_with_state(state.clone(), request_log_middleware))
        .route_layer(from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(health::router(state.pool.clone()))
        .merge(public)
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
