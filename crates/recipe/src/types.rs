use serde::{Deserialize, Serialize};
use sqlx::types::Json;

/// Sentinel diet preference meaning "no diet restriction".
///
/// Users with this preference receive recipes from every diet tag;
/// comparison against it is case-insensitive.
pub const FLEX_DIET: &str = "flex";

/// Recipe data from the recipes table
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Recipe {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub diet: String,
    pub servings: i64,
    pub prep_time: i64,
    pub cook_time: i64,
    pub calories: i64,
    pub carbohydrates: i64,
    pub protein: i64,
    pub fat: i64,
    pub instructions: Json<Vec<String>>,
    pub breakfast: bool,
}

/// One ingredient of a recipe, joined with its quantity and unit
/// from the recipe_ingredients relation.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct IngredientLine {
    pub ingredient_id: i64,
    pub name: String,
    pub category: Option<String>,
    pub allergen: Option<String>,
    pub quantity: f64,
    pub unit: Option<String>,
}

/// Recipe with its full ingredient list, as served by the detail endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct RecipeDetail {
    #[serde(flatten)]
    pub recipe: Recipe,
    pub ingredients: Vec<IngredientLine>,
}
