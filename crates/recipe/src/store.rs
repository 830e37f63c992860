use serde::Deserialize;
use sqlx::SqlitePool;

use crate::error::{RecipeError, RecipeResult};
use crate::types::{IngredientLine, Recipe, RecipeDetail};

/// Payload for creating a recipe, as accepted by the seed importer.
#[derive(Debug, Clone, Deserialize)]
pub struct NewRecipe {
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
    pub instructions: Vec<String>,
    #[serde(default)]
    pub breakfast: bool,
}

/// Payload for linking an ingredient to a recipe.
#[derive(Debug, Clone, Deserialize)]
pub struct NewIngredient {
    pub name: String,
    pub category: Option<String>,
    pub allergen: Option<String>,
    pub quantity: f64,
    pub unit: Option<String>,
}

/// Insert a recipe, or return the id of the existing recipe with the same
/// title. Titles are the catalog's natural key for imports.
pub async fn save_recipe(pool: &SqlitePool, recipe: &NewRecipe) -> RecipeResult<i64> {
    let existing = sqlx::query_scalar::<_, i64>("SELECT id FROM recipes WHERE title = ?1")
        .bind(&recipe.title)
        .fetch_optional(pool)
        .await?;

    if let Some(id) = existing {
        return Ok(id);
    }

    let instructions = serde_json::to_string(&recipe.instructions)
        .map_err(|e| sqlx::Error::Encode(Box::new(e)))?;

    let id = sqlx::query(
        r#"
        INSERT INTO recipes (
            title, description, diet, servings, prep_time, cook_time,
            calories, carbohydrates, protein, fat, instructions, breakfast
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
        "#,
    )
    .bind(&recipe.title)
    .bind(&recipe.description)
    .bind(&recipe.diet)
    .bind(recipe.servings)
    .bind(recipe.prep_time)
    .bind(recipe.cook_time)
    .bind(recipe.calories)
    .bind(recipe.carbohydrates)
    .bind(recipe.protein)
    .bind(recipe.fat)
    .bind(instructions)
    .bind(recipe.breakfast)
    .execute(pool)
    .await?
    .last_insert_rowid();

    tracing::debug!(recipe_id = id, title = %recipe.title, "recipe saved");

    Ok(id)
}

/// Link an ingredient to a recipe, creating the ingredient row first if the
/// name is not known yet. Ingredient names are unique.
pub async fn save_ingredient(
    pool: &SqlitePool,
    recipe_id: i64,
    ingredient: &NewIngredient,
) -> RecipeResult<i64> {
    let existing = sqlx::query_scalar::<_, i64>("SELECT id FROM ingredients WHERE name = ?1")
        .bind(&ingredient.name)
        .fetch_optional(pool)
        .await?;

    let ingredient_id = match existing {
        Some(id) => id,
        None => sqlx::query("INSERT INTO ingredients (name, category, allergen) VALUES (?1, ?2, ?3)")
            .bind(&ingredient.name)
            .bind(&ingredient.category)
            .bind(&ingredient.allergen)
            .execute(pool)
            .await?
            .last_insert_rowid(),
    };

    sqlx::query(
        r#"
        INSERT INTO recipe_ingredients (recipe_id, ingredient_id, quantity, unit)
        VALUES (?1, ?2, ?3, ?4)
        "#,
    )
    .bind(recipe_id)
    .bind(ingredient_id)
    .bind(ingredient.quantity)
    .bind(&ingredient.unit)
    .execute(pool)
    .await?;

    Ok(ingredient_id)
}

/// List recipes carrying an exact diet tag.
pub async fn list_recipes_by_diet(pool: &SqlitePool, diet: &str) -> RecipeResult<Vec<Recipe>> {
    let recipes = sqlx::query_as::<_, Recipe>(
        r#"
        SELECT id, title, description, diet, servings, prep_time, cook_time,
               calories, carbohydrates, protein, fat, instructions, breakfast
        FROM recipes
        WHERE diet = ?1
        ORDER BY id
        "#,
    )
    .bind(diet)
    .fetch_all(pool)
    .await?;

    Ok(recipes)
}

/// Load one recipe with its full ingredient list.
pub async fn recipe_detail(pool: &SqlitePool, recipe_id: i64) -> RecipeResult<RecipeDetail> {
    let recipe = sqlx::query_as::<_, Recipe>(
        r#"
        SELECT id, title, description, diet, servings, prep_time, cook_time,
               calories, carbohydrates, protein, fat, instructions, breakfast
        FROM recipes
        WHERE id = ?1
        "#,
    )
    .bind(recipe_id)
    .fetch_optional(pool)
    .await?
    .ok_or(RecipeError::NotFound)?;

    let ingredients = sqlx::query_as::<_, IngredientLine>(
        r#"
        SELECT i.id AS ingredient_id, i.name, i.category, i.allergen,
               ri.quantity, ri.unit
        FROM recipe_ingredients ri
        JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE ri.recipe_id = ?1
        ORDER BY ri.id
        "#,
    )
    .bind(recipe_id)
    .fetch_all(pool)
    .await?;

    Ok(RecipeDetail {
        recipe,
        ingredients,
    })
}
