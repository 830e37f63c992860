use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use sqlx::SqlitePool;

use platewise_recipe::{save_ingredient, save_recipe, NewIngredient, NewRecipe};

/// One entry of a seed file: a recipe plus its ingredient lines.
#[derive(Debug, Deserialize)]
pub struct SeedRecipe {
    #[serde(flatten)]
    pub recipe: NewRecipe,
    pub ingredients: Vec<NewIngredient>,
}

/// Import recipes from a JSON file into the catalog.
///
/// Recipes are keyed by title and ingredients by name, so re-running the
/// import against the same file does not duplicate catalog rows.
pub async fn seed_from_file(pool: &SqlitePool, path: &Path) -> anyhow::Result<usize> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read seed file {}", path.display()))?;

    let entries: Vec<SeedRecipe> =
        serde_json::from_str(&raw).context("seed file is not a valid recipe list")?;

    let mut imported = 0;
    for entry in &entries {
        let recipe_id = save_recipe(pool, &entry.recipe).await?;
        for ingredient in &entry.ingredients {
            save_ingredient(pool, recipe_id, ingredient).await?;
        }
        imported += 1;
    }

    tracing::info!(imported, file = %path.display(), "recipe seed complete");

    Ok(imported)
}
