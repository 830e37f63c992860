use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::error::RecipeResult;
use crate::types::Recipe;

const RECIPE_COLUMNS: &str = "id, title, description, diet, servings, prep_time, cook_time, \
                              calories, carbohydrates, protein, fat, instructions, breakfast";

/// Read-side capability over the recipe catalog.
///
/// The meal-plan engine depends on this trait rather than on SQL directly so
/// tests can substitute a deterministic catalog. The production
/// implementation is [`SqliteCatalog`].
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Ids of recipes whose linked-ingredient allergen tags have an empty
    /// intersection with `allergies`. Comparison is case-insensitive.
    async fn safe_recipe_ids(&self, allergies: &[String]) -> RecipeResult<Vec<i64>>;

    /// Uniform random sample of up to `limit` distinct recipes among `ids`,
    /// optionally restricted to an exact diet tag. A true uniform sample,
    /// not "first N".
    async fn sample_recipes(
        &self,
        ids: &[i64],
        diet: Option<&str>,
        limit: u32,
    ) -> RecipeResult<Vec<Recipe>>;

    /// Allergen tags of a recipe's linked ingredients, deduplicated and
    /// sorted alphabetically.
    async fn recipe_allergens(&self, recipe_id: i64) -> RecipeResult<Vec<String>>;

    /// Load recipes by id. Order of the result is unspecified.
    async fn recipes_by_ids(&self, ids: &[i64]) -> RecipeResult<Vec<Recipe>>;
}

/// Catalog backed by the recipes / ingredients / recipe_ingredients tables.
#[derive(Clone)]
pub struct SqliteCatalog {
    pool: SqlitePool,
}

impl SqliteCatalog {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn placeholders(count: usize) -> String {
    std::iter::repeat("?")
        .take(count)
        .collect::<Vec<_>>()
        .join(", ")
}

#[async_trait]
impl Catalog for SqliteCatalog {
    async fn safe_recipe_ids(&self, allergies: &[String]) -> RecipeResult<Vec<i64>> {
        if allergies.is_empty() {
            let ids = sqlx::query_scalar::<_, i64>("SELECT id FROM recipes ORDER BY id")
                .fetch_all(&self.pool)
                .await?;
            return Ok(ids);
        }

        let sql = format!(
            r#"
            SELECT r.id FROM recipes r
            WHERE NOT EXISTS (
                SELECT 1 FROM recipe_ingredients ri
                JOIN ingredients i ON i.id = ri.ingredient_id
                WHERE ri.recipe_id = r.id
                  AND i.allergen IS NOT NULL
                  AND lower(i.allergen) IN ({})
            )
            ORDER BY r.id
            "#,
            placeholders(allergies.len())
        );

        let mut query = sqlx::query_scalar::<_, i64>(&sql);
        for allergy in allergies {
            query = query.bind(allergy.to_lowercase());
        }

        let ids = query.fetch_all(&self.pool).await?;
        Ok(ids)
    }

    async fn sample_recipes(
        &self,
        ids: &[i64],
        diet: Option<&str>,
        limit: u32,
    ) -> RecipeResult<Vec<Recipe>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut sql = format!(
            "SELECT {} FROM recipes WHERE id IN ({})",
            RECIPE_COLUMNS,
            placeholders(ids.len())
        );
        if diet.is_some() {
            sql.push_str(" AND diet = ?");
        }
        sql.push_str(" ORDER BY RANDOM() LIMIT ?");

        let mut query = sqlx::query_as::<_, Recipe>(&sql);
        for id in ids {
            query = query.bind(id);
        }
        if let Some(diet) = diet {
            query = query.bind(diet);
        }
        query = query.bind(limit);

        let recipes = query.fetch_all(&self.pool).await?;
        Ok(recipes)
    }

    async fn recipe_allergens(&self, recipe_id: i64) -> RecipeResult<Vec<String>> {
        let allergens = sqlx::query_scalar::<_, String>(
            r#"
            SELECT DISTINCT i.allergen FROM recipe_ingredients ri
            JOIN ingredients i ON i.id = ri.ingredient_id
            WHERE ri.recipe_id = ?1 AND i.allergen IS NOT NULL
            ORDER BY i.allergen
            "#,
        )
        .bind(recipe_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(allergens)
    }

    async fn recipes_by_ids(&self, ids: &[i64]) -> RecipeResult<Vec<Recipe>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "SELECT {} FROM recipes WHERE id IN ({})",
            RECIPE_COLUMNS,
            placeholders(ids.len())
        );

        let mut query = sqlx::query_as::<_, Recipe>(&sql);
        for id in ids {
            query = query.bind(id);
        }

        let recipes = query.fetch_all(&self.pool).await?;
        Ok(recipes)
    }
}
