use std::collections::HashMap;

use chrono::{Duration, NaiveDate};
use rand::seq::IndexedRandom;
use sqlx::SqlitePool;

use platewise_recipe::{Catalog, Recipe, RecipeError, FLEX_DIET};

use crate::error::MealPlanError;
use crate::grid::{monday_of, DayPlan, MealType, PlannedMeal, WeekGrid, MEALS_PER_DAY, PLAN_SIZE};

/// The slice of a user the engine needs: identity plus dietary constraints.
///
/// Resolved by the caller (auth middleware) before the engine is invoked;
/// the engine itself never touches sessions or ambient state.
#[derive(Debug, Clone)]
pub struct PlannerProfile {
    pub user_id: i64,
    pub dietary_preference: String,
    pub allergies: Vec<String>,
}

/// Generates, reads and mutates weekly meal plans.
///
/// Catalog reads go through the [`Catalog`] capability so tests can inject a
/// deterministic recipe source; plan persistence goes straight to SQLite.
#[derive(Clone)]
pub struct MealPlanEngine<C> {
    catalog: C,
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct SlotRow {
    recipe_id: i64,
    date: String,
}

impl<C: Catalog> MealPlanEngine<C> {
    pub fn new(catalog: C, pool: SqlitePool) -> Self {
        Self { catalog, pool }
    }

    /// Generate (or fully regenerate) the plan covering
    /// `start_date..start_date + 6`.
    ///
    /// Draws up to 14 distinct safe recipes uniformly at random; when the
    /// eligible set is smaller than 14 the drawn list is cycled until the
    /// grid is full. The repetition is an accepted trade-off for sparse
    /// catalogs, not a bug. An empty eligible set fails with
    /// `NoEligibleRecipes` and writes nothing.
    ///
    /// The plan row is keyed by the Monday of `start_date`'s week; slot
    /// replacement is delete-all-then-insert-all inside one transaction.
    pub async fn generate(
        &self,
        user: &PlannerProfile,
        start_date: NaiveDate,
    ) -> Result<WeekGrid, MealPlanError> {
        let safe_ids = self.catalog.safe_recipe_ids(&user.allergies).await?;

        let diet = (!user.dietary_preference.eq_ignore_ascii_case(FLEX_DIET))
            .then_some(user.dietary_preference.as_str());

        let drawn = self
            .catalog
            .sample_recipes(&safe_ids, diet, PLAN_SIZE as u32)
            .await?;

        if drawn.is_empty() {
            return Err(MealPlanError::NoEligibleRecipes);
        }

        let placements: Vec<Recipe> = drawn.iter().cycle().take(PLAN_SIZE).cloned().collect();

        let week_start = monday_of(start_date);
        let end_date = start_date + Duration::days(6);

        let mut tx = self.pool.begin().await?;

        let existing: Option<i64> =
            sqlx::query_scalar("SELECT id FROM meal_plans WHERE user_id = ?1 AND start_date = ?2")
                .bind(user.user_id)
                .bind(week_start.to_string())
                .fetch_optional(&mut *tx)
                .await?;

        let plan_id = match existing {
            Some(id) => {
                sqlx::query("UPDATE meal_plans SET end_date = ?1 WHERE id = ?2")
                    .bind(end_date.to_string())
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;
                id
            }
            None => sqlx::query(
                "INSERT INTO meal_plans (user_id, start_date, end_date) VALUES (?1, ?2, ?3)",
            )
            .bind(user.user_id)
            .bind(week_start.to_string())
            .bind(end_date.to_string())
            .execute(&mut *tx)
            .await?
            .last_insert_rowid(),
        };

        sqlx::query("DELETE FROM meal_plan_slots WHERE meal_plan_id = ?1")
            .bind(plan_id)
            .execute(&mut *tx)
            .await?;

        for (idx, recipe) in placements.iter().enumerate() {
            let date = start_date + Duration::days((idx / MEALS_PER_DAY) as i64);
            let meal_type = if idx % MEALS_PER_DAY == 0 {
                MealType::Lunch
            } else {
                MealType::Dinner
            };

            sqlx::query(
                r#"
                INSERT INTO meal_plan_slots (meal_plan_id, recipe_id, meal_type, date)
                VALUES (?1, ?2, ?3, ?4)
                "#,
            )
            .bind(plan_id)
            .bind(recipe.id)
            .bind(meal_type.to_string())
            .bind(date.to_string())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::info!(
            user_id = user.user_id,
            plan_id,
            week_start = %week_start,
            distinct_recipes = drawn.len(),
            "meal plan generated"
        );

        let mut meals = Vec::with_capacity(PLAN_SIZE);
        for (idx, recipe) in placements.into_iter().enumerate() {
            let date = start_date + Duration::days((idx / MEALS_PER_DAY) as i64);
            let allergens = self.catalog.recipe_allergens(recipe.id).await?;
            meals.push(PlannedMeal {
                recipe,
                allergens,
                date: date.to_string(),
            });
        }

        Ok(grid_from_meals(start_date, end_date, meals))
    }

    /// Load the plan for the week containing `date`, re-rendering the grid
    /// from its persisted slots. Allergens are recomputed from the catalog,
    /// not cached. Returns `Ok(None)` when no plan exists for that week.
    pub async fn current_plan(
        &self,
        user: &PlannerProfile,
        date: NaiveDate,
    ) -> Result<Option<WeekGrid>, MealPlanError> {
        let week_start = monday_of(date);

        let plan: Option<(i64, String)> = sqlx::query_as(
            "SELECT id, end_date FROM meal_plans WHERE user_id = ?1 AND start_date = ?2",
        )
        .bind(user.user_id)
        .bind(week_start.to_string())
        .fetch_optional(&self.pool)
        .await?;

        let Some((plan_id, end_date)) = plan else {
            return Ok(None);
        };

        let slots = sqlx::query_as::<_, SlotRow>(
            r#"
            SELECT recipe_id, date FROM meal_plan_slots
            WHERE meal_plan_id = ?1
            ORDER BY date, id
            "#,
        )
        .bind(plan_id)
        .fetch_all(&self.pool)
        .await?;

        let recipe_ids: Vec<i64> = slots.iter().map(|s| s.recipe_id).collect();
        let recipes: HashMap<i64, Recipe> = self
            .catalog
            .recipes_by_ids(&recipe_ids)
            .await?
            .into_iter()
            .map(|r| (r.id, r))
            .collect();

        let mut meals = Vec::with_capacity(slots.len());
        for slot in &slots {
            let recipe = recipes
                .get(&slot.recipe_id)
                .cloned()
                .ok_or(MealPlanError::Recipe(RecipeError::NotFound))?;
            let allergens = self.catalog.recipe_allergens(recipe.id).await?;
            meals.push(PlannedMeal {
                recipe,
                allergens,
                date: slot.date.clone(),
            });
        }

        let grid_start = match meals.first() {
            Some(meal) => parse_stored_date(&meal.date)?,
            None => week_start,
        };
        let grid_end = parse_stored_date(&end_date)?;

        Ok(Some(grid_from_meals(grid_start, grid_end, meals)))
    }

    /// Replace one slot's recipe with a random safe alternative, leaving the
    /// rest of the plan untouched.
    ///
    /// Candidates are filtered by allergens only: the diet filter of
    /// `generate` is intentionally not reapplied here. Product has been asked
    /// to confirm that asymmetry; until then it is preserved as-is.
    pub async fn swap(
        &self,
        current_recipe_id: i64,
        date: NaiveDate,
        user: &PlannerProfile,
    ) -> Result<WeekGrid, MealPlanError> {
        let mut candidates = self.catalog.safe_recipe_ids(&user.allergies).await?;
        candidates.retain(|id| *id != current_recipe_id);

        let new_recipe_id = *candidates
            .choose(&mut rand::rng())
            .ok_or(MealPlanError::NoSwapCandidates)?;

        let week_start = monday_of(date);

        let plan_id: i64 =
            sqlx::query_scalar("SELECT id FROM meal_plans WHERE user_id = ?1 AND start_date = ?2")
                .bind(user.user_id)
                .bind(week_start.to_string())
                .fetch_optional(&self.pool)
                .await?
                .ok_or(MealPlanError::SlotNotFound)?;

        // The slot existence check is the write itself: a slot removed by a
        // concurrent regenerate (or already rewritten by another swap)
        // no longer matches the predicate and the update reports zero rows.
        let updated = sqlx::query(
            r#"
            UPDATE meal_plan_slots SET recipe_id = ?1
            WHERE id = (
                SELECT id FROM meal_plan_slots
                WHERE meal_plan_id = ?2 AND recipe_id = ?3 AND date = ?4
                ORDER BY id
                LIMIT 1
            )
            "#,
        )
        .bind(new_recipe_id)
        .bind(plan_id)
        .bind(current_recipe_id)
        .bind(date.to_string())
        .execute(&self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(MealPlanError::SlotNotFound);
        }

        tracing::info!(
            user_id = user.user_id,
            plan_id,
            old_recipe_id = current_recipe_id,
            new_recipe_id,
            "meal slot swapped"
        );

        self.current_plan(user, date)
            .await?
            .ok_or(MealPlanError::SlotNotFound)
    }
}

/// Plan and slot dates are stored as ISO-8601 TEXT; a row that fails to
/// parse is corrupt and surfaces as an error rather than a quietly
/// substituted date.
fn parse_stored_date(raw: &str) -> Result<NaiveDate, MealPlanError> {
    raw.parse::<NaiveDate>()
        .map_err(|e| MealPlanError::Database(sqlx::Error::Decode(Box::new(e))))
}

fn grid_from_meals(start_date: NaiveDate, end_date: NaiveDate, meals: Vec<PlannedMeal>) -> WeekGrid {
    let mut days = Vec::with_capacity(meals.len() / MEALS_PER_DAY);
    let mut iter = meals.into_iter();

    while let (Some(lunch), Some(dinner)) = (iter.next(), iter.next()) {
        days.push(DayPlan {
            date: lunch.date.clone(),
            lunch,
            dinner,
        });
    }

    WeekGrid {
        start_date: start_date.to_string(),
        end_date: end_date.to_string(),
        days,
    }
}
