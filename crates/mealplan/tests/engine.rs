//! Engine tests against an in-memory SQLite catalog and plan store.

use chrono::{Duration, NaiveDate};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::collections::HashSet;

use platewise_mealplan::{MealPlanEngine, MealPlanError, PlannerProfile, PLAN_DAYS, PLAN_SIZE};
use platewise_recipe::{save_ingredient, save_recipe, NewIngredient, NewRecipe, SqliteCatalog};

async fn create_test_db() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create test database");

    sqlx::migrate!("../../migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    // Plans reference users(id); seed the account the test profiles use.
    sqlx::query(
        r#"
        INSERT INTO users (email, password_hash, dietary_preference, allergies, token_count, created_at)
        VALUES ('planner@example.com', 'x', 'flex', '[]', 10, '2024-01-01T00:00:00Z')
        "#,
    )
    .execute(&pool)
    .await
    .expect("Failed to seed test user");

    pool
}

fn engine(pool: &SqlitePool) -> MealPlanEngine<SqliteCatalog> {
    MealPlanEngine::new(SqliteCatalog::new(pool.clone()), pool.clone())
}

fn profile(diet: &str, allergies: &[&str]) -> PlannerProfile {
    PlannerProfile {
        user_id: 1,
        dietary_preference: diet.to_string(),
        allergies: allergies.iter().map(|a| a.to_string()).collect(),
    }
}

fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()
}

fn recipe_payload(title: &str, diet: &str) -> NewRecipe {
    NewRecipe {
        title: title.to_string(),
        description: None,
        diet: diet.to_string(),
        servings: 2,
        prep_time: 10,
        cook_time: 20,
        calories: 500,
        carbohydrates: 40,
        protein: 30,
        fat: 15,
        instructions: vec!["Cook it".to_string()],
        breakfast: false,
    }
}

/// Seed a recipe with one ingredient carrying the given allergen tag.
async fn seed_recipe(pool: &SqlitePool, title: &str, diet: &str, allergen: Option<&str>) -> i64 {
    let id = save_recipe(pool, &recipe_payload(title, diet)).await.unwrap();

    save_ingredient(
        pool,
        id,
        &NewIngredient {
            name: format!("{} base", title),
            category: Some("produce".to_string()),
            allergen: allergen.map(|a| a.to_string()),
            quantity: 1.0,
            unit: Some("piece".to_string()),
        },
    )
    .await
    .unwrap();

    id
}

async fn seed_catalog(pool: &SqlitePool, count: usize, diet: &str) -> Vec<i64> {
    let mut ids = Vec::new();
    for i in 0..count {
        ids.push(seed_recipe(pool, &format!("{diet} recipe {i}"), diet, None).await);
    }
    ids
}

async fn slot_recipe_ids(pool: &SqlitePool) -> Vec<i64> {
    sqlx::query_scalar("SELECT recipe_id FROM meal_plan_slots ORDER BY date, id")
        .fetch_all(pool)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_generate_produces_full_grid() {
    let pool = create_test_db().await;
    seed_catalog(&pool, 20, "flex").await;

    let grid = engine(&pool)
        .generate(&profile("flex", &[]), monday())
        .await
        .unwrap();

    assert_eq!(grid.days.len(), PLAN_DAYS);
    for (i, day) in grid.days.iter().enumerate() {
        let expected = (monday() + Duration::days(i as i64)).to_string();
        assert_eq!(day.date, expected);
        assert_eq!(day.lunch.date, expected);
        assert_eq!(day.dinner.date, expected);
    }

    assert_eq!(slot_recipe_ids(&pool).await.len(), PLAN_SIZE);
}

#[tokio::test]
async fn test_generate_excludes_allergens_case_insensitively() {
    let pool = create_test_db().await;
    let safe = seed_catalog(&pool, 5, "flex").await;
    let nutty = seed_recipe(&pool, "peanut stew", "flex", Some("Peanuts")).await;

    let user = profile("flex", &["PEANUTS"]);
    let grid = engine(&pool).generate(&user, monday()).await.unwrap();

    for day in &grid.days {
        for meal in [&day.lunch, &day.dinner] {
            assert_ne!(meal.recipe.id, nutty);
            assert!(safe.contains(&meal.recipe.id));
            assert!(meal.allergens.is_empty());
        }
    }
}

#[tokio::test]
async fn test_generate_applies_diet_filter_unless_flex() {
    let pool = create_test_db().await;
    seed_catalog(&pool, 6, "vegan").await;
    seed_catalog(&pool, 6, "keto").await;

    let grid = engine(&pool)
        .generate(&profile("vegan", &[]), monday())
        .await
        .unwrap();

    for day in &grid.days {
        assert_eq!(day.lunch.recipe.diet, "vegan");
        assert_eq!(day.dinner.recipe.diet, "vegan");
    }

    // "Flex" is a case-insensitive sentinel: both diets may appear.
    let grid = engine(&pool)
        .generate(&profile("Flex", &[]), monday())
        .await
        .unwrap();
    assert_eq!(grid.days.len(), PLAN_DAYS);
}

#[tokio::test]
async fn test_sparse_catalog_repeats_to_full_grid() {
    let pool = create_test_db().await;
    let ids: HashSet<i64> = seed_catalog(&pool, 3, "flex").await.into_iter().collect();

    let grid = engine(&pool)
        .generate(&profile("flex", &[]), monday())
        .await
        .unwrap();

    let mut placements = 0;
    for day in &grid.days {
        for meal in [&day.lunch, &day.dinner] {
            assert!(ids.contains(&meal.recipe.id));
            placements += 1;
        }
    }
    assert_eq!(placements, PLAN_SIZE);
}

#[tokio::test]
async fn test_empty_eligible_set_fails_without_writing() {
    let pool = create_test_db().await;
    seed_recipe(&pool, "shrimp pad thai", "flex", Some("shellfish")).await;

    let user = profile("flex", &["shellfish"]);
    let result = engine(&pool).generate(&user, monday()).await;

    assert!(matches!(result, Err(MealPlanError::NoEligibleRecipes)));

    let plans: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM meal_plans")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(plans, 0);
}

#[tokio::test]
async fn test_current_plan_round_trips_generated_slots() {
    let pool = create_test_db().await;
    seed_catalog(&pool, 20, "flex").await;

    let user = profile("flex", &[]);
    let eng = engine(&pool);
    let generated = eng.generate(&user, monday()).await.unwrap();

    let reread = eng.current_plan(&user, monday()).await.unwrap().unwrap();

    let flatten = |grid: &platewise_mealplan::WeekGrid| -> Vec<i64> {
        grid.days
            .iter()
            .flat_map(|d| [d.lunch.recipe.id, d.dinner.recipe.id])
            .collect()
    };

    assert_eq!(flatten(&generated), flatten(&reread));
    assert_eq!(flatten(&reread), slot_recipe_ids(&pool).await);
}

#[tokio::test]
async fn test_current_plan_absent_is_none() {
    let pool = create_test_db().await;
    seed_catalog(&pool, 5, "flex").await;

    let plan = engine(&pool)
        .current_plan(&profile("flex", &[]), monday())
        .await
        .unwrap();

    assert!(plan.is_none());
}

#[tokio::test]
async fn test_non_monday_start_keys_plan_by_week() {
    let pool = create_test_db().await;
    seed_catalog(&pool, 20, "flex").await;

    let wednesday = monday() + Duration::days(2);
    let user = profile("flex", &[]);
    let eng = engine(&pool);

    eng.generate(&user, wednesday).await.unwrap();

    // Any date in the same week resolves the same plan.
    let plan = eng.current_plan(&user, monday()).await.unwrap().unwrap();
    assert_eq!(plan.days[0].date, wednesday.to_string());
    assert_eq!(
        plan.days.last().unwrap().date,
        (wednesday + Duration::days(6)).to_string()
    );
}

#[tokio::test]
async fn test_regenerate_replaces_all_slots() {
    let pool = create_test_db().await;
    seed_catalog(&pool, 20, "flex").await;

    let user = profile("flex", &[]);
    let eng = engine(&pool);

    eng.generate(&user, monday()).await.unwrap();
    let first_slot_ids: Vec<i64> = sqlx::query_scalar("SELECT id FROM meal_plan_slots ORDER BY id")
        .fetch_all(&pool)
        .await
        .unwrap();

    eng.generate(&user, monday()).await.unwrap();
    let second_slot_ids: Vec<i64> = sqlx::query_scalar("SELECT id FROM meal_plan_slots ORDER BY id")
        .fetch_all(&pool)
        .await
        .unwrap();

    assert_eq!(second_slot_ids.len(), PLAN_SIZE);
    for id in &first_slot_ids {
        assert!(!second_slot_ids.contains(id), "stale slot survived");
    }

    // Still a single plan row for the week.
    let plans: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM meal_plans")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(plans, 1);
}

#[tokio::test]
async fn test_swap_replaces_only_target_slot() {
    let pool = create_test_db().await;
    seed_catalog(&pool, 20, "flex").await;

    let user = profile("flex", &[]);
    let eng = engine(&pool);
    let grid = eng.generate(&user, monday()).await.unwrap();

    let target = grid.days[0].lunch.recipe.id;
    let before = slot_recipe_ids(&pool).await;

    let swapped = eng.swap(target, monday(), &user).await.unwrap();

    assert_ne!(swapped.days[0].lunch.recipe.id, target);

    let after = slot_recipe_ids(&pool).await;
    assert_eq!(before.len(), after.len());
    let changed = before
        .iter()
        .zip(after.iter())
        .filter(|(b, a)| b != a)
        .count();
    assert_eq!(changed, 1, "swap must touch exactly one slot");

    // Swapping the new occupant again succeeds: availability is idempotent
    // even though the outcome is random.
    let new_occupant = swapped.days[0].lunch.recipe.id;
    let reswapped = eng.swap(new_occupant, monday(), &user).await.unwrap();
    assert_ne!(reswapped.days[0].lunch.recipe.id, new_occupant);
}

#[tokio::test]
async fn test_swap_without_candidates_leaves_slot_unchanged() {
    let pool = create_test_db().await;
    // Exactly one safe recipe; it ends up in every slot.
    seed_catalog(&pool, 1, "flex").await;

    let user = profile("flex", &[]);
    let eng = engine(&pool);
    let grid = eng.generate(&user, monday()).await.unwrap();
    let only = grid.days[0].lunch.recipe.id;

    let before = slot_recipe_ids(&pool).await;
    let result = eng.swap(only, monday(), &user).await;

    assert!(matches!(result, Err(MealPlanError::NoSwapCandidates)));
    assert_eq!(slot_recipe_ids(&pool).await, before);
}

#[tokio::test]
async fn test_swap_missing_slot_is_not_found() {
    let pool = create_test_db().await;
    seed_catalog(&pool, 5, "flex").await;

    let user = profile("flex", &[]);
    let eng = engine(&pool);
    eng.generate(&user, monday()).await.unwrap();

    // A recipe that is in the catalog but not planned on that date.
    let unplanned = seed_recipe(&pool, "unplanned", "flex", None).await;
    let result = eng.swap(unplanned, monday() + Duration::days(30), &user).await;

    assert!(matches!(result, Err(MealPlanError::SlotNotFound)));
}

#[tokio::test]
async fn test_swap_fails_when_slot_is_gone() {
    let pool = create_test_db().await;
    seed_catalog(&pool, 5, "flex").await;

    let user = profile("flex", &[]);
    let eng = engine(&pool);
    let grid = eng.generate(&user, monday()).await.unwrap();
    let target = grid.days[0].lunch.recipe.id;

    // A regenerate racing the swap removes the slot before the write lands;
    // the write must then report the miss instead of succeeding silently.
    sqlx::query("DELETE FROM meal_plan_slots WHERE recipe_id = ?1 AND date = ?2")
        .bind(target)
        .bind(monday().to_string())
        .execute(&pool)
        .await
        .unwrap();

    let result = eng.swap(target, monday(), &user).await;
    assert!(matches!(result, Err(MealPlanError::SlotNotFound)));
}

#[tokio::test]
async fn test_current_plan_surfaces_corrupt_dates() {
    let pool = create_test_db().await;
    seed_catalog(&pool, 5, "flex").await;

    let user = profile("flex", &[]);
    let eng = engine(&pool);
    eng.generate(&user, monday()).await.unwrap();

    sqlx::query("UPDATE meal_plans SET end_date = 'not-a-date'")
        .execute(&pool)
        .await
        .unwrap();

    let result = eng.current_plan(&user, monday()).await;
    assert!(matches!(result, Err(MealPlanError::Database(_))));
}

#[tokio::test]
async fn test_swap_ignores_diet_filter() {
    let pool = create_test_db().await;
    // One vegan recipe fills the vegan user's plan; the only swap candidate
    // is keto. Swap filters by allergens only, so it must succeed.
    seed_catalog(&pool, 1, "vegan").await;
    let keto = seed_recipe(&pool, "keto steak", "keto", None).await;

    let user = profile("vegan", &[]);
    let eng = engine(&pool);
    let grid = eng.generate(&user, monday()).await.unwrap();
    let vegan_id = grid.days[0].lunch.recipe.id;

    let swapped = eng.swap(vegan_id, monday(), &user).await.unwrap();
    assert_eq!(swapped.days[0].lunch.recipe.id, keto);
}

#[tokio::test]
async fn test_allergen_lists_are_sorted_and_fresh() {
    let pool = create_test_db().await;
    let id = save_recipe(&pool, &recipe_payload("loaded omelette", "flex"))
        .await
        .unwrap();
    for (name, allergen) in [("eggs", Some("eggs")), ("milk", Some("dairy")), ("salt", None)] {
        save_ingredient(
            &pool,
            id,
            &NewIngredient {
                name: name.to_string(),
                category: None,
                allergen: allergen.map(|a| a.to_string()),
                quantity: 1.0,
                unit: None,
            },
        )
        .await
        .unwrap();
    }

    let user = profile("flex", &[]);
    let eng = engine(&pool);
    eng.generate(&user, monday()).await.unwrap();

    let plan = eng.current_plan(&user, monday()).await.unwrap().unwrap();
    assert_eq!(plan.days[0].lunch.allergens, vec!["dairy", "eggs"]);
}

mod fixed_catalog {
    //! Engine behavior with a deterministic catalog substituted for SQL.

    use super::*;
    use async_trait::async_trait;
    use platewise_recipe::{Catalog, Recipe, RecipeResult};
    use sqlx::types::Json;

    struct FixedCatalog {
        recipes: Vec<Recipe>,
    }

    fn fixed_recipe(id: i64, diet: &str) -> Recipe {
        Recipe {
            id,
            title: format!("fixed {id}"),
            description: None,
            diet: diet.to_string(),
            servings: 2,
            prep_time: 5,
            cook_time: 15,
            calories: 400,
            carbohydrates: 30,
            protein: 25,
            fat: 10,
            instructions: Json(vec!["Cook".to_string()]),
            breakfast: false,
        }
    }

    #[async_trait]
    impl Catalog for FixedCatalog {
        async fn safe_recipe_ids(&self, _allergies: &[String]) -> RecipeResult<Vec<i64>> {
            Ok(self.recipes.iter().map(|r| r.id).collect())
        }

        // Deterministic "sample": first `limit` in declaration order.
        async fn sample_recipes(
            &self,
            ids: &[i64],
            diet: Option<&str>,
            limit: u32,
        ) -> RecipeResult<Vec<Recipe>> {
            Ok(self
                .recipes
                .iter()
                .filter(|r| ids.contains(&r.id))
                .filter(|r| diet.is_none_or(|d| r.diet == d))
                .take(limit as usize)
                .cloned()
                .collect())
        }

        async fn recipe_allergens(&self, _recipe_id: i64) -> RecipeResult<Vec<String>> {
            Ok(Vec::new())
        }

        async fn recipes_by_ids(&self, ids: &[i64]) -> RecipeResult<Vec<Recipe>> {
            Ok(self
                .recipes
                .iter()
                .filter(|r| ids.contains(&r.id))
                .cloned()
                .collect())
        }
    }

    #[tokio::test]
    async fn test_draw_order_maps_to_dates_and_meal_types() {
        let pool = create_test_db().await;

        // Slot rows reference recipes(id); mirror the fixed catalog in SQL.
        for id in 1..=3 {
            save_recipe(&pool, &recipe_payload(&format!("fixed {id}"), "flex"))
                .await
                .unwrap();
        }

        let catalog = FixedCatalog {
            recipes: vec![
                fixed_recipe(1, "flex"),
                fixed_recipe(2, "flex"),
                fixed_recipe(3, "flex"),
            ],
        };
        let eng = MealPlanEngine::new(catalog, pool.clone());

        let grid = eng.generate(&profile("flex", &[]), monday()).await.unwrap();

        // Three recipes cycled over 14 placements: 1,2,3,1,2,3,...
        let expected: Vec<i64> = [1i64, 2, 3].iter().cycle().take(PLAN_SIZE).copied().collect();
        let placed: Vec<i64> = grid
            .days
            .iter()
            .flat_map(|d| [d.lunch.recipe.id, d.dinner.recipe.id])
            .collect();

        assert_eq!(placed, expected);

        let meal_types: Vec<String> =
            sqlx::query_scalar("SELECT meal_type FROM meal_plan_slots ORDER BY date, id")
                .fetch_all(&pool)
                .await
                .unwrap();
        assert_eq!(meal_types.len(), PLAN_SIZE);
        for pair in meal_types.chunks(2) {
            assert_eq!(pair, ["lunch", "dinner"]);
        }
    }
}
