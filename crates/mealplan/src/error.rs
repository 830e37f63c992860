use thiserror::Error;

/// Failures of the meal-plan engine.
///
/// An absent plan is not in this taxonomy: reads return `Ok(None)` and leave
/// the decision to regenerate to the caller.
#[derive(Debug, Error)]
pub enum MealPlanError {
    /// The allergen/diet filter left nothing to draw from at generation time.
    #[error("No eligible recipes for this diet and allergy profile")]
    NoEligibleRecipes,

    /// Swap has no recipe to swap to after excluding the current one.
    #[error("No swap candidates available")]
    NoSwapCandidates,

    /// The swap target (plan or slot) does not exist.
    #[error("Meal plan slot not found")]
    SlotNotFound,

    #[error(transparent)]
    Recipe(#[from] platewise_recipe::RecipeError),

    #[error("Database error")]
    Database(#[from] sqlx::Error),
}
