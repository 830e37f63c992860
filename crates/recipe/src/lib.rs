mod catalog;
mod error;
mod store;
mod types;

pub use catalog::{Catalog, SqliteCatalog};
pub use error::{RecipeError, RecipeResult};
pub use store::{
    list_recipes_by_diet, recipe_detail, save_ingredient, save_recipe, NewIngredient, NewRecipe,
};
pub use types::{IngredientLine, Recipe, RecipeDetail, FLEX_DIET};
