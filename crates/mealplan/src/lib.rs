mod engine;
mod error;
mod grid;

pub use engine::{MealPlanEngine, PlannerProfile};
pub use error::MealPlanError;
pub use grid::{monday_of, DayPlan, MealType, PlannedMeal, WeekGrid, MEALS_PER_DAY, PLAN_DAYS, PLAN_SIZE};
