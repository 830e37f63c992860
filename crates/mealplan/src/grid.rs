use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;
use strum::{Display, EnumString};

use platewise_recipe::Recipe;

/// Days covered by one plan window.
pub const PLAN_DAYS: usize = 7;

/// Meals placed per day: lunch and dinner.
pub const MEALS_PER_DAY: usize = 2;

/// Recipe placements in a complete plan.
pub const PLAN_SIZE: usize = PLAN_DAYS * MEALS_PER_DAY;

/// Monday of the week containing `date`. Plans are keyed by this date.
pub fn monday_of(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum MealType {
    Lunch,
    Dinner,
}

/// One placed recipe: the recipe record augmented with its computed allergen
/// list (alphabetical) and the concrete date it is planned for.
#[derive(Debug, Clone, Serialize)]
pub struct PlannedMeal {
    #[serde(flatten)]
    pub recipe: Recipe,
    pub allergens: Vec<String>,
    pub date: String,
}

/// One day of the grid: an ordered lunch/dinner pair.
#[derive(Debug, Clone, Serialize)]
pub struct DayPlan {
    pub date: String,
    pub lunch: PlannedMeal,
    pub dinner: PlannedMeal,
}

/// The 7-day x 2-meal grid returned by every engine operation.
#[derive(Debug, Clone, Serialize)]
pub struct WeekGrid {
    pub start_date: String,
    pub end_date: String,
    pub days: Vec<DayPlan>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monday_of_maps_whole_week_to_monday() {
        let monday = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();

        for offset in 0..7 {
            let day = monday + Duration::days(offset);
            assert_eq!(monday_of(day), monday);
        }

        assert_eq!(monday_of(monday - Duration::days(1)), monday - Duration::days(7));
    }

    #[test]
    fn test_meal_type_round_trip() {
        assert_eq!(MealType::Lunch.to_string(), "lunch");
        assert_eq!("dinner".parse::<MealType>().unwrap(), MealType::Dinner);
    }
}
