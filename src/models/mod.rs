//! Data models
//!
//! Recipes and meal plans as received from callers.

mod calendar;
mod recipe;

pub use calendar::{parse_date, MealType, PlannedMeal};
pub use recipe::{IngredientLine, NormalizedLine, RecipeNormalization, RecipeSnapshot};
