//! Meal plan calendar model
//!
//! A recipe scheduled for a date and meal slot.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::RecipeSnapshot;

/// Meal type enum
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
    Unspecified,
}

impl MealType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MealType::Breakfast => "breakfast",
            MealType::Lunch => "lunch",
            MealType::Dinner => "dinner",
            MealType::Snack => "snack",
            MealType::Unspecified => "unspecified",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "breakfast" | "pequeno-almoço" => MealType::Breakfast,
            "lunch" | "almoço" => MealType::Lunch,
            "dinner" | "jantar" => MealType::Dinner,
            "snack" | "lanche" => MealType::Snack,
            _ => MealType::Unspecified,
        }
    }
}

/// A recipe planned for a given day
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannedMeal {
    pub date: NaiveDate,
    pub meal_type: MealType,
    pub recipe: RecipeSnapshot,
}

impl PlannedMeal {
    /// Whether the meal falls within `start..=end`
    pub fn in_range(&self, start: NaiveDate, end: NaiveDate) -> bool {
        start <= self.date && self.date <= end
    }
}

/// Parse an ISO date (YYYY-MM-DD)
pub fn parse_date(s: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
}
