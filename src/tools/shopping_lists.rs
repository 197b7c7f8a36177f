//! Shopping List MCP Tools
//!
//! Tools for building and exporting shopping lists from a meal plan.

use serde::Serialize;

use crate::config::Config;
use crate::models::{parse_date, MealType, PlannedMeal, RecipeSnapshot};
use crate::shopping::{self, ShoppingList};

/// A planned meal as received from the caller, before date validation
#[derive(Debug, Clone)]
pub struct MealPlanEntry {
    pub date: String,
    pub meal_type: MealType,
    pub recipe: RecipeSnapshot,
}

/// Response for export_shopping_list_markdown
#[derive(Debug, Serialize)]
pub struct ExportShoppingListResponse {
    pub markdown: String,
    pub item_count: usize,
    pub skipped_count: usize,
    pub generated_at: String,
}

/// Build a shopping list for the meals planned between two dates
pub fn build_shopping_list(
    config: &Config,
    start_date: &str,
    end_date: &str,
    target_portion: Option<f64>,
    meals: Vec<MealPlanEntry>,
) -> Result<ShoppingList, String> {
    let start = parse_date(start_date)
        .map_err(|e| format!("Invalid start_date '{}': {}", start_date, e))?;
    let end = parse_date(end_date)
        .map_err(|e| format!("Invalid end_date '{}': {}", end_date, e))?;

    if let Some(portion) = target_portion {
        if !portion.is_finite() || portion < 0.0 {
            return Err("target_portion must be a non-negative number".to_string());
        }
    }

    let planned = meals
        .into_iter()
        .map(|meal| {
            let date = parse_date(&meal.date).map_err(|e| {
                format!("Invalid date '{}' for recipe '{}': {}", meal.date, meal.recipe.name, e)
            })?;
            Ok(PlannedMeal {
                date,
                meal_type: meal.meal_type,
                recipe: meal.recipe,
            })
        })
        .collect::<Result<Vec<_>, String>>()?;

    shopping::build_shopping_list(
        &planned,
        start,
        end,
        config.target_portion(target_portion),
        config.aggregator_options(),
    )
    .map_err(|e| e.to_string())
}

/// Build a shopping list and render it as markdown
pub fn export_shopping_list_markdown(
    config: &Config,
    title: &str,
    start_date: &str,
    end_date: &str,
    target_portion: Option<f64>,
    meals: Vec<MealPlanEntry>,
) -> Result<ExportShoppingListResponse, String> {
    let list = build_shopping_list(config, start_date, end_date, target_portion, meals)?;

    let title = if title.trim().is_empty() { "Shopping List" } else { title.trim() };
    let markdown = shopping::render_markdown(&list, title);

    Ok(ExportShoppingListResponse {
        markdown,
        item_count: list.items.len(),
        skipped_count: list.skipped.len(),
        generated_at: chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    })
}
