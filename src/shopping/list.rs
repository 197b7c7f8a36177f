//! Shopping list building
//!
//! Collects the recipes planned within a date range, normalizes their
//! ingredient lines and sums them into one list.

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use super::aggregator::{
    aggregate_with_options, AggregatedIngredient, AggregationWarning, AggregatorOptions,
    IngredientQuantityEntry,
};
use crate::models::{MealType, PlannedMeal};

/// Shopping list error types
#[derive(Debug, Error)]
pub enum ShoppingListError {
    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },
}

/// An ingredient line left out of the list because it could not be normalized
#[derive(Debug, Clone, Serialize)]
pub struct SkippedLine {
    pub date: NaiveDate,
    pub meal_type: MealType,
    pub recipe_name: String,
    pub ingredient_name: String,
    pub raw_quantity: String,
    pub reason: String,
}

/// Aggregated ingredients for a date range
#[derive(Debug, Clone, Serialize)]
pub struct ShoppingList {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub target_portion: Option<f64>,
    pub meal_count: usize,
    pub items: Vec<AggregatedIngredient>,
    pub skipped: Vec<SkippedLine>,
    pub warnings: Vec<AggregationWarning>,
}

/// Build the shopping list for meals planned between `start` and `end` (inclusive)
pub fn build_shopping_list(
    meals: &[PlannedMeal],
    start: NaiveDate,
    end: NaiveDate,
    target_portion: Option<f64>,
    options: AggregatorOptions,
) -> Result<ShoppingList, ShoppingListError> {
    if start > end {
        return Err(ShoppingListError::InvalidRange { start, end });
    }

    let mut entries: Vec<IngredientQuantityEntry> = Vec::new();
    let mut skipped = Vec::new();
    let mut meal_count = 0;

    for meal in meals.iter().filter(|m| m.in_range(start, end)) {
        meal_count += 1;

        let normalization = meal.recipe.normalize_ingredients();
        for line in normalization.lines.iter().filter(|l| l.normalized.is_none()) {
            skipped.push(SkippedLine {
                date: meal.date,
                meal_type: meal.meal_type,
                recipe_name: meal.recipe.name.clone(),
                ingredient_name: line.name.clone(),
                raw_quantity: line.raw.clone(),
                reason: line.error.clone().unwrap_or_default(),
            });
        }
        entries.extend(normalization.entries());
    }

    let aggregation = aggregate_with_options(&entries, target_portion, options);

    tracing::info!(
        %start,
        %end,
        meals = meal_count,
        items = aggregation.ingredients.len(),
        skipped = skipped.len(),
        "built shopping list"
    );

    Ok(ShoppingList {
        start_date: start,
        end_date: end,
        target_portion,
        meal_count,
        items: aggregation.ingredients,
        skipped,
        warnings: aggregation.warnings,
    })
}

/// Render a shopping list as markdown
pub fn render_markdown(list: &ShoppingList, title: &str) -> String {
    let mut markdown = String::new();

    markdown.push_str(&format!("# {}\n\n", title));
    markdown.push_str(&format!(
        "**Period:** {} to {}\n\n",
        list.start_date.format("%Y-%m-%d"),
        list.end_date.format("%Y-%m-%d")
    ));
    if let Some(portion) = list.target_portion {
        markdown.push_str(&format!("**Servings:** {}\n\n", format_amount(portion)));
    }
    markdown.push_str(&format!("**Meals planned:** {}\n\n", list.meal_count));
    markdown.push_str("---\n\n");

    if list.items.is_empty() {
        markdown.push_str("_Nothing to buy._\n");
    }

    for item in &list.items {
        markdown.push_str(&format!(
            "- **{}:** {} {}",
            item.name,
            format_amount(item.quantity),
            item.unit
        ));
        if let (Some(extra), Some(unit)) = (item.extra_quantity, &item.extra_unit) {
            markdown.push_str(&format!(" (+ {} {})", format_amount(extra), unit));
        }
        markdown.push('\n');
    }

    if !list.skipped.is_empty() {
        markdown.push_str("\n## Not included\n\n");
        for line in &list.skipped {
            markdown.push_str(&format!(
                "- {} \"{}\" ({}, {} {})\n",
                line.ingredient_name,
                line.raw_quantity,
                line.recipe_name,
                line.date.format("%Y-%m-%d"),
                line.meal_type.as_str()
            ));
        }
    }

    markdown
}

/// Two decimals at most, without trailing zeros
fn format_amount(value: f64) -> String {
    let text = format!("{:.2}", value);
    match text.trim_end_matches('0').trim_end_matches('.') {
        "" | "-" => "0".to_string(),
        trimmed => trimmed.to_string(),
    }
}
