//! Shopping list module
//!
//! Ingredient aggregation and shopping list building.

pub mod aggregator;
pub mod list;

pub use aggregator::{
    aggregate, aggregate_with_options, parse_portion, portion_ratio, AggregatedIngredient,
    Aggregation, AggregationWarning, AggregatorOptions, IngredientQuantityEntry,
};
pub use list::{build_shopping_list, render_markdown, ShoppingList, ShoppingListError, SkippedLine};
