//! Quantity MCP Tools
//!
//! Tools for normalizing single quantities and whole recipe ingredient lists.

use serde::Serialize;

use crate::models::{RecipeNormalization, RecipeSnapshot};
use crate::quantity::{normalize, NormalizedQuantity};

/// Response for normalize_quantity
#[derive(Debug, Serialize)]
pub struct NormalizeQuantityResponse {
    pub raw: String,
    pub normalized: Option<NormalizedQuantity>,
    pub error: Option<String>,
}

/// Normalize one quantity string
pub fn normalize_quantity(raw: &str) -> Result<NormalizeQuantityResponse, String> {
    if raw.trim().is_empty() {
        return Err("Quantity cannot be empty".to_string());
    }

    let response = match normalize(raw) {
        Ok(quantity) => NormalizeQuantityResponse {
            raw: raw.to_string(),
            normalized: Some(quantity),
            error: None,
        },
        Err(e) => NormalizeQuantityResponse {
            raw: raw.to_string(),
            normalized: None,
            error: Some(e.to_string()),
        },
    };

    Ok(response)
}

/// Normalize every ingredient line of a recipe
pub fn normalize_recipe_ingredients(recipe: RecipeSnapshot) -> Result<RecipeNormalization, String> {
    if recipe.name.trim().is_empty() {
        return Err("Recipe name cannot be empty".to_string());
    }
    if recipe.ingredients.is_empty() {
        return Err("Recipe has no ingredients".to_string());
    }

    Ok(recipe.normalize_ingredients())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::IngredientLine;
    use crate::quantity::Unit;

    #[test]
    fn test_normalize_quantity() {
        let response = normalize_quantity("1 cháv.").unwrap();
        let quantity = response.normalized.unwrap();
        assert_eq!(quantity.unit, Unit::Milliliters);
        assert!(response.error.is_none());

        let response = normalize_quantity("uns quantos").unwrap();
        assert!(response.normalized.is_none());
        assert!(response.error.unwrap().contains("uns"));

        assert!(normalize_quantity("  ").is_err());
    }

    #[test]
    fn test_normalize_recipe_validation() {
        let empty = RecipeSnapshot {
            name: "Caldo verde".to_string(),
            portion: None,
            ingredients: Vec::new(),
        };
        assert!(normalize_recipe_ingredients(empty).is_err());

        let recipe = RecipeSnapshot {
            name: "Caldo verde".to_string(),
            portion: Some("4 pessoas".to_string()),
            ingredients: vec![IngredientLine {
                name: "couve".to_string(),
                quantity: "200 g".to_string(),
            }],
        };
        let result = normalize_recipe_ingredients(recipe).unwrap();
        assert_eq!(result.normalized_count, 1);
    }
}
