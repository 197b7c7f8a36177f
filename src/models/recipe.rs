//! Recipe model
//!
//! A recipe as handed over by the recipe service: name, portion text and raw
//! ingredient lines.

use serde::{Deserialize, Serialize};

use crate::quantity::{normalize, NormalizedQuantity};
use crate::shopping::IngredientQuantityEntry;

/// One ingredient line as written by the recipe author
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngredientLine {
    pub name: String,
    /// Raw quantity text, e.g. "2 c. de sopa"
    pub quantity: String,
}

/// Recipe contents needed for normalization and shopping lists
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeSnapshot {
    pub name: String,
    /// Portion text, e.g. "4 pessoas"
    pub portion: Option<String>,
    pub ingredients: Vec<IngredientLine>,
}

/// Normalization outcome for one ingredient line
#[derive(Debug, Clone, Serialize)]
pub struct NormalizedLine {
    pub name: String,
    pub raw: String,
    pub normalized: Option<NormalizedQuantity>,
    pub error: Option<String>,
}

/// Normalization outcome for a whole recipe
#[derive(Debug, Clone, Serialize)]
pub struct RecipeNormalization {
    pub recipe_name: String,
    pub portion: Option<String>,
    pub lines: Vec<NormalizedLine>,
    pub normalized_count: usize,
    pub failed_count: usize,
}

impl RecipeSnapshot {
    /// Normalize every ingredient line.
    ///
    /// A line that fails keeps `normalized: None` and carries the error text;
    /// the remaining lines are still processed.
    pub fn normalize_ingredients(&self) -> RecipeNormalization {
        let lines: Vec<NormalizedLine> = self
            .ingredients
            .iter()
            .map(|line| match normalize(&line.quantity) {
                Ok(quantity) => NormalizedLine {
                    name: line.name.clone(),
                    raw: line.quantity.clone(),
                    normalized: Some(quantity),
                    error: None,
                },
                Err(e) => {
                    tracing::warn!(
                        recipe = %self.name,
                        ingredient = %line.name,
                        error = %e,
                        "failed to normalize ingredient quantity"
                    );
                    NormalizedLine {
                        name: line.name.clone(),
                        raw: line.quantity.clone(),
                        normalized: None,
                        error: Some(e.to_string()),
                    }
                }
            })
            .collect();

        let normalized_count = lines.iter().filter(|l| l.normalized.is_some()).count();

        RecipeNormalization {
            recipe_name: self.name.clone(),
            portion: self.portion.clone(),
            failed_count: lines.len() - normalized_count,
            normalized_count,
            lines,
        }
    }
}

impl RecipeNormalization {
    /// Aggregation entries for the lines that normalized
    pub fn entries(&self) -> Vec<IngredientQuantityEntry> {
        self.lines
            .iter()
            .filter_map(|line| {
                let quantity = line.normalized.clone()?;
                Some(IngredientQuantityEntry::new(
                    line.name.clone(),
                    quantity,
                    self.portion.as_deref(),
                ))
            })
            .collect()
    }
}
