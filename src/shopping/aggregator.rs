//! Ingredient aggregation
//!
//! Sums normalized ingredient quantities across recipes, scaled from each
//! recipe's portion count to the requested number of servings.

use std::collections::HashMap;

use serde::Serialize;

use crate::quantity::{NormalizedQuantity, Unit};

/// One ingredient line of one recipe, ready for aggregation
#[derive(Debug, Clone)]
pub struct IngredientQuantityEntry {
    /// Ingredient name, matched exactly (case-sensitive)
    pub ingredient_name: String,
    pub quantity: Option<NormalizedQuantity>,
    /// Portion text of the owning recipe, e.g. "4 pessoas"
    pub recipe_portion: Option<String>,
}

impl IngredientQuantityEntry {
    pub fn new(
        ingredient_name: impl Into<String>,
        quantity: NormalizedQuantity,
        recipe_portion: Option<&str>,
    ) -> Self {
        Self {
            ingredient_name: ingredient_name.into(),
            quantity: Some(quantity),
            recipe_portion: recipe_portion.map(str::to_string),
        }
    }
}

/// Running total for one ingredient name
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedIngredient {
    pub name: String,
    pub quantity: f64,
    pub unit: Unit,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_quantity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_unit: Option<Unit>,
}

/// Non-fatal problems found while aggregating
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AggregationWarning {
    /// Entry skipped: no name or no normalized quantity
    MissingData {
        index: usize,
        ingredient_name: String,
        reason: String,
    },
    /// Same name seen with a different unit; the quantities were still summed
    UnitMismatch {
        ingredient_name: String,
        expected: Unit,
        found: Unit,
    },
}

/// Aggregation switches
#[derive(Debug, Clone, Copy, Default)]
pub struct AggregatorOptions {
    /// Report `UnitMismatch` warnings
    pub report_unit_mismatch: bool,
}

/// Result of one aggregation pass
#[derive(Debug, Clone, Default, Serialize)]
pub struct Aggregation {
    /// Ingredients in order of first appearance
    pub ingredients: Vec<AggregatedIngredient>,
    pub warnings: Vec<AggregationWarning>,
}

impl Aggregation {
    pub fn get(&self, name: &str) -> Option<&AggregatedIngredient> {
        self.ingredients.iter().find(|i| i.name == name)
    }
}

/// Parse "<N> pessoas" into N
pub fn parse_portion(portion: &str) -> Option<u32> {
    let mut words = portion.split_whitespace();
    let count = words.next()?.parse::<u32>().ok()?;

    match (words.next(), words.next()) {
        (Some("pessoas") | Some("pessoa"), None) if count > 0 => Some(count),
        _ => None,
    }
}

/// Scaling factor from a recipe's portion to the target servings.
///
/// 1.0 unless the portion reads "<N> pessoas" and the target is at least 1.
pub fn portion_ratio(portion: Option<&str>, target_portion: Option<f64>) -> f64 {
    let Some(target) = target_portion.filter(|t| *t >= 1.0) else {
        return 1.0;
    };

    match portion.and_then(parse_portion) {
        Some(servings) => target / f64::from(servings),
        None => 1.0,
    }
}

/// Aggregate entries with default options
pub fn aggregate(entries: &[IngredientQuantityEntry], target_portion: Option<f64>) -> Aggregation {
    aggregate_with_options(entries, target_portion, AggregatorOptions::default())
}

/// Sum entries per ingredient name.
///
/// Units come from the first entry seen for a name; later entries are added
/// as-is without conversion. Entries missing a name or quantity are skipped
/// and reported as warnings.
pub fn aggregate_with_options(
    entries: &[IngredientQuantityEntry],
    target_portion: Option<f64>,
    options: AggregatorOptions,
) -> Aggregation {
    let mut aggregation = Aggregation::default();
    let mut positions: HashMap<&str, usize> = HashMap::new();

    for (index, entry) in entries.iter().enumerate() {
        let name = entry.ingredient_name.as_str();

        let quantity = match (&entry.quantity, name.trim().is_empty()) {
            (Some(quantity), false) => quantity,
            (_, true) => {
                skip_entry(&mut aggregation, index, name, "missing ingredient name");
                continue;
            }
            (None, false) => {
                skip_entry(&mut aggregation, index, name, "missing normalized quantity");
                continue;
            }
        };

        let ratio = portion_ratio(entry.recipe_portion.as_deref(), target_portion);

        let position = *positions.entry(name).or_insert_with(|| {
            aggregation.ingredients.push(AggregatedIngredient {
                name: name.to_string(),
                quantity: 0.0,
                unit: quantity.unit.clone(),
                extra_quantity: None,
                extra_unit: None,
            });
            aggregation.ingredients.len() - 1
        });

        let total = &mut aggregation.ingredients[position];

        if options.report_unit_mismatch && total.unit != quantity.unit {
            tracing::warn!(
                ingredient = name,
                expected = %total.unit,
                found = %quantity.unit,
                "ingredient unit mismatch"
            );
            aggregation.warnings.push(AggregationWarning::UnitMismatch {
                ingredient_name: name.to_string(),
                expected: total.unit.clone(),
                found: quantity.unit.clone(),
            });
        }

        total.quantity += quantity.value * ratio;

        if let Some(extra) = &quantity.extra {
            *total.extra_quantity.get_or_insert(0.0) += extra.value * ratio;
            if total.extra_unit.is_none() {
                total.extra_unit = Some(extra.unit.clone());
            }
        }
    }

    aggregation
}

fn skip_entry(aggregation: &mut Aggregation, index: usize, name: &str, reason: &str) {
    tracing::warn!(index, ingredient = name, reason, "skipping aggregation entry");
    aggregation.warnings.push(AggregationWarning::MissingData {
        index,
        ingredient_name: name.to_string(),
        reason: reason.to_string(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quantity::Measure;

    fn grams(value: f64) -> NormalizedQuantity {
        NormalizedQuantity::new(Unit::Grams, value)
    }

    #[test]
    fn test_parse_portion() {
        assert_eq!(parse_portion("4 pessoas"), Some(4));
        assert_eq!(parse_portion(" 2  pessoas "), Some(2));
        assert_eq!(parse_portion("1 pessoa"), Some(1));
        assert_eq!(parse_portion("a gosto"), None);
        assert_eq!(parse_portion("0 pessoas"), None);
        assert_eq!(parse_portion("4 pessoas grandes"), None);
        assert_eq!(parse_portion("2.5 pessoas"), None);
    }

    #[test]
    fn test_portion_ratio() {
        assert!((portion_ratio(Some("2 pessoas"), Some(4.0)) - 2.0).abs() < 0.001);
        assert!((portion_ratio(Some("4 pessoas"), Some(2.0)) - 0.5).abs() < 0.001);
        assert_eq!(portion_ratio(Some("4 pessoas"), None), 1.0);
        assert_eq!(portion_ratio(Some("4 pessoas"), Some(0.0)), 1.0);
        assert_eq!(portion_ratio(Some("a gosto"), Some(4.0)), 1.0);
        assert_eq!(portion_ratio(None, Some(4.0)), 1.0);
    }

    #[test]
    fn test_scaled_sum_across_recipes() {
        let entries = vec![
            IngredientQuantityEntry::new("farinha", grams(200.0), Some("2 pessoas")),
            IngredientQuantityEntry::new("farinha", grams(300.0), Some("4 pessoas")),
        ];

        let result = aggregate(&entries, Some(4.0));
        let farinha = result.get("farinha").unwrap();
        assert!((farinha.quantity - 700.0).abs() < 0.001);
        assert_eq!(farinha.unit, Unit::Grams);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_no_target_keeps_recipe_quantities() {
        let entries = vec![
            IngredientQuantityEntry::new("farinha", grams(200.0), Some("2 pessoas")),
            IngredientQuantityEntry::new("farinha", grams(300.0), Some("4 pessoas")),
        ];

        let result = aggregate(&entries, None);
        assert!((result.get("farinha").unwrap().quantity - 500.0).abs() < 0.001);
    }

    #[test]
    fn test_malformed_portion_defaults_to_unscaled() {
        let entries = vec![IngredientQuantityEntry::new("sal", grams(5.0), Some("a gosto"))];
        let result = aggregate(&entries, Some(6.0));
        assert!((result.get("sal").unwrap().quantity - 5.0).abs() < 0.001);
    }

    #[test]
    fn test_names_are_case_sensitive_and_ordered() {
        let entries = vec![
            IngredientQuantityEntry::new("ovos", NormalizedQuantity::new(Unit::Units, 2.0), None),
            IngredientQuantityEntry::new("Farinha", grams(100.0), None),
            IngredientQuantityEntry::new("farinha", grams(50.0), None),
            IngredientQuantityEntry::new("ovos", NormalizedQuantity::new(Unit::Units, 1.0), None),
        ];

        let result = aggregate(&entries, None);
        let names: Vec<&str> = result.ingredients.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["ovos", "Farinha", "farinha"]);
        assert!((result.get("ovos").unwrap().quantity - 3.0).abs() < 0.001);
    }

    #[test]
    fn test_extra_quantities_accumulate() {
        let can = NormalizedQuantity {
            unit: Unit::Grams,
            value: 400.0,
            extra: Some(Measure { unit: Unit::Other("lata".to_string()), value: 1.0 }),
        };
        let entries = vec![
            IngredientQuantityEntry::new("tomate pelado", grams(100.0), Some("2 pessoas")),
            IngredientQuantityEntry::new("tomate pelado", can, Some("2 pessoas")),
        ];

        let result = aggregate(&entries, Some(4.0));
        let tomate = result.get("tomate pelado").unwrap();
        assert!((tomate.quantity - 1000.0).abs() < 0.001);
        assert_eq!(tomate.extra_quantity, Some(2.0));
        assert_eq!(tomate.extra_unit, Some(Unit::Other("lata".to_string())));
    }

    #[test]
    fn test_missing_data_skipped() {
        let entries = vec![
            IngredientQuantityEntry::new("", grams(10.0), None),
            IngredientQuantityEntry {
                ingredient_name: "leite".to_string(),
                quantity: None,
                recipe_portion: None,
            },
            IngredientQuantityEntry::new("açúcar", grams(30.0), None),
        ];

        let result = aggregate(&entries, None);
        assert_eq!(result.ingredients.len(), 1);
        assert_eq!(result.warnings.len(), 2);
        assert!(matches!(
            &result.warnings[1],
            AggregationWarning::MissingData { index: 1, ingredient_name, .. } if ingredient_name == "leite"
        ));
    }

    #[test]
    fn test_unit_mismatch_summed_and_optionally_reported() {
        let entries = vec![
            IngredientQuantityEntry::new("natas", grams(200.0), None),
            IngredientQuantityEntry::new("natas", NormalizedQuantity::new(Unit::Milliliters, 200.0), None),
        ];

        let quiet = aggregate(&entries, None);
        assert!((quiet.get("natas").unwrap().quantity - 400.0).abs() < 0.001);
        assert!(quiet.warnings.is_empty());

        let loud = aggregate_with_options(
            &entries,
            None,
            AggregatorOptions { report_unit_mismatch: true },
        );
        assert_eq!(loud.get("natas").unwrap().unit, Unit::Grams);
        assert!((loud.get("natas").unwrap().quantity - 400.0).abs() < 0.001);
        assert_eq!(
            loud.warnings,
            vec![AggregationWarning::UnitMismatch {
                ingredient_name: "natas".to_string(),
                expected: Unit::Grams,
                found: Unit::Milliliters,
            }]
        );
    }
}
