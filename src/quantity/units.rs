//! Unit types and conversion constants
//!
//! Provides the canonical unit set used by normalized quantities and the
//! conversion factors for Portuguese spoon and cup measures.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Canonical unit of a normalized quantity
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum Unit {
    /// Grams ("g")
    Grams,
    /// Milliliters ("ml")
    Milliliters,
    /// Whole units ("U"), written "unid." in recipes
    Units,
    /// Garlic cloves ("D"), written "dentes"
    Dentes,
    /// Leaves ("F"), written "folha(s)"
    Folha,
    /// Quanto baste, to taste ("QB")
    Qb,
    /// Author-entered unit with no canonical mapping (e.g. "lata", "pitada")
    Other(String),
}

impl Unit {
    /// Wire string for this unit
    pub fn as_str(&self) -> &str {
        match self {
            Unit::Grams => "g",
            Unit::Milliliters => "ml",
            Unit::Units => "U",
            Unit::Dentes => "D",
            Unit::Folha => "F",
            Unit::Qb => "QB",
            Unit::Other(text) => text,
        }
    }

    /// Map recipe unit text to a unit. Never fails; unknown text becomes `Other`.
    pub fn from_text(text: &str) -> Self {
        let trimmed = text.trim();
        match trimmed {
            "g" | "gr" | "gramas" => Unit::Grams,
            "ml" | "mL" => Unit::Milliliters,
            "U" | "unid." | "unid" | "un." => Unit::Units,
            "D" | "dente" | "dentes" => Unit::Dentes,
            "F" | "folha" | "folhas" => Unit::Folha,
            "QB" | "q.b." => Unit::Qb,
            _ => Unit::Other(trimmed.to_string()),
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Unit> for String {
    fn from(unit: Unit) -> Self {
        unit.as_str().to_string()
    }
}

impl From<String> for Unit {
    fn from(text: String) -> Self {
        Unit::from_text(&text)
    }
}

/// A unit paired with an amount
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measure {
    pub unit: Unit,
    pub value: f64,
}

// ============================================================================
// Weight / Volume Conversion Constants
// ============================================================================

/// Grams per kilogram
pub const G_PER_KG: f64 = 1000.0;
/// Milliliters per liter
pub const ML_PER_LITER: f64 = 1000.0;

// ============================================================================
// Spoon and Cup Conversion Constants
// ============================================================================

/// Grams per colher de chá (teaspoon)
pub const G_PER_COLHER_CHA: f64 = 4.0;
/// Grams per colher de sopa (tablespoon)
pub const G_PER_COLHER_SOPA: f64 = 14.0;
/// Grams per colher de sobremesa (dessert spoon).
///
/// Not applied: `SPOON_CONVERSIONS` maps dessert spoons to `G_PER_COLHER_SOPA`.
pub const G_PER_COLHER_SOBREMESA: f64 = 9.0;
/// Grams per colher de café (coffee spoon)
pub const G_PER_COLHER_CAFE: f64 = 1.5;
/// Milliliters per chávena (cup)
pub const ML_PER_CHAVENA: f64 = 250.0;

/// A spoon or cup phrase and what one of it converts to
#[derive(Debug, Clone, Copy)]
pub struct SpoonConversion {
    pub phrase: &'static str,
    pub unit: BaseUnit,
    pub factor: f64,
}

/// Base unit a spoon conversion lands in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseUnit {
    Grams,
    Milliliters,
}

impl BaseUnit {
    pub fn unit(self) -> Unit {
        match self {
            BaseUnit::Grams => Unit::Grams,
            BaseUnit::Milliliters => Unit::Milliliters,
        }
    }
}

/// Spoon and cup phrases in match priority order
pub const SPOON_CONVERSIONS: &[SpoonConversion] = &[
    SpoonConversion { phrase: "c. de chá", unit: BaseUnit::Grams, factor: G_PER_COLHER_CHA },
    SpoonConversion { phrase: "c. de sopa", unit: BaseUnit::Grams, factor: G_PER_COLHER_SOPA },
    SpoonConversion { phrase: "c. de sobremesa", unit: BaseUnit::Grams, factor: G_PER_COLHER_SOPA },
    SpoonConversion { phrase: "c. sobremesa", unit: BaseUnit::Grams, factor: G_PER_COLHER_SOPA },
    SpoonConversion { phrase: "c. de café", unit: BaseUnit::Grams, factor: G_PER_COLHER_CAFE },
    SpoonConversion { phrase: "cháv.", unit: BaseUnit::Milliliters, factor: ML_PER_CHAVENA },
];

// ============================================================================
// Unit Recognition
// ============================================================================

/// Find the first spoon/cup phrase contained in `text`
pub fn find_spoon_conversion(text: &str) -> Option<&'static SpoonConversion> {
    SPOON_CONVERSIONS.iter().find(|c| text.contains(c.phrase))
}

/// Whether `text` is exactly one of the spoon/cup phrases
pub fn is_spoon_phrase(text: &str) -> bool {
    let trimmed = text.trim();
    SPOON_CONVERSIONS.iter().any(|c| c.phrase == trimmed)
}

/// Convert a kilogram or liter amount to its base unit.
///
/// Returns `None` when `unit_text` is not kg or L.
pub fn to_base_unit(value: f64, unit_text: &str) -> Option<(Unit, f64)> {
    let trimmed = unit_text.trim();

    if trimmed.eq_ignore_ascii_case("kg") {
        return Some((Unit::Grams, value * G_PER_KG));
    }

    match trimmed {
        "L" | "l" | "lt" | "litro" | "litros" => Some((Unit::Milliliters, value * ML_PER_LITER)),
        _ => None,
    }
}
