//! Quantity normalization pipeline
//!
//! Turns free-form recipe quantities ("1 c. de chá", "½ kg", "1 lata (2x250g)")
//! into a canonical unit and value. The work is an ordered list of string
//! rewrites; later steps assume the earlier ones ran (decimal commas are gone
//! before anything is parsed, "q.b." is collapsed before the primary split).

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::units::{find_spoon_conversion, is_spoon_phrase, to_base_unit, Measure, Unit};

/// Pipeline stage names, used in errors and traces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStep {
    LocaleFix,
    ApproximationMarkers,
    Fractions,
    CanonicalForms,
    Additive,
    PrimarySplit,
    Parenthetical,
    SpoonConversion,
    GramSwap,
    Canonicalize,
    Build,
}

impl PipelineStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStep::LocaleFix => "locale_fix",
            PipelineStep::ApproximationMarkers => "approximation_markers",
            PipelineStep::Fractions => "fractions",
            PipelineStep::CanonicalForms => "canonical_forms",
            PipelineStep::Additive => "additive",
            PipelineStep::PrimarySplit => "primary_split",
            PipelineStep::Parenthetical => "parenthetical",
            PipelineStep::SpoonConversion => "spoon_conversion",
            PipelineStep::GramSwap => "gram_swap",
            PipelineStep::Canonicalize => "canonicalize",
            PipelineStep::Build => "build",
        }
    }
}

impl fmt::Display for PipelineStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalization error types
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NormalizationError {
    #[error("Unparseable value '{token}' in quantity '{input}' ({step} step)")]
    UnparseableValue {
        input: String,
        token: String,
        step: PipelineStep,
    },
}

/// A quantity expressed in a canonical unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedQuantity {
    pub unit: Unit,
    pub value: f64,
    /// Secondary quantity, e.g. the can count in "500 g (1 lata)"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<Measure>,
}

impl NormalizedQuantity {
    pub fn new(unit: Unit, value: f64) -> Self {
        Self { unit, value, extra: None }
    }

    pub fn extra_unit(&self) -> Option<&Unit> {
        self.extra.as_ref().map(|m| &m.unit)
    }

    pub fn extra_value(&self) -> Option<f64> {
        self.extra.as_ref().map(|m| m.value)
    }
}

// ============================================================================
// Patterns
// ============================================================================

/// "(15g)", "(1 lata)", "( 2.5 kg )"
static EXTRA_QUANTITY: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^\(\s*(\d+(?:\.\d+)?)\s*([^\d()]+?)\s*\)").ok());

/// "(2x250g)", "(4 x 125 ml)"
static MULTIPACK_EXTRA: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^\(\s*(\d+(?:\.\d+)?)\s*x\s*(\d+(?:\.\d+)?)\s*([^\d()]+?)\s*\)").ok()
});

/// Whole-string "2x250g"
static MULTIPACK: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^(\d+(?:\.\d+)?)\s*x\s*(\d+(?:\.\d+)?)\s*([^\d\s(][^(]*)$").ok()
});

/// Approximation markers, longest first
const APPROXIMATION_MARKERS: &[&str] = &["(±)", "+-", "±"];

/// Fraction glyphs and their decimal text
const FRACTION_GLYPHS: &[(&str, &str)] = &[("1⁄2", "0.5"), ("½", "0.5"), ("¼", "0.25")];

// ============================================================================
// Pipeline
// ============================================================================

/// What a step tells the runner
#[derive(Debug)]
enum Flow {
    Continue,
    Finished(NormalizedQuantity),
}

type StepResult = Result<Flow, NormalizationError>;

/// Working string plus the partially-filled result
#[derive(Debug, Clone, Default)]
struct Working {
    input: String,
    text: String,
    value_token: String,
    units_text: String,
    /// Primary value once parsed (or produced by a rewrite)
    value: Option<f64>,
    /// Extra unit text and value
    extra: Option<(String, f64)>,
}

impl Working {
    fn new(raw: &str) -> Self {
        Self {
            input: raw.to_string(),
            text: raw.to_string(),
            ..Self::default()
        }
    }

    fn unparseable(&self, token: &str, step: PipelineStep) -> NormalizationError {
        NormalizationError::UnparseableValue {
            input: self.input.clone(),
            token: token.to_string(),
            step,
        }
    }

    fn primary_value(&mut self, step: PipelineStep) -> Result<f64, NormalizationError> {
        if let Some(value) = self.value {
            return Ok(value);
        }
        let value = parse_number(&self.value_token)
            .ok_or_else(|| self.unparseable(&self.value_token, step))?;
        self.value = Some(value);
        Ok(value)
    }

    fn extra_measure(&self) -> Option<Measure> {
        self.extra.as_ref().map(|(unit_text, value)| {
            match to_base_unit(*value, unit_text) {
                Some((unit, value)) => Measure { unit, value },
                None => Measure { unit: Unit::from_text(unit_text), value: *value },
            }
        })
    }
}

type StepFn = fn(&mut Working) -> StepResult;

const PIPELINE: &[(PipelineStep, StepFn)] = &[
    (PipelineStep::LocaleFix, locale_fix),
    (PipelineStep::ApproximationMarkers, strip_approximation_markers),
    (PipelineStep::Fractions, expand_fractions),
    (PipelineStep::CanonicalForms, canonical_forms),
    (PipelineStep::Additive, sum_additive),
    (PipelineStep::PrimarySplit, primary_split),
    (PipelineStep::Parenthetical, extract_parenthetical),
    (PipelineStep::SpoonConversion, convert_spoons),
    (PipelineStep::GramSwap, swap_gram_extra),
    (PipelineStep::Canonicalize, canonicalize_units),
    (PipelineStep::Build, build),
];

/// Normalize a raw recipe quantity.
///
/// Errors are per-quantity; callers working through a recipe should flag the
/// failing line and carry on with the rest.
pub fn normalize(raw: &str) -> Result<NormalizedQuantity, NormalizationError> {
    let mut working = Working::new(raw);

    for (step, run) in PIPELINE {
        match run(&mut working)? {
            Flow::Continue => {
                tracing::trace!(step = %step, text = %working.text, "quantity step");
            }
            Flow::Finished(quantity) => {
                tracing::debug!(
                    raw,
                    step = %step,
                    unit = %quantity.unit,
                    value = quantity.value,
                    "normalized quantity"
                );
                return Ok(quantity);
            }
        }
    }

    Err(working.unparseable(raw, PipelineStep::Build))
}

// ============================================================================
// Steps
// ============================================================================

fn locale_fix(w: &mut Working) -> StepResult {
    w.text = w.text.trim().replace(',', ".");
    Ok(Flow::Continue)
}

fn strip_approximation_markers(w: &mut Working) -> StepResult {
    for marker in APPROXIMATION_MARKERS {
        while let Some(pos) = w.text.find(marker) {
            let before = w.text[..pos].trim_end();
            let after = w.text[pos + marker.len()..].trim_start();
            w.text = join_words(before, after);
        }
    }
    w.text = w.text.trim().to_string();
    Ok(Flow::Continue)
}

fn expand_fractions(w: &mut Working) -> StepResult {
    let mut replaced = false;

    for (glyph, decimal) in FRACTION_GLYPHS {
        while let Some(pos) = w.text.find(glyph) {
            let glued = w.text[..pos].chars().last().is_some_and(|c| c.is_ascii_digit());
            let separator = if glued { " " } else { "" };
            w.text = format!(
                "{}{}{}{}",
                &w.text[..pos],
                separator,
                decimal,
                &w.text[pos + glyph.len()..]
            );
            replaced = true;
        }
    }

    if replaced {
        if let Some(merged) = merge_mixed_number(&w.text) {
            w.text = merged;
        }
    }

    Ok(Flow::Continue)
}

/// "1 0.5 kg" -> "1.5 kg". `None` when the text is not `<integer> <fraction> ...`.
fn merge_mixed_number(text: &str) -> Option<String> {
    let mut words = text.split_whitespace();
    let whole = parse_number(words.next()?)?;
    let fraction = parse_number(words.next()?)?;

    if whole.fract() != 0.0 || fraction >= 1.0 {
        return None;
    }

    let rest = words.collect::<Vec<_>>().join(" ");
    Some(join_words(&format_number(whole + fraction), &rest))
}

fn canonical_forms(w: &mut Working) -> StepResult {
    if w.text == "unid." || w.text == "1" {
        w.text = "1 unid.".to_string();
    } else if w.text.contains("q.b.") {
        w.text = "1 q.b.".to_string();
    }
    Ok(Flow::Continue)
}

fn sum_additive(w: &mut Working) -> StepResult {
    let Some(pos) = top_level_plus(&w.text) else {
        return Ok(Flow::Continue);
    };

    let left = w.text[..pos].trim();
    let right = w.text[pos + 1..].trim();

    if let (Some((a, _)), Some((b, rest))) = (split_numeric_head(left), split_numeric_head(right)) {
        w.text = join_words(&format_number(a + b), rest.trim());
    } else {
        tracing::debug!(text = %w.text, "leaving additive quantity unevaluated");
    }

    Ok(Flow::Continue)
}

fn primary_split(w: &mut Working) -> StepResult {
    let text = w.text.trim();
    if text.is_empty() {
        return Err(w.unparseable(text, PipelineStep::PrimarySplit));
    }

    if let Some(caps) = MULTIPACK.as_ref().and_then(|re| re.captures(text)) {
        let count = parse_number(&caps[1]);
        let weight = parse_number(&caps[2]);
        if let (Some(count), Some(weight)) = (count, weight) {
            w.value = Some(count * weight);
            w.value_token = format_number(count * weight);
            w.units_text = caps[3].trim().to_string();
            return Ok(Flow::Continue);
        }
    }

    let (token, units) = match text.split_once(char::is_whitespace) {
        Some((token, units)) => (token, units.trim_start()),
        None => (text, ""),
    };

    // "250g" or "250g (1 lata)": move the glued unit into the units text
    let head = numeric_head_len(token);
    if head > 0 && head < token.len() {
        w.value_token = token[..head].to_string();
        w.units_text = join_words(&token[head..], units);
    } else {
        w.value_token = token.to_string();
        w.units_text = units.to_string();
    }

    Ok(Flow::Continue)
}

fn extract_parenthetical(w: &mut Working) -> StepResult {
    let Some(open) = parenthetical_start(&w.units_text) else {
        return Ok(Flow::Continue);
    };

    let head = w.units_text[..open].trim_end().to_string();
    let segment = &w.units_text[open..];

    let extra = EXTRA_QUANTITY
        .as_ref()
        .and_then(|re| re.captures(segment))
        .filter(|caps| !is_spoon_phrase(&caps[2]))
        .and_then(|caps| Some((caps[2].trim().to_string(), parse_number(&caps[1])?)))
        .or_else(|| {
            let caps = MULTIPACK_EXTRA.as_ref()?.captures(segment)?;
            let count = parse_number(&caps[1])?;
            let weight = parse_number(&caps[2])?;
            Some((caps[3].trim().to_string(), count * weight))
        });

    w.extra = extra;
    w.units_text = head;
    Ok(Flow::Continue)
}

fn convert_spoons(w: &mut Working) -> StepResult {
    let Some(conversion) = find_spoon_conversion(&w.text) else {
        return Ok(Flow::Continue);
    };

    let value = w.primary_value(PipelineStep::SpoonConversion)?;
    Ok(Flow::Finished(NormalizedQuantity {
        unit: conversion.unit.unit(),
        value: value * conversion.factor,
        extra: w.extra_measure(),
    }))
}

fn swap_gram_extra(w: &mut Working) -> StepResult {
    if !w.extra.as_ref().is_some_and(|(unit, _)| unit == "g") {
        return Ok(Flow::Continue);
    }

    let primary_value = w.primary_value(PipelineStep::GramSwap)?;
    if let Some((extra_unit, extra_value)) = w.extra.take() {
        let primary_unit = std::mem::replace(&mut w.units_text, extra_unit);
        w.extra = Some((primary_unit, primary_value));
        w.value = Some(extra_value);
    }

    Ok(Flow::Continue)
}

fn canonicalize_units(w: &mut Working) -> StepResult {
    let value = w.primary_value(PipelineStep::Canonicalize)?;
    if let Some((unit, converted)) = to_base_unit(value, &w.units_text) {
        w.units_text = unit.as_str().to_string();
        w.value = Some(converted);
    }

    if let Some((unit_text, extra_value)) = w.extra.as_mut() {
        if let Some((unit, converted)) = to_base_unit(*extra_value, unit_text) {
            *unit_text = unit.as_str().to_string();
            *extra_value = converted;
        }
    }

    Ok(Flow::Continue)
}

fn build(w: &mut Working) -> StepResult {
    let value = w.primary_value(PipelineStep::Build)?;

    // A bare number counts whole units
    let unit = if w.units_text.trim().is_empty() {
        Unit::Units
    } else {
        Unit::from_text(&w.units_text)
    };

    Ok(Flow::Finished(NormalizedQuantity {
        unit,
        value,
        extra: w.extra_measure(),
    }))
}

// ============================================================================
// Helpers
// ============================================================================

/// Parse a finite, non-negative decimal
fn parse_number(token: &str) -> Option<f64> {
    token
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
}

/// Shortest decimal text that parses back to `value`
fn format_number(value: f64) -> String {
    value.to_string()
}

fn join_words(a: &str, b: &str) -> String {
    match (a.is_empty(), b.is_empty()) {
        (true, _) => b.to_string(),
        (_, true) => a.to_string(),
        _ => format!("{} {}", a, b),
    }
}

/// Byte length of the leading run of digits and dots
fn numeric_head_len(s: &str) -> usize {
    s.bytes().take_while(|b| b.is_ascii_digit() || *b == b'.').count()
}

/// "50g" -> (50.0, "g")
fn split_numeric_head(s: &str) -> Option<(f64, &str)> {
    let head = numeric_head_len(s);
    if head == 0 {
        return None;
    }
    Some((parse_number(&s[..head])?, &s[head..]))
}

/// Position of the first '+' outside parentheses
fn top_level_plus(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (pos, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            '+' if depth == 0 => return Some(pos),
            _ => {}
        }
    }
    None
}

/// Start of a trailing parenthetical: a '(' at the start or after whitespace
fn parenthetical_start(s: &str) -> Option<usize> {
    s.char_indices()
        .find(|&(pos, c)| c == '(' && (pos == 0 || s[..pos].ends_with(char::is_whitespace)))
        .map(|(pos, _)| pos)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_until(raw: &str, last: PipelineStep) -> Working {
        let mut w = Working::new(raw);
        for (step, run) in PIPELINE {
            run(&mut w).unwrap();
            if *step == last {
                break;
            }
        }
        w
    }

    fn assert_quantity(raw: &str, unit: Unit, value: f64) {
        let q = normalize(raw).unwrap();
        assert_eq!(q.unit, unit, "unit for {:?}", raw);
        assert!((q.value - value).abs() < 0.001, "value for {:?}: {}", raw, q.value);
    }

    #[test]
    fn test_decimal_comma_matches_dot() {
        assert_eq!(normalize("1,5 kg").unwrap(), normalize("1.5 kg").unwrap());
        assert_quantity("1,5 kg", Unit::Grams, 1500.0);
    }

    #[test]
    fn test_qb_forms() {
        assert_quantity("1 q.b.", Unit::Qb, 1.0);
        assert_quantity("q.b.", Unit::Qb, 1.0);
        assert_quantity("sal q.b.", Unit::Qb, 1.0);
    }

    #[test]
    fn test_unit_forms() {
        assert_quantity("unid.", Unit::Units, 1.0);
        assert_quantity("1", Unit::Units, 1.0);
        assert_quantity("3 unid.", Unit::Units, 3.0);
        assert_quantity("4", Unit::Units, 4.0);
    }

    #[test]
    fn test_spoon_and_cup_conversions() {
        assert_quantity("2 c. de chá", Unit::Grams, 8.0);
        assert_quantity("3 c. de sopa", Unit::Grams, 42.0);
        assert_quantity("1 c. de sobremesa", Unit::Grams, 14.0);
        assert_quantity("1 c. sobremesa", Unit::Grams, 14.0);
        assert_quantity("2 c. de café", Unit::Grams, 3.0);
        assert_quantity("1 cháv.", Unit::Milliliters, 250.0);
        assert_quantity("½ cháv.", Unit::Milliliters, 125.0);
    }

    #[test]
    fn test_spoon_conversion_unparseable_value() {
        let err = normalize("umas c. de sopa").unwrap_err();
        match err {
            NormalizationError::UnparseableValue { token, step, .. } => {
                assert_eq!(token, "umas");
                assert_eq!(step, PipelineStep::SpoonConversion);
            }
        }
    }

    #[test]
    fn test_multipack_parenthetical_swaps_to_grams() {
        let q = normalize("1 lata (2x250g)").unwrap();
        assert_eq!(q.unit, Unit::Grams);
        assert!((q.value - 500.0).abs() < 0.001);
        assert_eq!(q.extra_unit(), Some(&Unit::Other("lata".to_string())));
        assert_eq!(q.extra_value(), Some(1.0));
    }

    #[test]
    fn test_bare_multipack() {
        assert_quantity("2x250g", Unit::Grams, 500.0);
        assert_quantity("4 x 125 ml", Unit::Milliliters, 500.0);
    }

    #[test]
    fn test_extra_quantity_in_parentheses() {
        let q = normalize("1 pacote (200 g)").unwrap();
        assert_eq!(q.unit, Unit::Grams);
        assert!((q.value - 200.0).abs() < 0.001);
        assert_eq!(q.extra_unit(), Some(&Unit::Other("pacote".to_string())));

        let q = normalize("500 ml (1 garrafa)").unwrap();
        assert_eq!(q.unit, Unit::Milliliters);
        assert_eq!(q.extra_unit(), Some(&Unit::Other("garrafa".to_string())));
        assert_eq!(q.extra_value(), Some(1.0));
    }

    #[test]
    fn test_extra_kilograms_canonicalized() {
        let q = normalize("1 saco (1,5 kg)").unwrap();
        assert_eq!(q.unit, Unit::Other("saco".to_string()));
        assert_eq!(q.extra_unit(), Some(&Unit::Grams));
        assert!((q.extra_value().unwrap() - 1500.0).abs() < 0.001);
    }

    #[test]
    fn test_spoon_phrase_parenthetical_is_not_extra() {
        let w = run_until("20 g (1 c. de sopa)", PipelineStep::Parenthetical);
        assert_eq!(w.units_text, "g");
        assert!(w.extra.is_none());
    }

    #[test]
    fn test_spoon_check_uses_whole_working_string() {
        // The phrase sits inside the parenthetical but still selects the conversion
        assert_quantity("100 ml (+ 2 c. de sobremesa)", Unit::Grams, 1400.0);
    }

    #[test]
    fn test_unmatched_parenthetical_truncated() {
        let q = normalize("2 dentes (picados)").unwrap();
        assert_eq!(q.unit, Unit::Dentes);
        assert!((q.value - 2.0).abs() < 0.001);
        assert!(q.extra.is_none());
    }

    #[test]
    fn test_base_units_only() {
        assert_quantity("1 kg", Unit::Grams, 1000.0);
        assert_quantity("1 L", Unit::Milliliters, 1000.0);
        assert_quantity("0,75 l", Unit::Milliliters, 750.0);
    }

    #[test]
    fn test_idempotent_on_canonical_input() {
        assert_quantity("500 g", Unit::Grams, 500.0);
        let once = normalize("500 g").unwrap();
        let twice = normalize(&format!("{} {}", once.value, once.unit)).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_fractions() {
        assert_quantity("½ kg", Unit::Grams, 500.0);
        assert_quantity("1 ½ kg", Unit::Grams, 1500.0);
        assert_quantity("1½ kg", Unit::Grams, 1500.0);
        assert_quantity("1 1⁄2 L", Unit::Milliliters, 1500.0);
        assert_quantity("¼ unid.", Unit::Units, 0.25);
    }

    #[test]
    fn test_merge_mixed_number() {
        assert_eq!(merge_mixed_number("1 0.5 kg"), Some("1.5 kg".to_string()));
        assert_eq!(merge_mixed_number("2 0.25"), Some("2.25".to_string()));
        assert_eq!(merge_mixed_number("0.5 kg"), None);
        assert_eq!(merge_mixed_number("1.5 0.5 kg"), None);
    }

    #[test]
    fn test_approximation_markers() {
        assert_quantity("± 100 g", Unit::Grams, 100.0);
        assert_quantity("100 g (±)", Unit::Grams, 100.0);
        assert_quantity("+- 2 dentes", Unit::Dentes, 2.0);
    }

    #[test]
    fn test_additive_quantities() {
        assert_quantity("100 + 50 g", Unit::Grams, 150.0);
        // Heads are summed as written; the first half's unit is dropped
        assert_quantity("1 kg + 500 g", Unit::Grams, 501.0);
    }

    #[test]
    fn test_additive_unparseable_left_alone() {
        let w = run_until("sal + pimenta", PipelineStep::Additive);
        assert_eq!(w.text, "sal + pimenta");
    }

    #[test]
    fn test_glued_unit() {
        assert_quantity("250g", Unit::Grams, 250.0);
        assert_quantity("2kg", Unit::Grams, 2000.0);
    }

    #[test]
    fn test_unparseable_value() {
        let err = normalize("algumas folhas").unwrap_err();
        assert!(matches!(
            err,
            NormalizationError::UnparseableValue { step: PipelineStep::Canonicalize, .. }
        ));
        assert!(normalize("   ").is_err());
        assert!(normalize("-5 g").is_err());
    }

    #[test]
    fn test_other_units_kept() {
        let q = normalize("2 folhas").unwrap();
        assert_eq!(q.unit, Unit::Folha);
        let q = normalize("1 pitada").unwrap();
        assert_eq!(q.unit, Unit::Other("pitada".to_string()));
    }

    #[test]
    fn test_serialized_shape() {
        let q = normalize("1 lata (2x250g)").unwrap();
        let json = serde_json::to_value(&q).unwrap();
        assert_eq!(json["unit"], "g");
        assert_eq!(json["value"], 500.0);
        assert_eq!(json["extra"]["unit"], "lata");

        let json = serde_json::to_value(normalize("500 g").unwrap()).unwrap();
        assert!(json.get("extra").is_none());
    }
}
