//! Receipt line normalizer — abbreviations to canonical pantry names
//!
//! Confidence ladder:
//!   exact abbreviation hit          0.90
//!   recognized grocery vocabulary   0.70
//!   partial abbreviation hit        0.55
//!   unrecognized                    0.35
//! A parsed quantity adds +0.05. Final confidence is clamped to [0, 1];
//! only lines at or above 0.60 propagate to inventory.

use crate::matching::{infer_category, tokenize, PantryCategory};
use regex::Regex;
use std::sync::LazyLock;

const CONFIDENCE_EXACT: f64 = 0.90;
const CONFIDENCE_VOCABULARY: f64 = 0.70;
const CONFIDENCE_PARTIAL: f64 = 0.55;
const CONFIDENCE_UNKNOWN: f64 = 0.35;
const CONFIDENCE_QTY_BONUS: f64 = 0.05;

/// Abbreviation -> canonical name. Lifted from real receipt vocabulary;
/// additions are safe, removals shrink matching coverage.
const NAME_MAP: &[(&str, &str)] = &[
    ("chk brst", "chicken breast"),
    ("chkn brst", "chicken breast"),
    ("chicken brst", "chicken breast"),
    ("bnls sknls brst", "chicken breast"),
    ("chkn thghs", "chicken thighs"),
    ("grnd bf", "ground beef"),
    ("grnd beef", "ground beef"),
    ("gr bf", "ground beef"),
    ("gr turkey", "ground turkey"),
    ("tom roma", "roma tomatoes"),
    ("roma tom", "roma tomatoes"),
    ("whl mlk", "whole milk"),
    ("mlk", "milk"),
    ("choc mlk", "chocolate milk"),
    ("brd", "bread"),
    ("wht brd", "wheat bread"),
    ("egs", "eggs"),
    ("lrg eggs", "eggs"),
    ("chs", "cheese"),
    ("chdr chs", "cheddar cheese"),
    ("shrd chs", "shredded cheese"),
    ("bttr", "butter"),
    ("yog", "yogurt"),
    ("grk yog", "greek yogurt"),
    ("pnt bttr", "peanut butter"),
    ("baby spin", "spinach"),
    ("org spin", "spinach"),
    ("swt potato", "sweet potatoes"),
    ("grn onion", "green onions"),
    ("blk beans", "black beans"),
    ("parm", "parmesan cheese"),
    ("mozz", "mozzarella cheese"),
    ("strwb", "strawberries"),
    ("evoo", "olive oil"),
    ("ov oil", "olive oil"),
    ("tort", "tortillas"),
];

/// Unit spellings -> canonical unit
const UNIT_MAP: &[(&str, &str)] = &[
    ("lb", "lb"),
    ("lbs", "lb"),
    ("pound", "lb"),
    ("pounds", "lb"),
    ("oz", "oz"),
    ("ounce", "oz"),
    ("ounces", "oz"),
    ("ct", "count"),
    ("count", "count"),
    ("ea", "each"),
    ("each", "each"),
    ("kg", "kg"),
    ("g", "g"),
    ("gram", "g"),
    ("grams", "g"),
    ("gal", "gal"),
    ("gallon", "gal"),
    ("l", "l"),
    ("liter", "l"),
    ("litre", "l"),
    ("ml", "ml"),
    ("dz", "dozen"),
    ("dozen", "dozen"),
    ("pk", "pack"),
    ("pack", "pack"),
];

static QTY_WITH_UNIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*([a-z]*)").expect("static regex"));

/// Normalizer output for one parsed line
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedLine {
    pub name: String,
    pub unit: Option<String>,
    pub qty_estimate: Option<f64>,
    pub confidence: f64,
}

/// Lowercase and split on non-alphanumerics, keeping short tokens —
/// abbreviation keys like "gr bf" need them
fn raw_tokens(input: &str) -> Vec<String> {
    input
        .to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn lookup_unit(raw: &str) -> Option<String> {
    let needle = raw.to_lowercase();
    UNIT_MAP
        .iter()
        .find(|(spelling, _)| *spelling == needle)
        .map(|(_, canonical)| canonical.to_string())
}

/// Parse "2.5 LB" / "X2" / "QTY: 3" style quantity text
fn parse_qty(qty_text: &str) -> Option<(f64, Option<String>)> {
    let caps = QTY_WITH_UNIT.captures(qty_text)?;
    let qty: f64 = caps[1].parse().ok()?;
    if qty <= 0.0 {
        return None;
    }
    let unit = lookup_unit(&caps[2]);
    Some((qty, unit))
}

/// Normalize one parsed receipt line into a pantry-ready record
pub fn normalize_line(item_name: &str, qty_text: Option<&str>) -> NormalizedLine {
    let tokens = raw_tokens(item_name);
    let cleaned = tokens.join(" ");

    let (name, mut confidence) = if let Some((_, canonical)) =
        NAME_MAP.iter().find(|(key, _)| **key == cleaned)
    {
        ((*canonical).to_string(), CONFIDENCE_EXACT)
    } else if let Some((_, canonical)) = NAME_MAP.iter().find(|(key, _)| {
        let key_tokens = raw_tokens(key);
        key_tokens.len() > 1 && key_tokens.iter().all(|kt| tokens.contains(kt))
    }) {
        ((*canonical).to_string(), CONFIDENCE_PARTIAL)
    } else {
        // No abbreviation hit: the stopword tokenizer strips descriptors
        // ("FRESH ORGANIC MILK 1 GAL" -> "milk"); category inference tells
        // us whether what is left is known grocery vocabulary
        let filtered = tokenize(&cleaned);
        if filtered.is_empty() {
            (cleaned.clone(), CONFIDENCE_UNKNOWN)
        } else if infer_category(&filtered) != PantryCategory::Other {
            (filtered.join(" "), CONFIDENCE_VOCABULARY)
        } else {
            (filtered.join(" "), CONFIDENCE_UNKNOWN)
        }
    };

    let mut unit = None;
    let mut qty_estimate = None;
    if let Some((qty, parsed_unit)) = qty_text.and_then(parse_qty) {
        qty_estimate = Some(qty);
        unit = parsed_unit;
        confidence += CONFIDENCE_QTY_BONUS;
    }

    NormalizedLine {
        name,
        unit,
        qty_estimate,
        confidence: confidence.clamp(0.0, 1.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_abbreviation_hit() {
        let n = normalize_line("CHK BRST", None);
        assert_eq!(n.name, "chicken breast");
        assert!((n.confidence - 0.90).abs() < 1e-9);
    }

    #[test]
    fn exact_hit_with_qty_gets_bonus() {
        let n = normalize_line("CHK BRST", Some("2.1 LB"));
        assert_eq!(n.name, "chicken breast");
        assert_eq!(n.qty_estimate, Some(2.1));
        assert_eq!(n.unit.as_deref(), Some("lb"));
        assert!((n.confidence - 0.95).abs() < 1e-9);
    }

    #[test]
    fn partial_abbreviation_hit() {
        let n = normalize_line("GRND BF 80/20", None);
        assert_eq!(n.name, "ground beef");
        assert!(n.confidence >= 0.50 && n.confidence < 0.90);
    }

    #[test]
    fn known_vocabulary_clears_propagation_threshold() {
        let n = normalize_line("MILK 1 GAL", None);
        assert_eq!(n.name, "milk");
        assert!(n.confidence >= 0.60);

        let n = normalize_line("FRESH ORGANIC BREAD", None);
        assert_eq!(n.name, "bread");
        assert!(n.confidence >= 0.60);
    }

    #[test]
    fn unknown_items_stay_below_threshold() {
        let n = normalize_line("MYSTERY WIDGET", None);
        assert!(n.confidence < 0.50);
    }

    #[test]
    fn unit_spellings_normalize() {
        assert_eq!(normalize_line("MILK", Some("1 GAL")).unit.as_deref(), Some("gal"));
        assert_eq!(normalize_line("EGGS", Some("12 CT")).unit.as_deref(), Some("count"));
        assert_eq!(normalize_line("RICE", Some("2 LBS")).unit.as_deref(), Some("lb"));
    }

    #[test]
    fn confidence_is_clamped() {
        let n = normalize_line("CHK BRST", Some("2 LB"));
        assert!(n.confidence <= 1.0);
    }
}
