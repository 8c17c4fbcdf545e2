//! Inventory matcher — whole-token overlap with constrained prefix matching
//!
//! Per ingredient token:
//!   exact whole-token hit            +1.00
//!   constrained prefix hit           +0.80
//! Prefix constraints: one string is a strict prefix of the other, at most
//! 3 extra chars, and shorter/longer length ratio ≥ 0.70. This accepts
//! "tomato"↔"tomatoes" while blocking "egg"→"eggplant" and
//! "butter"→"butternut". Substring matching never happens.
//!
//! Final score = sum of per-token contributions / |ingredient tokens|,
//! capped at 1.0. The best candidate must clear MATCH_THRESHOLD.

use crate::matching::tokenizer::tokenize;

/// Minimum score for a candidate to count as matched
pub const MATCH_THRESHOLD: f64 = 0.66;

const EXACT_HIT: f64 = 1.0;
const PREFIX_HIT: f64 = 0.80;
const PREFIX_MAX_EXTRA_CHARS: usize = 3;
const PREFIX_MIN_LENGTH_RATIO: f64 = 0.70;

/// Anything with a matchable name can be a candidate
pub trait MatchCandidate {
    fn match_name(&self) -> &str;
}

impl MatchCandidate for String {
    fn match_name(&self) -> &str {
        self
    }
}

impl MatchCandidate for &str {
    fn match_name(&self) -> &str {
        self
    }
}

/// Result of matching one ingredient against a candidate set
#[derive(Debug)]
pub struct MatchOutcome<'a, T> {
    pub matched: Option<&'a T>,
    pub score: f64,
}

/// Constrained prefix test between two whole tokens
fn prefix_hit(a: &str, b: &str) -> bool {
    let (short, long) = if a.len() < b.len() { (a, b) } else { (b, a) };
    if short.is_empty() || short.len() == long.len() {
        return false;
    }
    if !long.starts_with(short) {
        return false;
    }
    if long.len() - short.len() > PREFIX_MAX_EXTRA_CHARS {
        return false;
    }
    (short.len() as f64 / long.len() as f64) >= PREFIX_MIN_LENGTH_RATIO
}

/// Overlap score between two token sequences, in [0, 1]
pub fn overlap_score(ingredient_tokens: &[String], item_tokens: &[String]) -> f64 {
    if ingredient_tokens.is_empty() {
        return 0.0;
    }

    let mut sum = 0.0;
    for ing_token in ingredient_tokens {
        if item_tokens.iter().any(|t| t == ing_token) {
            sum += EXACT_HIT;
        } else if item_tokens.iter().any(|t| prefix_hit(ing_token, t)) {
            sum += PREFIX_HIT;
        }
    }

    (sum / ingredient_tokens.len() as f64).min(1.0)
}

/// Score an ingredient name against a single item name
pub fn score(ingredient_name: &str, item_name: &str) -> f64 {
    overlap_score(&tokenize(ingredient_name), &tokenize(item_name))
}

/// Pick the single best candidate for an ingredient, or none.
///
/// Every candidate is scored; only the overlap score against the threshold
/// decides. Ties break by item name ascending so the outcome is
/// deterministic.
pub fn best_match<'a, T: MatchCandidate>(
    ingredient_name: &str,
    candidates: &'a [T],
) -> MatchOutcome<'a, T> {
    let ingredient_tokens = tokenize(ingredient_name);
    if ingredient_tokens.is_empty() {
        return MatchOutcome { matched: None, score: 0.0 };
    }

    let mut scored: Vec<(&'a T, f64)> = Vec::new();
    for candidate in candidates {
        let item_tokens = tokenize(candidate.match_name());
        scored.push((candidate, overlap_score(&ingredient_tokens, &item_tokens)));
    }

    scored.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.match_name().cmp(b.0.match_name()))
    });

    match scored.first() {
        Some(&(candidate, best)) if best >= MATCH_THRESHOLD => MatchOutcome {
            matched: Some(candidate),
            score: best,
        },
        Some(&(_, best)) => MatchOutcome { matched: None, score: best },
        None => MatchOutcome { matched: None, score: 0.0 },
    }
}
