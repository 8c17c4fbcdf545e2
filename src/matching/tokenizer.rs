//! Ingredient/item tokenizer — the shared vocabulary of the matching layer
//!
//! Rules (applied in order):
//!   1. lowercase, collapse every non-[a-z0-9] run into a single space
//!   2. drop stopwords (descriptors, package words, unit abbreviations, filler)
//!   3. drop tokens shorter than 3 chars
//!   4. dedupe preserving first occurrence, cap at 10 tokens
//!
//! The stopword set is part of the matching contract: adding a word changes
//! which item names overlap.

/// Tokens that carry no matching signal on grocery labels
const STOPWORDS: &[&str] = &[
    // freshness / quality descriptors
    "fresh", "organic", "natural", "premium", "select", "choice", "quality",
    "brand", "value", "style",
    // size descriptors
    "large", "small", "medium", "mini", "jumbo", "giant", "xl", "lg", "sm",
    // package descriptors
    "pack", "pkg", "family", "bag", "box", "bottle", "can", "jar", "case",
    "bunch", "dozen", "each",
    // unit abbreviations
    "oz", "lb", "lbs", "ct", "gal", "qt", "pt", "fl", "ml", "l", "kg", "g",
    "ea", "dz", "pk", "count",
    // common filler
    "the", "and", "for", "with", "of", "a", "an", "in", "no", "non",
];

const MAX_TOKENS: usize = 10;
const MIN_TOKEN_LEN: usize = 3;

/// Tokenize a free-form ingredient or item name.
///
/// Deterministic and pure; empty or all-noise input yields an empty vec.
pub fn tokenize(input: &str) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();

    let mut current = String::new();
    for ch in input.chars() {
        let ch = ch.to_ascii_lowercase();
        if ch.is_ascii_alphanumeric() {
            current.push(ch);
        } else if !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }

    let mut out: Vec<String> = Vec::new();
    for token in tokens {
        if token.len() < MIN_TOKEN_LEN {
            continue;
        }
        if STOPWORDS.contains(&token.as_str()) {
            continue;
        }
        if out.iter().any(|t| t == &token) {
            continue;
        }
        out.push(token);
        if out.len() == MAX_TOKENS {
            break;
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_splits_on_noise() {
        assert_eq!(
            tokenize("Chicken-Breast (Boneless)"),
            vec!["chicken", "breast", "boneless"]
        );
    }

    #[test]
    fn drops_stopwords_and_short_tokens() {
        assert_eq!(tokenize("Fresh Organic 2% Milk 1 GAL"), vec!["milk"]);
        assert_eq!(tokenize("eggs lg 12 ct"), vec!["eggs"]);
    }

    #[test]
    fn all_noise_yields_empty() {
        assert_eq!(tokenize("2 lb oz"), Vec::<String>::new());
        assert_eq!(tokenize(""), Vec::<String>::new());
        assert_eq!(tokenize("   --- !!"), Vec::<String>::new());
    }

    #[test]
    fn dedupes_preserving_first_occurrence() {
        assert_eq!(
            tokenize("tomato roma tomato"),
            vec!["tomato", "roma"]
        );
    }

    #[test]
    fn caps_at_ten_tokens() {
        let long = "alpha bravo charlie delta echo foxtrot golf hotel india juliet kilo lima";
        let tokens = tokenize(long);
        assert_eq!(tokens.len(), 10);
        assert_eq!(tokens[0], "alpha");
        assert_eq!(tokens[9], "juliet");
    }

    #[test]
    fn numbers_survive_when_long_enough() {
        assert_eq!(tokenize("v8 100 juice"), vec!["100", "juice"]);
    }
}
