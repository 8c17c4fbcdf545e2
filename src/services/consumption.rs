//! Consumption hook — approved cook feedback draws down matched inventory
//!
//! Runs only for approved cook decisions with a meal id. Pantry staples are
//! never touched. Every per-ingredient failure is collected and logged, and
//! none of them aborts the hook or the enclosing feedback response.

use chrono::{DateTime, FixedOffset};
use std::sync::Arc;

use crate::matching::{best_match, tokenize};
use crate::store::{ArbiterStore, CANDIDATE_LIMIT};

/// How many of the longest ingredient tokens feed the candidate pre-filter
const PREFILTER_TOKENS: usize = 3;

/// First positive number in a qty text ("2", "1.5 lb"); 1 when unparseable
pub fn parse_qty_text(qty_text: Option<&str>) -> f64 {
    let Some(text) = qty_text else {
        return 1.0;
    };
    text.split(|c: char| !(c.is_ascii_digit() || c == '.'))
        .filter_map(|chunk| chunk.parse::<f64>().ok())
        .find(|qty| *qty > 0.0)
        .unwrap_or(1.0)
}

/// Longest-first token prefix for the ILIKE candidate query
fn prefilter_patterns(tokens: &[String]) -> Vec<String> {
    let mut sorted: Vec<String> = tokens.to_vec();
    sorted.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    sorted.truncate(PREFILTER_TOKENS);
    sorted
}

pub struct ConsumptionService {
    store: Arc<dyn ArbiterStore>,
}

impl ConsumptionService {
    pub fn new(store: Arc<dyn ArbiterStore>) -> Self {
        Self { store }
    }

    /// Draw down inventory for every matched non-staple ingredient of the
    /// cooked meal. Best-effort all the way down.
    pub async fn run(
        &self,
        household_key: &str,
        meal_id: &str,
        actioned_at: DateTime<FixedOffset>,
    ) {
        let ingredients = match self.store.ingredients_for_meal(meal_id).await {
            Ok(ingredients) => ingredients,
            Err(e) => {
                tracing::warn!("consumption hook could not load ingredients for {}: {}", meal_id, e);
                return;
            }
        };

        let mut failures: Vec<String> = Vec::new();

        for ingredient in ingredients.iter().filter(|i| !i.is_pantry_staple) {
            let tokens = tokenize(&ingredient.ingredient_name);
            if tokens.is_empty() {
                continue;
            }

            let candidates = match self
                .store
                .inventory_candidates(household_key, &prefilter_patterns(&tokens), CANDIDATE_LIMIT)
                .await
            {
                Ok(candidates) => candidates,
                Err(e) => {
                    failures.push(format!("{}: candidate query failed ({})", ingredient.ingredient_name, e));
                    continue;
                }
            };

            let outcome = best_match(&ingredient.ingredient_name, &candidates);
            let Some(matched) = outcome.matched else {
                continue;
            };

            let qty = parse_qty_text(ingredient.qty_text.as_deref());
            if let Err(e) = self.store.record_consumption(matched.id, qty, actioned_at).await {
                failures.push(format!("{}: consumption write failed ({})", ingredient.ingredient_name, e));
            }
        }

        if !failures.is_empty() {
            tracing::warn!(
                "consumption hook for meal {} finished with {} failure(s): {}",
                meal_id,
                failures.len(),
                failures.join("; ")
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qty_text_parsing() {
        assert_eq!(parse_qty_text(Some("2")), 2.0);
        assert_eq!(parse_qty_text(Some("1.5 lb")), 1.5);
        assert_eq!(parse_qty_text(Some("a pinch")), 1.0);
        assert_eq!(parse_qty_text(Some("0")), 1.0);
        assert_eq!(parse_qty_text(None), 1.0);
    }

    #[test]
    fn prefilter_takes_three_longest_tokens() {
        let tokens = tokenize("boneless skinless chicken breast strips");
        let patterns = prefilter_patterns(&tokens);
        assert_eq!(patterns.len(), 3);
        assert!(patterns.contains(&"boneless".to_string()));
        assert!(patterns.contains(&"skinless".to_string()));
    }
}
