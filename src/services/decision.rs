//! Arbiter core — exactly one dinner action per request
//!
//! Scoring formula per candidate meal (weights sum to 0.95, leaving room
//! for the rotation penalty and exploration noise):
//!   inventory_score × 0.60  — decayed, match-weighted pantry coverage
//!   taste_value     × 0.35  — sigmoid(score / 5) of the learned meal score
//!   rotation penalty −0.20  — meal is among the last 7 approved meals
//!   noise           ≤ 0.05  — deterministic per (context hash, meal id)
//!
//! Selection is deterministic: ties break by canonical key ascending and
//! the noise seed is the context hash, so identical inputs always pick the
//! same meal. No list of alternatives ever leaves this module.

use chrono::{DateTime, Duration, FixedOffset};
use serde_json::json;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use uuid::Uuid;

use crate::entity::{decision_event, inventory_item, meal, meal_ingredient, taste_meal_score};
use crate::errors::AppError;
use crate::matching::best_match;
use crate::models::decision::{DecisionCard, DecisionRequest, DecisionResponse};
use crate::models::types::{notes, ContextSignal, DecisionType, UserAction};
use crate::services::autopilot::{self, AutopilotInput};
use crate::services::consumption::ConsumptionService;
use crate::services::drm;
use crate::services::inventory::{decayed_confidence, remaining_quantity, AVAILABILITY_THRESHOLD};
use crate::services::taste::TasteService;
use crate::store::{ArbiterStore, RECENT_EVENT_LIMIT};

/// Matcher score at or above this counts as a strong match
pub const STRONG_MATCH_THRESHOLD: f64 = 0.80;

/// Weak matches cannot contribute more than this, however confident the item
pub const WEAK_MATCH_CAP: f64 = 0.50;

/// How many recent approved meals draw the rotation penalty
pub const ROTATION_WINDOW: usize = 7;
pub const ROTATION_PENALTY: f64 = 0.20;

pub const MAX_EXPLORATION_NOISE: f64 = 0.05;

pub const WEIGHT_INVENTORY: f64 = 0.60;
pub const WEIGHT_TASTE: f64 = 0.35;

/// Meals rejected within this window are excluded outright
pub const REJECTION_EXCLUSION_HOURS: i64 = 24;

/// Top-K meals feeding the household fallback scores
pub const FALLBACK_TOP_K: usize = 3;

/// Whole-request deadline; on expiry the response is DRM, never partial
pub const DECISION_TIMEOUT_SECS: u64 = 30;

/// Best-effort hooks get this much and never extend the parent deadline
pub const HOOK_TIMEOUT_SECS: u64 = 2;

pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Taste value in (0, 1); a missing score is neutral
pub fn taste_value(raw_score: Option<f64>) -> f64 {
    match raw_score {
        Some(score) => sigmoid(score / 5.0),
        None => 0.5,
    }
}

/// Deterministic exploration noise in [0, MAX_EXPLORATION_NOISE].
/// No context hash means no noise, which is what deterministic tests rely on.
pub fn exploration_noise(context_hash: Option<&str>, meal_id: &str) -> f64 {
    let Some(hash) = context_hash.filter(|h| !h.is_empty()) else {
        return 0.0;
    };
    let mut hasher = Sha256::new();
    hasher.update(hash.as_bytes());
    hasher.update(b"|");
    hasher.update(meal_id.as_bytes());
    let digest = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    (u64::from_be_bytes(bytes) as f64 / u64::MAX as f64) * MAX_EXPLORATION_NOISE
}

/// Stable fingerprint of the decision inputs, day-granular so a same-day
/// retry of the same signal is idempotent. Callers treat it as opaque.
pub fn context_hash(
    household_key: &str,
    now: DateTime<FixedOffset>,
    signal: &ContextSignal,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(household_key.as_bytes());
    hasher.update(b"|");
    hasher.update(now.date_naive().to_string().as_bytes());
    hasher.update(b"|");
    hasher.update(format!("{:?}|{:?}|{}", signal.time_window, signal.energy, signal.calendar_conflict).as_bytes());
    hex::encode(hasher.finalize())
}

/// Context fingerprint for rescue events
pub fn context_hash_for_rescue(
    household_key: &str,
    now: DateTime<FixedOffset>,
    trigger_reason: &str,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(household_key.as_bytes());
    hasher.update(b"|");
    hasher.update(now.date_naive().to_string().as_bytes());
    hasher.update(b"|drm|");
    hasher.update(trigger_reason.as_bytes());
    hex::encode(hasher.finalize())
}

/// Everything the arbiter looks at for one request
pub struct ArbiterState<'a> {
    pub meals: &'a [meal::Model],
    pub ingredients: &'a [meal_ingredient::Model],
    pub inventory: &'a [inventory_item::Model],
    pub recent_events: &'a [decision_event::Model],
    pub taste_scores: &'a [taste_meal_score::Model],
}

/// A candidate with its component scores
#[derive(Debug)]
pub struct ScoredMeal<'a> {
    pub meal: &'a meal::Model,
    pub inventory_score: f64,
    pub taste: f64,
    pub final_score: f64,
}

/// Mean per-ingredient inventory contribution for one meal.
///
/// Pantry staples always contribute 1.0. A non-staple contributes the
/// matched item's decayed confidence times the match score, except that a
/// weak match (below STRONG_MATCH_THRESHOLD) is capped at WEAK_MATCH_CAP —
/// a confident pantry item that only loosely matches must not carry the
/// meal. No ingredients at all is neutral.
pub fn meal_inventory_score(
    meal_id: &str,
    ingredients: &[meal_ingredient::Model],
    inventory: &[inventory_item::Model],
    now: DateTime<FixedOffset>,
) -> f64 {
    let own: Vec<&meal_ingredient::Model> =
        ingredients.iter().filter(|i| i.meal_id == meal_id).collect();
    if own.is_empty() {
        return 0.5;
    }

    let mut sum = 0.0;
    for ingredient in &own {
        if ingredient.is_pantry_staple {
            sum += 1.0;
            continue;
        }

        let outcome = best_match(&ingredient.ingredient_name, inventory);
        let Some(item) = outcome.matched else {
            continue;
        };

        let confidence = decayed_confidence(item, now);
        if confidence < AVAILABILITY_THRESHOLD {
            continue;
        }
        if let Some(remaining) = remaining_quantity(item, now) {
            if remaining <= 0.0 {
                continue;
            }
        }

        let mut contribution = confidence * outcome.score;
        if outcome.score < STRONG_MATCH_THRESHOLD {
            contribution = contribution.min(WEAK_MATCH_CAP);
        }
        sum += contribution;
    }

    sum / own.len() as f64
}

fn event_time(event: &decision_event::Model) -> DateTime<FixedOffset> {
    event.actioned_at.unwrap_or(event.decided_at)
}

/// Meal ids of the most recent approved meals, newest first
fn rotation_list(recent_events: &[decision_event::Model]) -> Vec<&str> {
    recent_events
        .iter()
        .filter(|e| e.user_action == UserAction::Approved.as_str())
        .filter_map(|e| e.meal_id.as_deref())
        .take(ROTATION_WINDOW)
        .collect()
}

/// Meal ids rejected within the exclusion window
fn rejected_recently(
    recent_events: &[decision_event::Model],
    now: DateTime<FixedOffset>,
) -> Vec<&str> {
    let cutoff = now - Duration::hours(REJECTION_EXCLUSION_HOURS);
    recent_events
        .iter()
        .filter(|e| e.user_action == UserAction::Rejected.as_str() && event_time(e) >= cutoff)
        .filter_map(|e| e.meal_id.as_deref())
        .collect()
}

/// Score every surviving candidate. Deterministic ordering: score
/// descending, canonical key ascending.
pub fn score_candidates<'a>(
    state: &ArbiterState<'a>,
    now: DateTime<FixedOffset>,
    context_hash: Option<&str>,
) -> Vec<ScoredMeal<'a>> {
    let rejected = rejected_recently(state.recent_events, now);
    let rotation = rotation_list(state.recent_events);

    let mut scored: Vec<ScoredMeal<'a>> = state
        .meals
        .iter()
        .filter(|m| m.active)
        .filter(|m| !rejected.contains(&m.id.as_str()))
        .map(|m| {
            let inventory_score =
                meal_inventory_score(&m.id, state.ingredients, state.inventory, now);
            let raw_taste = state
                .taste_scores
                .iter()
                .find(|s| s.meal_id == m.id)
                .map(|s| s.score);
            let taste = taste_value(raw_taste);
            let penalty = if rotation.contains(&m.id.as_str()) {
                -ROTATION_PENALTY
            } else {
                0.0
            };
            let noise = exploration_noise(context_hash, &m.id);
            let final_score =
                WEIGHT_INVENTORY * inventory_score + WEIGHT_TASTE * taste + penalty + noise;
            ScoredMeal { meal: m, inventory_score, taste, final_score }
        })
        .collect();

    scored.sort_by(|a, b| {
        b.final_score
            .partial_cmp(&a.final_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.meal.canonical_key.cmp(&b.meal.canonical_key))
    });
    scored
}

/// The single winner, or None when no candidate survives
pub fn select_meal<'a>(
    state: &ArbiterState<'a>,
    now: DateTime<FixedOffset>,
    context_hash: Option<&str>,
) -> Option<ScoredMeal<'a>> {
    score_candidates(state, now, context_hash).into_iter().next()
}

/// Household fallback inventory score: mean of the top-K candidate meals
pub fn household_inventory_fallback(scored: &[ScoredMeal<'_>]) -> f64 {
    if scored.is_empty() {
        return 0.5;
    }
    let mut scores: Vec<f64> = scored.iter().map(|s| s.inventory_score).collect();
    scores.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
    scores.truncate(FALLBACK_TOP_K);
    scores.iter().sum::<f64>() / scores.len() as f64
}

/// Household fallback taste score: sigmoid of the mean top-K raw scores
pub fn household_taste_fallback(state: &ArbiterState<'_>) -> f64 {
    if state.taste_scores.is_empty() {
        return 0.5;
    }
    let mut raw: Vec<f64> = state.taste_scores.iter().map(|s| s.score).collect();
    raw.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
    raw.truncate(FALLBACK_TOP_K);
    sigmoid(raw.iter().sum::<f64>() / raw.len() as f64 / 5.0)
}

// ── Decision orchestration ───────────────────────────────────────────────────

pub struct DecisionService {
    store: Arc<dyn ArbiterStore>,
    taste: TasteService,
    consumption: ConsumptionService,
}

impl DecisionService {
    pub fn new(store: Arc<dyn ArbiterStore>) -> Self {
        Self {
            taste: TasteService::new(store.clone()),
            consumption: ConsumptionService::new(store.clone()),
            store,
        }
    }

    /// The /decision contract: one decision, DRM routing, or timeout-DRM.
    pub async fn decide(
        &self,
        household_key: &str,
        request: &DecisionRequest,
    ) -> Result<DecisionResponse, AppError> {
        let deadline = std::time::Duration::from_secs(DECISION_TIMEOUT_SECS);
        match tokio::time::timeout(deadline, self.run(household_key, request)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!("decision deadline expired for household {}", household_key);
                Ok(DecisionResponse::drm("timeout"))
            }
        }
    }

    async fn run(
        &self,
        household_key: &str,
        request: &DecisionRequest,
    ) -> Result<DecisionResponse, AppError> {
        let now = DateTime::parse_from_rfc3339(&request.now_iso)
            .map_err(|_| AppError::BadRequest("nowIso must be ISO-8601 with offset".into()))?;

        let recent = self.store.recent_events(household_key, RECENT_EVENT_LIMIT).await?;

        // DRM triggers suppress the normal decision entirely
        if let Some(reason) = drm::evaluate_triggers(now, &request.signal, &recent) {
            return Ok(DecisionResponse::drm(reason));
        }

        let meals = self.store.active_meals().await?;
        let meal_ids: Vec<String> = meals.iter().map(|m| m.id.clone()).collect();
        let ingredients = self.store.ingredients_for_meals(&meal_ids).await?;
        let inventory = self.store.inventory_for_household(household_key).await?;
        let taste_rows = self.store.taste_scores(household_key).await?;

        let state = ArbiterState {
            meals: &meals,
            ingredients: &ingredients,
            inventory: &inventory,
            recent_events: &recent,
            taste_scores: &taste_rows,
        };

        let ctx = context_hash(household_key, now, &request.signal);
        let scored = score_candidates(&state, now, Some(&ctx));
        let Some(winner) = scored.first() else {
            return Ok(DecisionResponse::drm("no_candidates"));
        };

        let inventory_fallback = household_inventory_fallback(&scored);
        let taste_fallback = household_taste_fallback(&state);

        let eligibility = autopilot::evaluate_gates(&AutopilotInput {
            now,
            signal: &request.signal,
            inventory_score: inventory_fallback,
            taste_score: taste_fallback,
            meal_id: &winner.meal.id,
            recent_events: &recent,
        });
        let throttled = autopilot::undo_throttled(&recent, now);

        let payload = json!({
            "decisionType": DecisionType::Cook,
            "mealId": winner.meal.id,
            "title": winner.meal.display_name,
            "stepsShort": winner.meal.steps_short,
            "estMinutes": winner.meal.est_minutes,
            "inventoryScore": winner.inventory_score,
            "tasteValue": winner.taste,
        });

        let card = |event_id: Uuid| DecisionCard {
            decision_type: DecisionType::Cook,
            decision_event_id: event_id,
            meal_id: Some(winner.meal.id.clone()),
            vendor_key: None,
            title: winner.meal.display_name.clone(),
            steps_short: winner.meal.steps_short.clone(),
            est_minutes: winner.meal.est_minutes,
            context_hash: ctx.clone(),
        };

        if eligibility.eligible && !throttled {
            // Autopilot: insert the approved row directly, idempotent on
            // (household, context_hash, notes="autopilot")
            let event_id = Uuid::new_v4();
            let event = decision_event::Model {
                id: event_id,
                household_key: household_key.to_string(),
                decided_at: now,
                decision_type: DecisionType::Cook.as_str().to_string(),
                meal_id: Some(winner.meal.id.clone()),
                external_vendor_key: None,
                context_hash: ctx.clone(),
                decision_payload: payload,
                user_action: UserAction::Approved.as_str().to_string(),
                actioned_at: Some(now),
                notes: Some(notes::AUTOPILOT.to_string()),
            };

            match self.store.insert_event(event.clone()).await {
                Ok(()) => {
                    self.run_approval_hooks(&event).await;
                    Ok(DecisionResponse::decided(card(event_id), true))
                }
                Err(e) if e.is_unique_violation() => {
                    // Retry of the same context: reuse the canonical row and
                    // run nothing again. The card reflects the meal that was
                    // actually autopiloted, which may differ from today's
                    // recomputed winner.
                    let prior = self.store.find_autopilot_event(household_key, &ctx).await?;
                    let response_card = match prior {
                        Some(prior) if prior.meal_id.as_deref() != Some(winner.meal.id.as_str()) => {
                            let prior_meal = match &prior.meal_id {
                                Some(id) => self.store.meal_by_id(id).await?,
                                None => None,
                            };
                            match prior_meal {
                                Some(meal) => DecisionCard {
                                    decision_type: DecisionType::Cook,
                                    decision_event_id: prior.id,
                                    meal_id: Some(meal.id.clone()),
                                    vendor_key: None,
                                    title: meal.display_name,
                                    steps_short: meal.steps_short,
                                    est_minutes: meal.est_minutes,
                                    context_hash: ctx.clone(),
                                },
                                None => card(prior.id),
                            }
                        }
                        Some(prior) => card(prior.id),
                        None => card(event_id),
                    };
                    Ok(DecisionResponse::decided(response_card, true))
                }
                Err(e) => Err(e),
            }
        } else {
            if throttled {
                tracing::debug!("autopilot suppressed by recent undo for {}", household_key);
            } else {
                tracing::debug!("autopilot ineligible: {}", eligibility.reason);
            }

            let event_id = Uuid::new_v4();
            self.store
                .insert_event(decision_event::Model {
                    id: event_id,
                    household_key: household_key.to_string(),
                    decided_at: now,
                    decision_type: DecisionType::Cook.as_str().to_string(),
                    meal_id: Some(winner.meal.id.clone()),
                    external_vendor_key: None,
                    context_hash: ctx.clone(),
                    decision_payload: payload,
                    user_action: UserAction::Pending.as_str().to_string(),
                    actioned_at: None,
                    notes: None,
                })
                .await?;

            Ok(DecisionResponse::decided(card(event_id), false))
        }
    }

    /// Consumption then taste, each best-effort under a tight sub-deadline
    async fn run_approval_hooks(&self, event: &decision_event::Model) {
        let hook_deadline = std::time::Duration::from_secs(HOOK_TIMEOUT_SECS);
        let actioned_at = event.actioned_at.unwrap_or(event.decided_at);

        if event.decision_type == DecisionType::Cook.as_str() {
            if let Some(meal_id) = &event.meal_id {
                if tokio::time::timeout(
                    hook_deadline,
                    self.consumption.run(&event.household_key, meal_id, actioned_at),
                )
                .await
                .is_err()
                {
                    tracing::warn!("consumption hook timed out for event {}", event.id);
                }
            }
        }

        match tokio::time::timeout(hook_deadline, self.taste.apply(event)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) if e.is_unique_violation() => {
                tracing::debug!("taste signal for event {} already processed", event.id);
            }
            Ok(Err(e)) => {
                tracing::warn!("taste updater failed for event {}: {}", event.id, e);
            }
            Err(_) => {
                tracing::warn!("taste updater timed out for event {}", event.id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::seed;

    fn at(iso: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(iso).unwrap()
    }

    fn now() -> DateTime<FixedOffset> {
        at("2026-01-20T18:30:00-06:00")
    }

    fn inventory_item(name: &str, confidence: f64, qty: Option<f64>) -> inventory_item::Model {
        inventory_item::Model {
            id: Uuid::new_v4(),
            household_key: "hh-1".to_string(),
            item_name: name.to_string(),
            qty_estimated: qty,
            qty_used_estimated: 0.0,
            unit: None,
            confidence,
            source: "receipt".to_string(),
            last_seen_at: now(),
            last_used_at: None,
            expiry_date: None,
            decay_rate_per_day: 0.05,
            created_at: now(),
        }
    }

    fn ingredient(meal_id: &str, name: &str, staple: bool) -> meal_ingredient::Model {
        meal_ingredient::Model {
            id: 0,
            meal_id: meal_id.to_string(),
            ingredient_name: name.to_string(),
            qty_text: None,
            is_pantry_staple: staple,
        }
    }

    #[test]
    fn sigmoid_shapes_taste() {
        assert!((taste_value(None) - 0.5).abs() < 1e-9);
        assert!((taste_value(Some(0.0)) - 0.5).abs() < 1e-9);
        assert!(taste_value(Some(5.0)) > 0.7);
        assert!(taste_value(Some(-5.0)) < 0.3);
        for raw in [-100.0, -1.0, 0.0, 1.0, 100.0] {
            let v = taste_value(Some(raw));
            assert!(v > 0.0 && v < 1.0);
        }
    }

    #[test]
    fn strong_match_contributes_full_product() {
        let ingredients = vec![ingredient("m1", "chicken", false)];
        let inventory = vec![inventory_item(
            "chicken breast boneless skinless organic pack",
            1.0,
            Some(5.0),
        )];
        let score = meal_inventory_score("m1", &ingredients, &inventory, now());
        assert!((score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn weak_match_is_capped() {
        // 2 of 3 tokens match: m ≈ 0.667, below the strong threshold, so the
        // contribution caps at 0.50 even with confidence 1.0
        let ingredients = vec![ingredient("m1", "chicken breast rice", false)];
        let inventory = vec![inventory_item("chicken breast salad wrap", 1.0, Some(5.0))];
        let score = meal_inventory_score("m1", &ingredients, &inventory, now());
        assert!((score - WEAK_MATCH_CAP).abs() < 1e-9);
    }

    #[test]
    fn staples_always_contribute() {
        let ingredients = vec![
            ingredient("m1", "rice", true),
            ingredient("m1", "saffron threads", false),
        ];
        let score = meal_inventory_score("m1", &ingredients, &[], now());
        assert!((score - 0.5).abs() < 1e-9);
    }

    #[test]
    fn no_ingredients_is_neutral() {
        assert!((meal_inventory_score("m1", &[], &[], now()) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn depleted_or_doubtful_items_contribute_nothing() {
        let ingredients = vec![ingredient("m1", "chicken breast", false)];

        let depleted = vec![inventory_item("chicken breast", 0.9, Some(0.0))];
        assert_eq!(meal_inventory_score("m1", &ingredients, &depleted, now()), 0.0);

        let doubtful = vec![inventory_item("chicken breast", 0.4, Some(5.0))];
        assert_eq!(meal_inventory_score("m1", &ingredients, &doubtful, now()), 0.0);
    }

    #[test]
    fn noise_is_deterministic_and_bounded() {
        let a = exploration_noise(Some("ctx-hash"), "meal-001");
        let b = exploration_noise(Some("ctx-hash"), "meal-001");
        assert_eq!(a, b);
        assert!((0.0..=MAX_EXPLORATION_NOISE).contains(&a));

        assert_ne!(
            exploration_noise(Some("ctx-hash"), "meal-001"),
            exploration_noise(Some("ctx-hash"), "meal-002")
        );
        assert_eq!(exploration_noise(None, "meal-001"), 0.0);
        assert_eq!(exploration_noise(Some(""), "meal-001"), 0.0);
    }

    #[test]
    fn selection_is_deterministic_and_tie_breaks_by_canonical_key() {
        let (meals, _) = seed::meal_library();
        let state = ArbiterState {
            meals: &meals,
            ingredients: &[],
            inventory: &[],
            recent_events: &[],
            taste_scores: &[],
        };

        // No ingredients loaded: every meal scores neutral 0.5 inventory and
        // 0.5 taste, so the canonical-key tie-break decides
        let first = select_meal(&state, now(), None).unwrap();
        let second = select_meal(&state, now(), None).unwrap();
        assert_eq!(first.meal.id, second.meal.id);

        let min_key = meals.iter().map(|m| &m.canonical_key).min().unwrap();
        assert_eq!(&first.meal.canonical_key, min_key);
    }

    #[test]
    fn recent_rejections_exclude_meals() {
        let (meals, _) = seed::meal_library();
        let rejection = decision_event::Model {
            id: Uuid::new_v4(),
            household_key: "hh-1".to_string(),
            decided_at: at("2026-01-20T10:00:00-06:00"),
            decision_type: "cook".to_string(),
            meal_id: Some(meals[0].id.clone()),
            external_vendor_key: None,
            context_hash: "ctx".to_string(),
            decision_payload: json!({}),
            user_action: "rejected".to_string(),
            actioned_at: Some(at("2026-01-20T10:00:00-06:00")),
            notes: None,
        };
        let events = vec![rejection];
        let state = ArbiterState {
            meals: &meals,
            ingredients: &[],
            inventory: &[],
            recent_events: &events,
            taste_scores: &[],
        };
        let scored = score_candidates(&state, now(), None);
        assert!(scored.iter().all(|s| s.meal.id != meals[0].id));
    }

    #[test]
    fn rotation_penalty_applies_to_recent_approvals() {
        let (meals, _) = seed::meal_library();
        let approved = decision_event::Model {
            id: Uuid::new_v4(),
            household_key: "hh-1".to_string(),
            decided_at: at("2026-01-18T18:00:00-06:00"),
            decision_type: "cook".to_string(),
            meal_id: Some(meals[0].id.clone()),
            external_vendor_key: None,
            context_hash: "ctx".to_string(),
            decision_payload: json!({}),
            user_action: "approved".to_string(),
            actioned_at: Some(at("2026-01-18T18:00:00-06:00")),
            notes: None,
        };
        let events = vec![approved];
        let state = ArbiterState {
            meals: &meals,
            ingredients: &[],
            inventory: &[],
            recent_events: &events,
            taste_scores: &[],
        };
        let scored = score_candidates(&state, now(), None);
        let penalized = scored.iter().find(|s| s.meal.id == meals[0].id).unwrap();
        let unpenalized = scored.iter().find(|s| s.meal.id != meals[0].id).unwrap();
        assert!(
            (unpenalized.final_score - penalized.final_score - ROTATION_PENALTY).abs() < 1e-9
        );
    }

    #[test]
    fn no_active_meals_yields_none() {
        let state = ArbiterState {
            meals: &[],
            ingredients: &[],
            inventory: &[],
            recent_events: &[],
            taste_scores: &[],
        };
        assert!(select_meal(&state, now(), None).is_none());
    }

    #[test]
    fn context_hash_is_stable_and_household_scoped() {
        use crate::models::types::{EnergyLevel, TimeWindow};
        let signal = ContextSignal {
            time_window: TimeWindow::Dinner,
            energy: EnergyLevel::Normal,
            calendar_conflict: false,
        };
        let a = context_hash("hh-1", now(), &signal);
        let b = context_hash("hh-1", now(), &signal);
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert_ne!(a, context_hash("hh-2", now(), &signal));

        // same day, different clock time: same fingerprint
        let later = at("2026-01-20T21:00:00-06:00");
        assert_eq!(a, context_hash("hh-1", later, &signal));
    }

    #[test]
    fn fallback_scores_default_to_neutral() {
        let state = ArbiterState {
            meals: &[],
            ingredients: &[],
            inventory: &[],
            recent_events: &[],
            taste_scores: &[],
        };
        assert_eq!(household_inventory_fallback(&[]), 0.5);
        assert_eq!(household_taste_fallback(&state), 0.5);
    }
}
