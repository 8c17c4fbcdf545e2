//! Taste updater — feedback into signals and per-meal score cache
//!
//! Weights per action:
//!   approved +1.0, rejected -1.0, drm_triggered -0.5, expired -0.2
//! Actions landing at or after the stress hour (local 8 PM) are multiplied
//! by 1.10; the final weight is clamped to [-2.0, +2.0].
//!
//! The signal insert is the idempotency gate: the score upsert only runs
//! after a fresh signal row, so retries never double-count. Undo feedback
//! inserts a signal but leaves taste_meal_scores untouched.

use chrono::{DateTime, FixedOffset, Timelike};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::entity::decision_event;
use crate::errors::AppError;
use crate::matching::tokenize;
use crate::models::types::{notes, UserAction};
use crate::store::ArbiterStore;

pub const WEIGHT_APPROVED: f64 = 1.0;
pub const WEIGHT_REJECTED: f64 = -1.0;
pub const WEIGHT_DRM_TRIGGERED: f64 = -0.5;
pub const WEIGHT_EXPIRED: f64 = -0.2;

/// Local hour at which the stress multiplier kicks in
pub const STRESS_HOUR: u32 = 20;
pub const STRESS_MULTIPLIER: f64 = 1.10;

/// Final weights never leave this band
pub const WEIGHT_CLAMP: f64 = 2.0;

/// Feature snapshots carry at most this many ingredient tokens
pub const MAX_FEATURE_TOKENS: usize = 20;

/// Signed weight for one feedback action. The stress multiplier reads the
/// local clock fields of actioned_at; without a timestamp it never applies.
pub fn compute_weight(action: UserAction, actioned_at: Option<DateTime<FixedOffset>>) -> f64 {
    let base = match action {
        UserAction::Approved => WEIGHT_APPROVED,
        UserAction::Rejected => WEIGHT_REJECTED,
        UserAction::DrmTriggered => WEIGHT_DRM_TRIGGERED,
        UserAction::Expired => WEIGHT_EXPIRED,
        UserAction::Pending => 0.0,
    };

    let weighted = match actioned_at {
        Some(at) if at.hour() >= STRESS_HOUR => base * STRESS_MULTIPLIER,
        _ => base,
    };

    weighted.clamp(-WEIGHT_CLAMP, WEIGHT_CLAMP)
}

pub struct TasteService {
    store: Arc<dyn ArbiterStore>,
}

impl TasteService {
    pub fn new(store: Arc<dyn ArbiterStore>) -> Self {
        Self { store }
    }

    /// Snapshot of meal features at decision time, persisted on the signal
    async fn meal_features(&self, meal_id: &str) -> Result<serde_json::Value, AppError> {
        let Some(meal) = self.store.meal_by_id(meal_id).await? else {
            return Ok(json!({}));
        };
        let ingredients = self.store.ingredients_for_meal(meal_id).await?;

        let mut tokens: Vec<String> = Vec::new();
        for ingredient in &ingredients {
            for token in tokenize(&ingredient.ingredient_name) {
                if !tokens.contains(&token) {
                    tokens.push(token);
                }
            }
        }
        tokens.sort();
        tokens.truncate(MAX_FEATURE_TOKENS);

        let pantry_friendly =
            !ingredients.is_empty() && ingredients.iter().all(|i| i.is_pantry_staple);

        Ok(json!({
            "canonicalKey": meal.canonical_key,
            "estMinutes": meal.est_minutes,
            "costBand": meal.cost_band,
            "pantryFriendly": pantry_friendly,
            "ingredientTokens": tokens,
        }))
    }

    /// Process one feedback-copy (or autopilot) event.
    ///
    /// A unique-violation on the signal insert surfaces to the caller, which
    /// treats it as "already processed" and must not retry. Any error here
    /// is best-effort territory: the enclosing feedback response succeeds
    /// regardless.
    pub async fn apply(&self, event: &decision_event::Model) -> Result<(), AppError> {
        let Some(action) = UserAction::parse(&event.user_action) else {
            return Err(AppError::Internal(format!(
                "unknown user_action {:?}",
                event.user_action
            )));
        };

        let weight = compute_weight(action, event.actioned_at);

        let features = match &event.meal_id {
            Some(meal_id) => self.meal_features(meal_id).await?,
            None => json!({}),
        };

        // Insert first: the unique index on decision_event_id makes this the
        // at-most-once gate for everything below
        self.store
            .insert_taste_signal(crate::entity::taste_signal::Model {
                id: Uuid::new_v4(),
                household_key: event.household_key.clone(),
                decided_at: event.decided_at,
                actioned_at: event.actioned_at,
                decision_event_id: event.id,
                meal_id: event.meal_id.clone(),
                decision_type: event.decision_type.clone(),
                user_action: event.user_action.clone(),
                context_hash: event.context_hash.clone(),
                features,
                weight,
            })
            .await?;

        // Undo cancels the user-action contribution to per-meal scores
        if event.notes.as_deref() == Some(notes::UNDO_AUTOPILOT) {
            return Ok(());
        }

        if let Some(meal_id) = &event.meal_id {
            let seen_at = event.actioned_at.unwrap_or(event.decided_at);
            self.store
                .upsert_taste_score(
                    &event.household_key,
                    meal_id,
                    weight,
                    action == UserAction::Approved,
                    action == UserAction::Rejected,
                    seen_at,
                )
                .await?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(iso: &str) -> Option<DateTime<FixedOffset>> {
        Some(DateTime::parse_from_rfc3339(iso).unwrap())
    }

    #[test]
    fn base_weights() {
        assert_eq!(compute_weight(UserAction::Approved, at("2026-01-20T18:00:00-06:00")), 1.0);
        assert_eq!(compute_weight(UserAction::Rejected, at("2026-01-20T18:00:00-06:00")), -1.0);
        assert_eq!(
            compute_weight(UserAction::DrmTriggered, at("2026-01-20T18:00:00-06:00")),
            -0.5
        );
        assert_eq!(compute_weight(UserAction::Expired, at("2026-01-20T18:00:00-06:00")), -0.2);
    }

    #[test]
    fn stress_hour_multiplies_by_local_clock() {
        // 8 PM local, regardless of what that is in UTC
        let w = compute_weight(UserAction::Approved, at("2026-01-20T20:00:00-06:00"));
        assert!((w - 1.10).abs() < 1e-9);

        let w = compute_weight(UserAction::Rejected, at("2026-01-20T23:15:00+02:00"));
        assert!((w + 1.10).abs() < 1e-9);

        // 7:59 PM is not stressed
        let w = compute_weight(UserAction::Approved, at("2026-01-20T19:59:00-06:00"));
        assert!((w - 1.0).abs() < 1e-9);
    }

    #[test]
    fn missing_timestamp_means_no_multiplier() {
        assert_eq!(compute_weight(UserAction::Approved, None), 1.0);
    }

    #[test]
    fn weight_stays_in_clamp_band() {
        for action in [
            UserAction::Approved,
            UserAction::Rejected,
            UserAction::DrmTriggered,
            UserAction::Expired,
        ] {
            let w = compute_weight(action, at("2026-01-20T22:00:00-06:00"));
            assert!((-WEIGHT_CLAMP..=WEIGHT_CLAMP).contains(&w));
        }
    }
}
