//! In-memory store backend — deterministic, seeded on first use
//!
//! Mirrors the Postgres backend's ordering and uniqueness semantics so the
//! same tests pass against either. Used when DATABASE_URL is absent (dev
//! mode) and by the test suite. `reset` restores the seeded state.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::entity::{
    decision_event, inventory_item, meal, meal_ingredient, receipt_import, receipt_line_item,
    taste_meal_score, taste_signal,
};
use crate::errors::AppError;
use crate::models::types::notes;
use crate::store::{seed, ArbiterStore};

#[derive(Default)]
struct MemState {
    meals: Vec<meal::Model>,
    meal_ingredients: Vec<meal_ingredient::Model>,
    inventory: Vec<inventory_item::Model>,
    events: Vec<decision_event::Model>,
    receipts: Vec<receipt_import::Model>,
    receipt_lines: Vec<receipt_line_item::Model>,
    taste_signals: Vec<taste_signal::Model>,
    taste_scores: Vec<taste_meal_score::Model>,
    seeded: bool,
}

impl MemState {
    fn ensure_seeded(&mut self) {
        if self.seeded {
            return;
        }
        let (meals, ingredients) = seed::meal_library();
        self.meals = meals;
        self.meal_ingredients = ingredients;
        self.seeded = true;
    }
}

pub struct MemoryStore {
    state: Mutex<MemState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self { state: Mutex::new(MemState::default()) }
    }

    /// Drop all household state and reload the seed library
    pub async fn reset(&self) {
        let mut state = self.state.lock().await;
        *state = MemState::default();
        state.ensure_seeded();
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ArbiterStore for MemoryStore {
    // ── Meal library ─────────────────────────────────────────────────────

    async fn active_meals(&self) -> Result<Vec<meal::Model>, AppError> {
        let mut state = self.state.lock().await;
        state.ensure_seeded();
        let mut meals: Vec<meal::Model> =
            state.meals.iter().filter(|m| m.active).cloned().collect();
        meals.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(meals)
    }

    async fn meal_by_id(&self, meal_id: &str) -> Result<Option<meal::Model>, AppError> {
        let mut state = self.state.lock().await;
        state.ensure_seeded();
        Ok(state.meals.iter().find(|m| m.id == meal_id).cloned())
    }

    async fn ingredients_for_meal(
        &self,
        meal_id: &str,
    ) -> Result<Vec<meal_ingredient::Model>, AppError> {
        let mut state = self.state.lock().await;
        state.ensure_seeded();
        Ok(state
            .meal_ingredients
            .iter()
            .filter(|i| i.meal_id == meal_id)
            .cloned()
            .collect())
    }

    async fn ingredients_for_meals(
        &self,
        meal_ids: &[String],
    ) -> Result<Vec<meal_ingredient::Model>, AppError> {
        let mut state = self.state.lock().await;
        state.ensure_seeded();
        Ok(state
            .meal_ingredients
            .iter()
            .filter(|i| meal_ids.contains(&i.meal_id))
            .cloned()
            .collect())
    }

    // ── Inventory ────────────────────────────────────────────────────────

    async fn inventory_for_household(
        &self,
        household_key: &str,
    ) -> Result<Vec<inventory_item::Model>, AppError> {
        let state = self.state.lock().await;
        Ok(state
            .inventory
            .iter()
            .filter(|i| i.household_key == household_key)
            .cloned()
            .collect())
    }

    async fn inventory_candidates(
        &self,
        household_key: &str,
        patterns: &[String],
        limit: u64,
    ) -> Result<Vec<inventory_item::Model>, AppError> {
        let state = self.state.lock().await;
        let needles: Vec<String> = patterns.iter().map(|p| p.to_lowercase()).collect();
        let mut matches: Vec<inventory_item::Model> = state
            .inventory
            .iter()
            .filter(|i| i.household_key == household_key)
            .filter(|i| {
                let name = i.item_name.to_lowercase();
                needles.iter().any(|n| name.contains(n.as_str()))
            })
            .cloned()
            .collect();
        matches.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.last_seen_at.cmp(&a.last_seen_at))
        });
        matches.truncate(limit as usize);
        Ok(matches)
    }

    async fn insert_inventory_item(&self, item: inventory_item::Model) -> Result<(), AppError> {
        let mut state = self.state.lock().await;
        if state.inventory.iter().any(|i| i.id == item.id) {
            return Err(AppError::Conflict("inventory_item".into()));
        }
        state.inventory.push(item);
        Ok(())
    }

    async fn record_consumption(
        &self,
        item_id: Uuid,
        qty: f64,
        used_at: DateTime<FixedOffset>,
    ) -> Result<(), AppError> {
        let mut state = self.state.lock().await;
        let item = state
            .inventory
            .iter_mut()
            .find(|i| i.id == item_id)
            .ok_or_else(|| AppError::NotFound("inventory_item".into()))?;
        item.qty_used_estimated += qty;
        item.last_used_at = Some(used_at);
        Ok(())
    }

    // ── Decision events ──────────────────────────────────────────────────

    async fn insert_event(&self, event: decision_event::Model) -> Result<(), AppError> {
        let mut state = self.state.lock().await;
        if state.events.iter().any(|e| e.id == event.id) {
            return Err(AppError::Conflict("decision_event".into()));
        }
        if event.notes.as_deref() == Some(notes::AUTOPILOT)
            && state.events.iter().any(|e| {
                e.household_key == event.household_key
                    && e.context_hash == event.context_hash
                    && e.notes.as_deref() == Some(notes::AUTOPILOT)
            })
        {
            return Err(AppError::Conflict("autopilot_event".into()));
        }
        state.events.push(event);
        Ok(())
    }

    async fn insert_feedback_copy(
        &self,
        original: &decision_event::Model,
        new_id: Uuid,
        user_action: &str,
        actioned_at: DateTime<FixedOffset>,
        notes: Option<String>,
    ) -> Result<decision_event::Model, AppError> {
        let copy = decision_event::Model {
            id: new_id,
            user_action: user_action.to_string(),
            actioned_at: Some(actioned_at),
            notes,
            ..original.clone()
        };
        self.insert_event(copy.clone()).await?;
        Ok(copy)
    }

    async fn event_by_id(
        &self,
        id: Uuid,
        household_key: Option<&str>,
    ) -> Result<Option<decision_event::Model>, AppError> {
        let state = self.state.lock().await;
        Ok(state
            .events
            .iter()
            .find(|e| e.id == id && household_key.map_or(true, |h| e.household_key == h))
            .cloned())
    }

    async fn recent_events(
        &self,
        household_key: &str,
        limit: u64,
    ) -> Result<Vec<decision_event::Model>, AppError> {
        let state = self.state.lock().await;
        let mut events: Vec<decision_event::Model> = state
            .events
            .iter()
            .filter(|e| e.household_key == household_key)
            .cloned()
            .collect();
        events.sort_by(|a, b| b.decided_at.cmp(&a.decided_at).then_with(|| b.id.cmp(&a.id)));
        events.truncate(limit as usize);
        Ok(events)
    }

    async fn event_count(&self, household_key: &str) -> Result<u64, AppError> {
        let state = self.state.lock().await;
        Ok(state
            .events
            .iter()
            .filter(|e| e.household_key == household_key)
            .count() as u64)
    }

    async fn find_autopilot_event(
        &self,
        household_key: &str,
        context_hash: &str,
    ) -> Result<Option<decision_event::Model>, AppError> {
        let state = self.state.lock().await;
        Ok(state
            .events
            .iter()
            .find(|e| {
                e.household_key == household_key
                    && e.context_hash == context_hash
                    && e.notes.as_deref() == Some(notes::AUTOPILOT)
            })
            .cloned())
    }

    // ── Taste ────────────────────────────────────────────────────────────

    async fn insert_taste_signal(&self, signal: taste_signal::Model) -> Result<(), AppError> {
        let mut state = self.state.lock().await;
        if state
            .taste_signals
            .iter()
            .any(|s| s.decision_event_id == signal.decision_event_id)
        {
            return Err(AppError::Conflict("taste_signal".into()));
        }
        state.taste_signals.push(signal);
        Ok(())
    }

    async fn upsert_taste_score(
        &self,
        household_key: &str,
        meal_id: &str,
        weight: f64,
        approved: bool,
        rejected: bool,
        seen_at: DateTime<FixedOffset>,
    ) -> Result<(), AppError> {
        let mut state = self.state.lock().await;
        match state
            .taste_scores
            .iter_mut()
            .find(|s| s.household_key == household_key && s.meal_id == meal_id)
        {
            Some(row) => {
                row.score += weight;
                row.approvals += i32::from(approved);
                row.rejections += i32::from(rejected);
                row.last_seen_at = seen_at;
                row.updated_at = seen_at;
            }
            None => {
                state.taste_scores.push(taste_meal_score::Model {
                    household_key: household_key.to_string(),
                    meal_id: meal_id.to_string(),
                    score: weight,
                    approvals: i32::from(approved),
                    rejections: i32::from(rejected),
                    last_seen_at: seen_at,
                    updated_at: seen_at,
                });
            }
        }
        Ok(())
    }

    async fn taste_scores(
        &self,
        household_key: &str,
    ) -> Result<Vec<taste_meal_score::Model>, AppError> {
        let state = self.state.lock().await;
        Ok(state
            .taste_scores
            .iter()
            .filter(|s| s.household_key == household_key)
            .cloned()
            .collect())
    }

    // ── Receipts ─────────────────────────────────────────────────────────

    async fn find_canonical_receipt(
        &self,
        household_key: &str,
        content_hash: &str,
    ) -> Result<Option<receipt_import::Model>, AppError> {
        let state = self.state.lock().await;
        Ok(state
            .receipts
            .iter()
            .find(|r| {
                r.household_key == household_key
                    && r.content_hash == content_hash
                    && !r.is_duplicate
            })
            .cloned())
    }

    async fn insert_receipt_import(&self, row: receipt_import::Model) -> Result<(), AppError> {
        let mut state = self.state.lock().await;
        if state.receipts.iter().any(|r| r.id == row.id) {
            return Err(AppError::Conflict("receipt_import".into()));
        }
        if !row.is_duplicate
            && state.receipts.iter().any(|r| {
                r.household_key == row.household_key
                    && r.content_hash == row.content_hash
                    && !r.is_duplicate
            })
        {
            return Err(AppError::Conflict("receipt_import".into()));
        }
        state.receipts.push(row);
        Ok(())
    }

    async fn update_receipt_status(
        &self,
        id: Uuid,
        status: &str,
        error_message: Option<String>,
    ) -> Result<(), AppError> {
        let mut state = self.state.lock().await;
        let row = state
            .receipts
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| AppError::NotFound("receipt_import".into()))?;
        row.status = status.to_string();
        row.error_message = error_message;
        Ok(())
    }

    async fn insert_receipt_lines(
        &self,
        lines: Vec<receipt_line_item::Model>,
    ) -> Result<(), AppError> {
        let mut state = self.state.lock().await;
        state.receipt_lines.extend(lines);
        Ok(())
    }

    async fn receipt_by_id(
        &self,
        household_key: &str,
        id: Uuid,
    ) -> Result<Option<receipt_import::Model>, AppError> {
        let state = self.state.lock().await;
        Ok(state
            .receipts
            .iter()
            .find(|r| r.id == id && r.household_key == household_key)
            .cloned())
    }

    async fn receipt_line_count(&self, receipt_import_id: Uuid) -> Result<u64, AppError> {
        let state = self.state.lock().await;
        Ok(state
            .receipt_lines
            .iter()
            .filter(|l| l.receipt_import_id == receipt_import_id)
            .count() as u64)
    }
}
