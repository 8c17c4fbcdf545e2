//! Database adapter — one query contract, two backends
//!
//! `ArbiterStore` is the whole persistence surface of the decision core.
//! The Postgres backend speaks SeaORM against the production schema; the
//! in-memory backend keeps `Vec<Model>` tables with the same ordering and
//! uniqueness semantics so the same tests pass against either.
//!
//! Write coordination rides entirely on uniqueness constraints (event id,
//! taste-signal decision_event_id, canonical receipt content hash, autopilot
//! context hash) — there is no client-side locking.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use uuid::Uuid;

use crate::entity::{
    decision_event, inventory_item, meal, meal_ingredient, receipt_import, receipt_line_item,
    taste_meal_score, taste_signal,
};
use crate::errors::AppError;

pub mod memory;
pub mod postgres;
pub mod seed;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Pre-filter cap for inventory candidate queries
pub const CANDIDATE_LIMIT: u64 = 50;

/// Window size for recent-event queries (rotation and policy windows)
pub const RECENT_EVENT_LIMIT: u64 = 50;

#[async_trait]
pub trait ArbiterStore: Send + Sync {
    // ── Meal library (read-only at runtime) ──────────────────────────────

    async fn active_meals(&self) -> Result<Vec<meal::Model>, AppError>;

    async fn meal_by_id(&self, meal_id: &str) -> Result<Option<meal::Model>, AppError>;

    async fn ingredients_for_meal(
        &self,
        meal_id: &str,
    ) -> Result<Vec<meal_ingredient::Model>, AppError>;

    async fn ingredients_for_meals(
        &self,
        meal_ids: &[String],
    ) -> Result<Vec<meal_ingredient::Model>, AppError>;

    // ── Inventory ────────────────────────────────────────────────────────

    async fn inventory_for_household(
        &self,
        household_key: &str,
    ) -> Result<Vec<inventory_item::Model>, AppError>;

    /// ILIKE-style pre-filter: any pattern may match, ordered by confidence
    /// then last-seen descending, capped. An optimization only — matcher
    /// semantics must not depend on it.
    async fn inventory_candidates(
        &self,
        household_key: &str,
        patterns: &[String],
        limit: u64,
    ) -> Result<Vec<inventory_item::Model>, AppError>;

    async fn insert_inventory_item(&self, item: inventory_item::Model) -> Result<(), AppError>;

    /// Consumption hook write: bump qty_used_estimated, stamp last_used_at
    async fn record_consumption(
        &self,
        item_id: Uuid,
        qty: f64,
        used_at: DateTime<FixedOffset>,
    ) -> Result<(), AppError>;

    // ── Decision events (append-only) ────────────────────────────────────

    /// Exactly-once per id. Rows tagged notes="autopilot" are additionally
    /// unique per (household, context_hash).
    async fn insert_event(&self, event: decision_event::Model) -> Result<(), AppError>;

    /// Copy every field of the original, overriding id, user_action,
    /// actioned_at and notes. Never touches the original row.
    async fn insert_feedback_copy(
        &self,
        original: &decision_event::Model,
        new_id: Uuid,
        user_action: &str,
        actioned_at: DateTime<FixedOffset>,
        notes: Option<String>,
    ) -> Result<decision_event::Model, AppError>;

    /// Lookup by id, optionally scoped to a household
    async fn event_by_id(
        &self,
        id: Uuid,
        household_key: Option<&str>,
    ) -> Result<Option<decision_event::Model>, AppError>;

    /// Most recent events for a household, decided_at descending
    async fn recent_events(
        &self,
        household_key: &str,
        limit: u64,
    ) -> Result<Vec<decision_event::Model>, AppError>;

    async fn event_count(&self, household_key: &str) -> Result<u64, AppError>;

    /// The canonical autopilot row for an idempotency key, if present
    async fn find_autopilot_event(
        &self,
        household_key: &str,
        context_hash: &str,
    ) -> Result<Option<decision_event::Model>, AppError>;

    // ── Taste ────────────────────────────────────────────────────────────

    /// Unique on decision_event_id; violation means "already processed"
    async fn insert_taste_signal(&self, signal: taste_signal::Model) -> Result<(), AppError>;

    async fn upsert_taste_score(
        &self,
        household_key: &str,
        meal_id: &str,
        weight: f64,
        approved: bool,
        rejected: bool,
        seen_at: DateTime<FixedOffset>,
    ) -> Result<(), AppError>;

    async fn taste_scores(
        &self,
        household_key: &str,
    ) -> Result<Vec<taste_meal_score::Model>, AppError>;

    // ── Receipts ─────────────────────────────────────────────────────────

    async fn find_canonical_receipt(
        &self,
        household_key: &str,
        content_hash: &str,
    ) -> Result<Option<receipt_import::Model>, AppError>;

    async fn insert_receipt_import(&self, row: receipt_import::Model) -> Result<(), AppError>;

    /// The only permitted receipt mutation: received -> parsed | failed
    async fn update_receipt_status(
        &self,
        id: Uuid,
        status: &str,
        error_message: Option<String>,
    ) -> Result<(), AppError>;

    async fn insert_receipt_lines(
        &self,
        lines: Vec<receipt_line_item::Model>,
    ) -> Result<(), AppError>;

    async fn receipt_by_id(
        &self,
        household_key: &str,
        id: Uuid,
    ) -> Result<Option<receipt_import::Model>, AppError>;

    async fn receipt_line_count(&self, receipt_import_id: Uuid) -> Result<u64, AppError>;
}
