//! Postgres store backend — SeaORM over the production schema
//!
//! Uniqueness lives in the schema (see the migration list in main.rs):
//! duplicate-key failures surface as `DbErr` and callers classify them with
//! `AppError::is_unique_violation`.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::entity::{
    decision_event, inventory_item, meal, meal_ingredient, receipt_import, receipt_line_item,
    taste_meal_score, taste_signal,
};
use crate::errors::AppError;
use crate::models::types::notes;
use crate::store::{seed, ArbiterStore};

pub struct PgStore {
    db: DatabaseConnection,
}

impl PgStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Idempotently load the meal library after migrations
    pub async fn ensure_seeded(&self) -> Result<(), AppError> {
        let existing = meal::Entity::find().count(&self.db).await?;
        if existing > 0 {
            return Ok(());
        }

        let (meals, ingredients) = seed::meal_library();
        for m in meals {
            meal::ActiveModel {
                id: Set(m.id),
                canonical_key: Set(m.canonical_key),
                display_name: Set(m.display_name),
                steps_short: Set(m.steps_short),
                est_minutes: Set(m.est_minutes),
                cost_band: Set(m.cost_band),
                tags: Set(m.tags),
                active: Set(m.active),
            }
            .insert(&self.db)
            .await?;
        }
        for i in ingredients {
            meal_ingredient::ActiveModel {
                id: Set(i.id),
                meal_id: Set(i.meal_id),
                ingredient_name: Set(i.ingredient_name),
                qty_text: Set(i.qty_text),
                is_pantry_staple: Set(i.is_pantry_staple),
            }
            .insert(&self.db)
            .await?;
        }

        tracing::info!("Seed meal library loaded");
        Ok(())
    }
}

fn event_active_model(event: decision_event::Model) -> decision_event::ActiveModel {
    decision_event::ActiveModel {
        id: Set(event.id),
        household_key: Set(event.household_key),
        decided_at: Set(event.decided_at),
        decision_type: Set(event.decision_type),
        meal_id: Set(event.meal_id),
        external_vendor_key: Set(event.external_vendor_key),
        context_hash: Set(event.context_hash),
        decision_payload: Set(event.decision_payload),
        user_action: Set(event.user_action),
        actioned_at: Set(event.actioned_at),
        notes: Set(event.notes),
    }
}

#[async_trait]
impl ArbiterStore for PgStore {
    // ── Meal library ─────────────────────────────────────────────────────

    async fn active_meals(&self) -> Result<Vec<meal::Model>, AppError> {
        Ok(meal::Entity::find()
            .filter(meal::Column::Active.eq(true))
            .order_by_asc(meal::Column::Id)
            .all(&self.db)
            .await?)
    }

    async fn meal_by_id(&self, meal_id: &str) -> Result<Option<meal::Model>, AppError> {
        Ok(meal::Entity::find_by_id(meal_id).one(&self.db).await?)
    }

    async fn ingredients_for_meal(
        &self,
        meal_id: &str,
    ) -> Result<Vec<meal_ingredient::Model>, AppError> {
        Ok(meal_ingredient::Entity::find()
            .filter(meal_ingredient::Column::MealId.eq(meal_id))
            .order_by_asc(meal_ingredient::Column::Id)
            .all(&self.db)
            .await?)
    }

    async fn ingredients_for_meals(
        &self,
        meal_ids: &[String],
    ) -> Result<Vec<meal_ingredient::Model>, AppError> {
        if meal_ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(meal_ingredient::Entity::find()
            .filter(meal_ingredient::Column::MealId.is_in(meal_ids.iter().cloned()))
            .order_by_asc(meal_ingredient::Column::Id)
            .all(&self.db)
            .await?)
    }

    // ── Inventory ────────────────────────────────────────────────────────

    async fn inventory_for_household(
        &self,
        household_key: &str,
    ) -> Result<Vec<inventory_item::Model>, AppError> {
        Ok(inventory_item::Entity::find()
            .filter(inventory_item::Column::HouseholdKey.eq(household_key))
            .all(&self.db)
            .await?)
    }

    async fn inventory_candidates(
        &self,
        household_key: &str,
        patterns: &[String],
        limit: u64,
    ) -> Result<Vec<inventory_item::Model>, AppError> {
        if patterns.is_empty() {
            return Ok(Vec::new());
        }

        let mut any = Condition::any();
        for pattern in patterns {
            any = any.add(
                Expr::col(inventory_item::Column::ItemName).ilike(format!("%{}%", pattern)),
            );
        }

        Ok(inventory_item::Entity::find()
            .filter(inventory_item::Column::HouseholdKey.eq(household_key))
            .filter(any)
            .order_by_desc(inventory_item::Column::Confidence)
            .order_by_desc(inventory_item::Column::LastSeenAt)
            .limit(limit)
            .all(&self.db)
            .await?)
    }

    async fn insert_inventory_item(&self, item: inventory_item::Model) -> Result<(), AppError> {
        inventory_item::ActiveModel {
            id: Set(item.id),
            household_key: Set(item.household_key),
            item_name: Set(item.item_name),
            qty_estimated: Set(item.qty_estimated),
            qty_used_estimated: Set(item.qty_used_estimated),
            unit: Set(item.unit),
            confidence: Set(item.confidence),
            source: Set(item.source),
            last_seen_at: Set(item.last_seen_at),
            last_used_at: Set(item.last_used_at),
            expiry_date: Set(item.expiry_date),
            decay_rate_per_day: Set(item.decay_rate_per_day),
            created_at: Set(item.created_at),
        }
        .insert(&self.db)
        .await?;
        Ok(())
    }

    async fn record_consumption(
        &self,
        item_id: Uuid,
        qty: f64,
        used_at: DateTime<FixedOffset>,
    ) -> Result<(), AppError> {
        let item = inventory_item::Entity::find_by_id(item_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("inventory_item".into()))?;

        let new_used = item.qty_used_estimated + qty;
        let mut active: inventory_item::ActiveModel = item.into();
        active.qty_used_estimated = Set(new_used);
        active.last_used_at = Set(Some(used_at));
        active.update(&self.db).await?;
        Ok(())
    }

    // ── Decision events ──────────────────────────────────────────────────

    async fn insert_event(&self, event: decision_event::Model) -> Result<(), AppError> {
        event_active_model(event).insert(&self.db).await?;
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
        event_active_model(copy.clone()).insert(&self.db).await?;
        Ok(copy)
    }

    async fn event_by_id(
        &self,
        id: Uuid,
        household_key: Option<&str>,
    ) -> Result<Option<decision_event::Model>, AppError> {
        let mut query = decision_event::Entity::find_by_id(id);
        if let Some(household) = household_key {
            query = query.filter(decision_event::Column::HouseholdKey.eq(household));
        }
        Ok(query.one(&self.db).await?)
    }

    async fn recent_events(
        &self,
        household_key: &str,
        limit: u64,
    ) -> Result<Vec<decision_event::Model>, AppError> {
        Ok(decision_event::Entity::find()
            .filter(decision_event::Column::HouseholdKey.eq(household_key))
            .order_by_desc(decision_event::Column::DecidedAt)
            .order_by_desc(decision_event::Column::Id)
            .limit(limit)
            .all(&self.db)
            .await?)
    }

    async fn event_count(&self, household_key: &str) -> Result<u64, AppError> {
        Ok(decision_event::Entity::find()
            .filter(decision_event::Column::HouseholdKey.eq(household_key))
            .count(&self.db)
            .await?)
    }

    async fn find_autopilot_event(
        &self,
        household_key: &str,
        context_hash: &str,
    ) -> Result<Option<decision_event::Model>, AppError> {
        Ok(decision_event::Entity::find()
            .filter(decision_event::Column::HouseholdKey.eq(household_key))
            .filter(decision_event::Column::ContextHash.eq(context_hash))
            .filter(decision_event::Column::Notes.eq(notes::AUTOPILOT))
            .one(&self.db)
            .await?)
    }

    // ── Taste ────────────────────────────────────────────────────────────

    async fn insert_taste_signal(&self, signal: taste_signal::Model) -> Result<(), AppError> {
        taste_signal::ActiveModel {
            id: Set(signal.id),
            household_key: Set(signal.household_key),
            decided_at: Set(signal.decided_at),
            actioned_at: Set(signal.actioned_at),
            decision_event_id: Set(signal.decision_event_id),
            meal_id: Set(signal.meal_id),
            decision_type: Set(signal.decision_type),
            user_action: Set(signal.user_action),
            context_hash: Set(signal.context_hash),
            features: Set(signal.features),
            weight: Set(signal.weight),
        }
        .insert(&self.db)
        .await?;
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
        let existing = taste_meal_score::Entity::find_by_id((
            household_key.to_string(),
            meal_id.to_string(),
        ))
        .one(&self.db)
        .await?;

        match existing {
            Some(row) => {
                let score = row.score + weight;
                let approvals = row.approvals + i32::from(approved);
                let rejections = row.rejections + i32::from(rejected);
                let mut active: taste_meal_score::ActiveModel = row.into();
                active.score = Set(score);
                active.approvals = Set(approvals);
                active.rejections = Set(rejections);
                active.last_seen_at = Set(seen_at);
                active.updated_at = Set(seen_at);
                active.update(&self.db).await?;
            }
            None => {
                taste_meal_score::ActiveModel {
                    household_key: Set(household_key.to_string()),
                    meal_id: Set(meal_id.to_string()),
                    score: Set(weight),
                    approvals: Set(i32::from(approved)),
                    rejections: Set(i32::from(rejected)),
                    last_seen_at: Set(seen_at),
                    updated_at: Set(seen_at),
                }
                .insert(&self.db)
                .await?;
            }
        }
        Ok(())
    }

    async fn taste_scores(
        &self,
        household_key: &str,
    ) -> Result<Vec<taste_meal_score::Model>, AppError> {
        Ok(taste_meal_score::Entity::find()
            .filter(taste_meal_score::Column::HouseholdKey.eq(household_key))
            .all(&self.db)
            .await?)
    }

    // ── Receipts ─────────────────────────────────────────────────────────

    async fn find_canonical_receipt(
        &self,
        household_key: &str,
        content_hash: &str,
    ) -> Result<Option<receipt_import::Model>, AppError> {
        Ok(receipt_import::Entity::find()
            .filter(receipt_import::Column::HouseholdKey.eq(household_key))
            .filter(receipt_import::Column::ContentHash.eq(content_hash))
            .filter(receipt_import::Column::IsDuplicate.eq(false))
            .one(&self.db)
            .await?)
    }

    async fn insert_receipt_import(&self, row: receipt_import::Model) -> Result<(), AppError> {
        receipt_import::ActiveModel {
            id: Set(row.id),
            household_key: Set(row.household_key),
            source: Set(row.source),
            vendor_name: Set(row.vendor_name),
            purchased_at: Set(row.purchased_at),
            ocr_provider: Set(row.ocr_provider),
            ocr_text: Set(row.ocr_text),
            status: Set(row.status),
            error_message: Set(row.error_message),
            content_hash: Set(row.content_hash),
            is_duplicate: Set(row.is_duplicate),
            duplicate_of: Set(row.duplicate_of),
            created_at: Set(row.created_at),
        }
        .insert(&self.db)
        .await?;
        Ok(())
    }

    async fn update_receipt_status(
        &self,
        id: Uuid,
        status: &str,
        error_message: Option<String>,
    ) -> Result<(), AppError> {
        let row = receipt_import::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("receipt_import".into()))?;

        let mut active: receipt_import::ActiveModel = row.into();
        active.status = Set(status.to_string());
        active.error_message = Set(error_message);
        active.update(&self.db).await?;
        Ok(())
    }

    async fn insert_receipt_lines(
        &self,
        lines: Vec<receipt_line_item::Model>,
    ) -> Result<(), AppError> {
        if lines.is_empty() {
            return Ok(());
        }
        let active: Vec<receipt_line_item::ActiveModel> = lines
            .into_iter()
            .map(|l| receipt_line_item::ActiveModel {
                id: Set(l.id),
                receipt_import_id: Set(l.receipt_import_id),
                raw_line: Set(l.raw_line),
                raw_item_name: Set(l.raw_item_name),
                raw_qty_text: Set(l.raw_qty_text),
                raw_price: Set(l.raw_price),
                normalized_name: Set(l.normalized_name),
                normalized_unit: Set(l.normalized_unit),
                normalized_qty: Set(l.normalized_qty),
                confidence: Set(l.confidence),
            })
            .collect();
        receipt_line_item::Entity::insert_many(active).exec(&self.db).await?;
        Ok(())
    }

    async fn receipt_by_id(
        &self,
        household_key: &str,
        id: Uuid,
    ) -> Result<Option<receipt_import::Model>, AppError> {
        Ok(receipt_import::Entity::find_by_id(id)
            .filter(receipt_import::Column::HouseholdKey.eq(household_key))
            .one(&self.db)
            .await?)
    }

    async fn receipt_line_count(&self, receipt_import_id: Uuid) -> Result<u64, AppError> {
        Ok(receipt_line_item::Entity::find()
            .filter(receipt_line_item::Column::ReceiptImportId.eq(receipt_import_id))
            .count(&self.db)
            .await?)
    }
}
