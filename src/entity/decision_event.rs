//! Decision event entity — append-only log of every arbiter outcome
//! The original row is inserted with `user_action = "pending"` and is never
//! mutated. Feedback produces a new row copying all fields and overriding
//! id, user_action and actioned_at.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "decision_events")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(column_type = "Text")]
    pub household_key: String,

    pub decided_at: DateTimeWithTimeZone,

    /// "cook", "order" or "zero_cook"
    #[sea_orm(column_type = "Text")]
    pub decision_type: String,

    /// Required when decision_type = "cook"
    #[sea_orm(column_type = "Text", nullable)]
    pub meal_id: Option<String>,

    /// Required when decision_type = "order"
    #[sea_orm(column_type = "Text", nullable)]
    pub external_vendor_key: Option<String>,

    /// Stable fingerprint of the inputs at decision time; also the
    /// idempotency key for autopilot inserts
    #[sea_orm(column_type = "Text")]
    pub context_hash: String,

    /// Opaque record of what was shown to the household
    pub decision_payload: Json,

    /// "pending", "approved", "rejected", "drm_triggered" or "expired"
    #[sea_orm(column_type = "Text")]
    pub user_action: String,

    pub actioned_at: Option<DateTimeWithTimeZone>,

    /// "autopilot", "undo_autopilot", "drm", ...
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
