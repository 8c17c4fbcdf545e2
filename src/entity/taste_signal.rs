//! Taste signal entity — append-only feedback-derived row
//! Unique on decision_event_id: at-most-once downstream processing per
//! source event, even under retries.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "taste_signals")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(column_type = "Text")]
    pub household_key: String,

    pub decided_at: DateTimeWithTimeZone,
    pub actioned_at: Option<DateTimeWithTimeZone>,

    /// The feedback-copy (or autopilot) event that produced this signal
    #[sea_orm(unique)]
    pub decision_event_id: Uuid,

    #[sea_orm(column_type = "Text", nullable)]
    pub meal_id: Option<String>,

    #[sea_orm(column_type = "Text")]
    pub decision_type: String,

    #[sea_orm(column_type = "Text")]
    pub user_action: String,

    #[sea_orm(column_type = "Text")]
    pub context_hash: String,

    /// Snapshot of meal features at decision time
    pub features: Json,

    /// Signed, stress-hour adjusted, clamped to [-2.0, 2.0]
    pub weight: f64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
