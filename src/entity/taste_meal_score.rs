//! Taste meal score entity — mutable per-(household, meal) cache
//! Upserted on every non-undo feedback; the running score feeds the
//! arbiter's sigmoid, never raw weights.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "taste_meal_scores")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_type = "Text")]
    pub household_key: String,

    #[sea_orm(primary_key, auto_increment = false, column_type = "Text")]
    pub meal_id: String,

    /// Signed running sum of signal weights
    pub score: f64,

    pub approvals: i32,
    pub rejections: i32,

    pub last_seen_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
