//! Inventory item entity — probabilistic pantry state per household
//! Multiple rows per (household, ingredient) are permitted: each row is an
//! uncertainty, not a unique SKU. Rows are never deleted; time decay handles
//! depletion.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "inventory_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(column_type = "Text")]
    pub household_key: String,

    /// Free-form item name from receipt normalization or manual entry
    #[sea_orm(column_type = "Text")]
    pub item_name: String,

    /// None = quantity unknown, treat as present
    pub qty_estimated: Option<f64>,

    /// Cumulative consumption, incremented by the consumption hook
    pub qty_used_estimated: f64,

    #[sea_orm(column_type = "Text", nullable)]
    pub unit: Option<String>,

    /// How sure we are the item exists, in [0, 1]
    pub confidence: f64,

    /// "receipt", "inferred" or "manual"
    #[sea_orm(column_type = "Text")]
    pub source: String,

    pub last_seen_at: DateTimeWithTimeZone,
    pub last_used_at: Option<DateTimeWithTimeZone>,
    pub expiry_date: Option<Date>,

    /// Linear quantity decay per day since last seen
    pub decay_rate_per_day: f64,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl crate::matching::MatchCandidate for Model {
    fn match_name(&self) -> &str {
        &self.item_name
    }
}
