//! Meal entity — immutable library entry
//! Seeded at startup; `active = false` hides a meal from selection while
//! preserving references from past decision events.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "meals")]
pub struct Model {
    /// Stable identifier, e.g. "meal-012"
    #[sea_orm(primary_key, auto_increment = false, column_type = "Text")]
    pub id: String,

    /// Lowercased form used for deterministic tie-break ordering
    #[sea_orm(column_type = "Text")]
    pub canonical_key: String,

    #[sea_orm(column_type = "Text")]
    pub display_name: String,

    /// Short instructions shown on the decision card
    #[sea_orm(column_type = "Text")]
    pub steps_short: String,

    pub est_minutes: i32,

    /// "$", "$$" or "$$$"
    #[sea_orm(column_type = "Text")]
    pub cost_band: String,

    /// Internal tags, stored as a JSON array of strings
    pub tags: Json,

    pub active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::meal_ingredient::Entity")]
    MealIngredient,
}

impl Related<super::meal_ingredient::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MealIngredient.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
