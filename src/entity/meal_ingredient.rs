//! Meal ingredient entity — relation from meal to required ingredient
//! Pantry staples are assumed always available; non-staples are scored
//! against household inventory.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "meal_ingredients")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    #[sea_orm(column_type = "Text")]
    pub meal_id: String,

    /// Free-form name, matched via the tokenizer
    #[sea_orm(column_type = "Text")]
    pub ingredient_name: String,

    /// "2", "1.5 lb", ... — parsed by the consumption hook
    #[sea_orm(column_type = "Text", nullable)]
    pub qty_text: Option<String>,

    pub is_pantry_staple: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::meal::Entity",
        from = "Column::MealId",
        to = "super::meal::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Meal,
}

impl Related<super::meal::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Meal.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
