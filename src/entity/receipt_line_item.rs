//! Receipt line item entity — one row per parsed receipt line
//! Only lines with confidence >= 0.60 propagate to inventory.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "receipt_line_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub receipt_import_id: Uuid,

    #[sea_orm(column_type = "Text")]
    pub raw_line: String,

    #[sea_orm(column_type = "Text")]
    pub raw_item_name: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub raw_qty_text: Option<String>,

    #[sea_orm(column_type = "Decimal(Some((10, 2)))", nullable)]
    pub raw_price: Option<Decimal>,

    #[sea_orm(column_type = "Text")]
    pub normalized_name: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub normalized_unit: Option<String>,

    pub normalized_qty: Option<f64>,

    /// Normalization confidence in [0, 1]
    pub confidence: f64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::receipt_import::Entity",
        from = "Column::ReceiptImportId",
        to = "super::receipt_import::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    ReceiptImport,
}

impl Related<super::receipt_import::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ReceiptImport.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
