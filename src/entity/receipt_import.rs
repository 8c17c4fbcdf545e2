//! Receipt import entity — one row per ingestion attempt
//! The first import of a content hash in a household is canonical; later
//! imports with the same hash are stored as duplicates pointing at it and
//! never touch inventory.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "receipt_imports")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(column_type = "Text")]
    pub household_key: String,

    /// "image_upload", "text" or "manual"
    #[sea_orm(column_type = "Text")]
    pub source: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub vendor_name: Option<String>,

    pub purchased_at: Option<DateTimeWithTimeZone>,

    /// Which OCR provider produced the raw text
    #[sea_orm(column_type = "Text")]
    pub ocr_provider: String,

    #[sea_orm(column_type = "Text")]
    pub ocr_text: String,

    /// "received" -> "parsed" | "failed"; the only permitted mutation
    #[sea_orm(column_type = "Text")]
    pub status: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub error_message: Option<String>,

    /// SHA-256 hex over normalized text + vendor + purchase date
    #[sea_orm(column_type = "Text")]
    pub content_hash: String,

    pub is_duplicate: bool,

    /// Canonical receipt this row duplicates, when is_duplicate
    pub duplicate_of: Option<Uuid>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::receipt_line_item::Entity")]
    ReceiptLineItem,
}

impl Related<super::receipt_line_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ReceiptLineItem.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
