//! Receipt ingestion wire contract

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::types::{ReceiptSource, ReceiptStatus};

/// POST /receipt/import request body
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptImportRequest {
    /// Advisory; the auth-derived household key wins in production
    #[validate(length(min = 1, max = 128))]
    pub household_key: String,

    pub source: ReceiptSource,

    /// Image bytes for image_upload; the raw receipt text itself for
    /// text/manual sources. Base64 either way.
    pub receipt_image_base64: Option<String>,

    #[validate(length(max = 256))]
    pub vendor_name: Option<String>,

    #[validate(length(max = 64))]
    pub purchased_at_iso: Option<String>,
}

/// POST /receipt/import response body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptImportResponse {
    pub receipt_import_id: Uuid,
    pub status: ReceiptStatus,
    pub is_duplicate: bool,
}

/// GET /receipt/{id} response body — ingestion debugging surface
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptDetailResponse {
    pub receipt_import_id: Uuid,
    pub status: ReceiptStatus,
    pub is_duplicate: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplicate_of: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor_name: Option<String>,
    pub line_item_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}
