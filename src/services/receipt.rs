//! Receipt ingestion pipeline — OCR, parse, normalize, dedupe, upsert
//!
//! Flow: payload -> OCR text -> parsed lines -> content hash -> dedupe.
//! The first import of a hash in a household is canonical and feeds
//! inventory; every later import with the same hash is stored as a duplicate
//! pointing at it and never touches inventory. OCR and parse failures mark
//! the row failed but the endpoint still answers with the success shape.

use base64::Engine;
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::entity::{inventory_item, receipt_import, receipt_line_item};
use crate::errors::AppError;
use crate::models::receipt::{ReceiptDetailResponse, ReceiptImportRequest, ReceiptImportResponse};
use crate::models::types::{ReceiptSource, ReceiptStatus};
use crate::receipts::{content_hash, normalize_line, parse_receipt, OcrProvider, ParsedReceipt};
use crate::services::inventory::DEFAULT_DECAY_RATE;
use crate::store::ArbiterStore;

/// Lines below this confidence never propagate to inventory
pub const LINE_PROPAGATION_THRESHOLD: f64 = 0.60;

pub struct ReceiptService {
    store: Arc<dyn ArbiterStore>,
    ocr: Arc<dyn OcrProvider>,
}

fn midnight_utc(date: NaiveDate) -> DateTime<FixedOffset> {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().fixed_offset())
        .unwrap_or_else(|| Utc::now().fixed_offset())
}

/// Accept full ISO timestamps and bare dates
fn parse_purchased_at(iso: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(iso) {
        return Some(dt);
    }
    iso.parse::<NaiveDate>().ok().map(midnight_utc)
}

impl ReceiptService {
    pub fn new(store: Arc<dyn ArbiterStore>, ocr: Arc<dyn OcrProvider>) -> Self {
        Self { store, ocr }
    }

    pub async fn import(
        &self,
        household_key: &str,
        request: &ReceiptImportRequest,
    ) -> Result<ReceiptImportResponse, AppError> {
        let encoded = request
            .receipt_image_base64
            .as_deref()
            .ok_or_else(|| AppError::BadRequest("receiptImageBase64 is required".into()))?;
        let payload = base64::engine::general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|_| AppError::BadRequest("receiptImageBase64 is not valid base64".into()))?;

        let now = Utc::now().fixed_offset();

        // Text extraction: the OCR provider for images, the payload itself
        // for text/manual sources
        let (text, ocr_error) = match request.source {
            ReceiptSource::ImageUpload => match self.ocr.extract_text(&payload).await {
                Ok(extraction) => (extraction.text, None),
                Err(e) => {
                    tracing::warn!("OCR extraction failed: {}", e);
                    (String::new(), Some(e.to_string()))
                }
            },
            ReceiptSource::Text | ReceiptSource::Manual => {
                (String::from_utf8_lossy(&payload).into_owned(), None)
            }
        };

        let parsed = parse_receipt(&text);

        let vendor = request.vendor_name.clone().or_else(|| parsed.vendor.clone());
        let purchased_at = request
            .purchased_at_iso
            .as_deref()
            .and_then(parse_purchased_at)
            .or_else(|| parsed.purchased_on.map(midnight_utc));
        let date_for_hash = request
            .purchased_at_iso
            .clone()
            .or_else(|| parsed.purchased_on.map(|d| d.to_string()));

        let hash = content_hash(&text, vendor.as_deref(), date_for_hash.as_deref());

        // Dedupe: at most one canonical row per (household, hash)
        if let Some(canonical) = self.store.find_canonical_receipt(household_key, &hash).await? {
            return self
                .insert_duplicate(household_key, request, &text, vendor, purchased_at, &hash, canonical.id, now)
                .await;
        }

        let import_id = Uuid::new_v4();
        let canonical_row = receipt_import::Model {
            id: import_id,
            household_key: household_key.to_string(),
            source: request.source.as_str().to_string(),
            vendor_name: vendor.clone(),
            purchased_at,
            ocr_provider: self.ocr.label().to_string(),
            ocr_text: text.clone(),
            status: ReceiptStatus::Received.as_str().to_string(),
            error_message: None,
            content_hash: hash.clone(),
            is_duplicate: false,
            duplicate_of: None,
            created_at: now,
        };

        match self.store.insert_receipt_import(canonical_row).await {
            Ok(()) => {}
            Err(e) if e.is_unique_violation() => {
                // Lost the canonical race: someone ingested the same content
                // concurrently, so this import becomes the duplicate
                let canonical = self
                    .store
                    .find_canonical_receipt(household_key, &hash)
                    .await?
                    .ok_or_else(|| AppError::Internal("canonical receipt vanished".into()))?;
                return self
                    .insert_duplicate(household_key, request, &text, vendor, purchased_at, &hash, canonical.id, now)
                    .await;
            }
            Err(e) => return Err(e),
        }

        if let Some(message) = ocr_error {
            self.store
                .update_receipt_status(import_id, ReceiptStatus::Failed.as_str(), Some(message))
                .await?;
            return Ok(ReceiptImportResponse {
                receipt_import_id: import_id,
                status: ReceiptStatus::Failed,
                is_duplicate: false,
            });
        }

        // Canonical: persist lines and feed inventory
        match self
            .process_lines(household_key, import_id, &parsed, purchased_at.unwrap_or(now), now)
            .await
        {
            Ok(()) => {
                self.store
                    .update_receipt_status(import_id, ReceiptStatus::Parsed.as_str(), None)
                    .await?;
                Ok(ReceiptImportResponse {
                    receipt_import_id: import_id,
                    status: ReceiptStatus::Parsed,
                    is_duplicate: false,
                })
            }
            Err(e) => {
                tracing::warn!("receipt line processing failed for {}: {}", import_id, e);
                self.store
                    .update_receipt_status(
                        import_id,
                        ReceiptStatus::Failed.as_str(),
                        Some(e.to_string()),
                    )
                    .await?;
                Ok(ReceiptImportResponse {
                    receipt_import_id: import_id,
                    status: ReceiptStatus::Failed,
                    is_duplicate: false,
                })
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn insert_duplicate(
        &self,
        household_key: &str,
        request: &ReceiptImportRequest,
        text: &str,
        vendor: Option<String>,
        purchased_at: Option<DateTime<FixedOffset>>,
        hash: &str,
        canonical_id: Uuid,
        now: DateTime<FixedOffset>,
    ) -> Result<ReceiptImportResponse, AppError> {
        let import_id = Uuid::new_v4();
        self.store
            .insert_receipt_import(receipt_import::Model {
                id: import_id,
                household_key: household_key.to_string(),
                source: request.source.as_str().to_string(),
                vendor_name: vendor,
                purchased_at,
                ocr_provider: self.ocr.label().to_string(),
                ocr_text: text.to_string(),
                status: ReceiptStatus::Parsed.as_str().to_string(),
                error_message: None,
                content_hash: hash.to_string(),
                is_duplicate: true,
                duplicate_of: Some(canonical_id),
                created_at: now,
            })
            .await?;

        Ok(ReceiptImportResponse {
            receipt_import_id: import_id,
            status: ReceiptStatus::Parsed,
            is_duplicate: true,
        })
    }

    /// Store parsed lines and upsert inventory for the confident ones
    async fn process_lines(
        &self,
        household_key: &str,
        import_id: Uuid,
        parsed: &ParsedReceipt,
        seen_at: DateTime<FixedOffset>,
        now: DateTime<FixedOffset>,
    ) -> Result<(), AppError> {
        let mut rows = Vec::with_capacity(parsed.lines.len());
        let mut confident = Vec::new();

        for line in &parsed.lines {
            let normalized = normalize_line(&line.item_name, line.qty_text.as_deref());
            let row = receipt_line_item::Model {
                id: Uuid::new_v4(),
                receipt_import_id: import_id,
                raw_line: line.raw_line.clone(),
                raw_item_name: line.item_name.clone(),
                raw_qty_text: line.qty_text.clone(),
                raw_price: line.price,
                normalized_name: normalized.name.clone(),
                normalized_unit: normalized.unit.clone(),
                normalized_qty: normalized.qty_estimate,
                confidence: normalized.confidence,
            };
            if normalized.confidence >= LINE_PROPAGATION_THRESHOLD {
                confident.push((normalized, row.id));
            }
            rows.push(row);
        }

        self.store.insert_receipt_lines(rows).await?;

        for (normalized, _) in confident {
            self.store
                .insert_inventory_item(inventory_item::Model {
                    id: Uuid::new_v4(),
                    household_key: household_key.to_string(),
                    item_name: normalized.name,
                    qty_estimated: Some(normalized.qty_estimate.unwrap_or(1.0)),
                    qty_used_estimated: 0.0,
                    unit: normalized.unit,
                    confidence: normalized.confidence,
                    source: "receipt".to_string(),
                    last_seen_at: seen_at,
                    last_used_at: None,
                    expiry_date: None,
                    decay_rate_per_day: DEFAULT_DECAY_RATE,
                    created_at: now,
                })
                .await?;
        }

        Ok(())
    }

    /// Ingestion debugging surface
    pub async fn detail(
        &self,
        household_key: &str,
        import_id: Uuid,
    ) -> Result<ReceiptDetailResponse, AppError> {
        let row = self
            .store
            .receipt_by_id(household_key, import_id)
            .await?
            .ok_or_else(|| AppError::NotFound("receipt_import".into()))?;

        let line_item_count = self.store.receipt_line_count(import_id).await? as usize;

        let status = match row.status.as_str() {
            "received" => ReceiptStatus::Received,
            "failed" => ReceiptStatus::Failed,
            _ => ReceiptStatus::Parsed,
        };

        Ok(ReceiptDetailResponse {
            receipt_import_id: row.id,
            status,
            is_duplicate: row.is_duplicate,
            duplicate_of: row.duplicate_of,
            vendor_name: row.vendor_name,
            line_item_count,
            error_message: row.error_message,
        })
    }
}
