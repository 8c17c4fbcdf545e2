//! Receipt ingestion handlers

use actix_web::{web, HttpResponse};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::errors::AppError;
use crate::middleware::HouseholdKey;
use crate::models::receipt::ReceiptImportRequest;
use crate::services::ReceiptService;

pub async fn import(
    receipts: web::Data<Arc<ReceiptService>>,
    household: web::ReqData<HouseholdKey>,
    body: web::Json<ReceiptImportRequest>,
) -> Result<HttpResponse, AppError> {
    let request = body.into_inner();
    request.validate()?;
    let response = receipts.import(&household.0, &request).await?;
    Ok(HttpResponse::Ok().json(response))
}

pub async fn detail(
    receipts: web::Data<Arc<ReceiptService>>,
    household: web::ReqData<HouseholdKey>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let response = receipts.detail(&household.0, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(response))
}

// ── Route configuration ───────────────────────────────────────────────────────

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/receipt")
            .route("/import", web::post().to(import))
            .route("/{id}", web::get().to(detail)),
    );
}
