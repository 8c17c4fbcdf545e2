//! Decision, feedback and rescue handlers
//!
//! The household key always comes from the auth middleware; body-supplied
//! keys are advisory and ignored here.

use actix_web::{web, HttpResponse};
use chrono::Utc;
use std::sync::Arc;
use validator::Validate;

use crate::errors::AppError;
use crate::middleware::HouseholdKey;
use crate::models::decision::DecisionRequest;
use crate::models::drm::DrmRequest;
use crate::models::feedback::FeedbackRequest;
use crate::services::{DecisionService, DrmService, FeedbackService};

pub async fn decide(
    decisions: web::Data<Arc<DecisionService>>,
    household: web::ReqData<HouseholdKey>,
    body: web::Json<DecisionRequest>,
) -> Result<HttpResponse, AppError> {
    let request = body.into_inner();
    request.validate()?;
    let response = decisions.decide(&household.0, &request).await?;
    Ok(HttpResponse::Ok().json(response))
}

pub async fn feedback(
    feedbacks: web::Data<Arc<FeedbackService>>,
    household: web::ReqData<HouseholdKey>,
    body: web::Json<FeedbackRequest>,
) -> Result<HttpResponse, AppError> {
    let request = body.into_inner();
    request.validate()?;
    let response = feedbacks.record(&household.0, &request).await?;
    Ok(HttpResponse::Ok().json(response))
}

pub async fn drm(
    rescues: web::Data<Arc<DrmService>>,
    household: web::ReqData<HouseholdKey>,
    body: web::Json<DrmRequest>,
) -> Result<HttpResponse, AppError> {
    let request = body.into_inner();
    request.validate()?;
    let now = Utc::now().fixed_offset();
    let response = rescues.rescue(&household.0, &request.trigger_reason, now).await?;
    Ok(HttpResponse::Ok().json(response))
}

// ── Route configuration ───────────────────────────────────────────────────────

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/decision", web::post().to(decide))
        .route("/feedback", web::post().to(feedback))
        .route("/drm", web::post().to(drm));
}
