//! Dinner Rescue Mode wire contract

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// POST /drm request body
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DrmRequest {
    #[validate(length(min = 1, max = 64))]
    pub trigger_reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RescueType {
    Order,
    ZeroCook,
}

/// The single rescue action offered to the household
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RescueCard {
    pub rescue_type: RescueType,
    pub decision_event_id: Uuid,
    pub title: String,
    pub est_minutes: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deep_link_url: Option<String>,
}

/// POST /drm response body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DrmResponse {
    pub rescue: RescueCard,
    /// True after 3 consecutive rescues without an approval
    pub exhausted: bool,
}
