//! Decision endpoint wire contract
//!
//! The response never contains an array: `decision` is a single card or
//! null, and every selection path upstream returns one element, not a
//! list-of-one.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::types::{ContextSignal, DecisionType};

/// POST /decision request body
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DecisionRequest {
    /// Advisory; the auth-derived household key wins in production
    #[validate(length(min = 1, max = 128))]
    pub household_key: String,

    /// ISO-8601 with offset; local-time windows read its clock fields
    #[validate(length(min = 1, max = 64))]
    pub now_iso: String,

    pub signal: ContextSignal,
}

/// The single executable dinner action
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionCard {
    pub decision_type: DecisionType,
    pub decision_event_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meal_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor_key: Option<String>,
    pub title: String,
    pub steps_short: String,
    pub est_minutes: i32,
    pub context_hash: String,
}

/// POST /decision response body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionResponse {
    pub decision: Option<DecisionCard>,
    pub drm_recommended: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autopilot: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl DecisionResponse {
    pub fn drm(reason: &str) -> Self {
        Self {
            decision: None,
            drm_recommended: true,
            autopilot: None,
            reason: Some(reason.to_string()),
        }
    }

    pub fn decided(card: DecisionCard, autopilot: bool) -> Self {
        Self {
            decision: Some(card),
            drm_recommended: false,
            autopilot: Some(autopilot),
            reason: None,
        }
    }
}
