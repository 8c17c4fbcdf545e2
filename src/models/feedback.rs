//! Feedback endpoint wire contract

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::types::FeedbackAction;

/// POST /feedback request body
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRequest {
    pub event_id: Uuid,

    pub user_action: FeedbackAction,

    /// ISO-8601; the stress-hour multiplier reads its local clock fields
    #[validate(length(min = 1, max = 64))]
    pub actioned_at: String,

    #[validate(length(max = 64))]
    pub notes: Option<String>,
}

/// POST /feedback response body — always the success shape unless the
/// top-level write itself fails
#[derive(Debug, Serialize)]
pub struct FeedbackResponse {
    pub recorded: bool,
}
