//! Core domain enums shared across services, stores and wire contracts
//!
//! Entities persist these as text; the helpers here are the single place
//! the string forms live.

use serde::{Deserialize, Serialize};

/// What kind of single action the arbiter emitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionType {
    Cook,
    Order,
    ZeroCook,
}

impl DecisionType {
    pub fn as_str(self) -> &'static str {
        match self {
            DecisionType::Cook => "cook",
            DecisionType::Order => "order",
            DecisionType::ZeroCook => "zero_cook",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "cook" => Some(DecisionType::Cook),
            "order" => Some(DecisionType::Order),
            "zero_cook" => Some(DecisionType::ZeroCook),
            _ => None,
        }
    }
}

/// Stored state of a decision event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserAction {
    Pending,
    Approved,
    Rejected,
    DrmTriggered,
    Expired,
}

impl UserAction {
    pub fn as_str(self) -> &'static str {
        match self {
            UserAction::Pending => "pending",
            UserAction::Approved => "approved",
            UserAction::Rejected => "rejected",
            UserAction::DrmTriggered => "drm_triggered",
            UserAction::Expired => "expired",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(UserAction::Pending),
            "approved" => Some(UserAction::Approved),
            "rejected" => Some(UserAction::Rejected),
            "drm_triggered" => Some(UserAction::DrmTriggered),
            "expired" => Some(UserAction::Expired),
            _ => None,
        }
    }
}

/// Action supplied on the feedback endpoint. "undo" is a wire-only value:
/// it is stored as a rejection tagged `notes = "undo_autopilot"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackAction {
    Approved,
    Rejected,
    DrmTriggered,
    Expired,
    Undo,
}

impl FeedbackAction {
    /// The stored user_action this feedback maps to
    pub fn stored_action(self) -> UserAction {
        match self {
            FeedbackAction::Approved => UserAction::Approved,
            FeedbackAction::Rejected => UserAction::Rejected,
            FeedbackAction::DrmTriggered => UserAction::DrmTriggered,
            FeedbackAction::Expired => UserAction::Expired,
            FeedbackAction::Undo => UserAction::Rejected,
        }
    }
}

/// Meal slot of the request context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeWindow {
    Breakfast,
    Lunch,
    Dinner,
    LateNight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnergyLevel {
    Low,
    Normal,
    High,
}

/// The context signal attached to a decision request
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextSignal {
    pub time_window: TimeWindow,
    pub energy: EnergyLevel,
    #[serde(default)]
    pub calendar_conflict: bool,
}

/// Well-known values of the decision event notes column
pub mod notes {
    pub const AUTOPILOT: &str = "autopilot";
    pub const UNDO_AUTOPILOT: &str = "undo_autopilot";
    pub const DRM: &str = "drm";
}

/// Receipt ingestion sources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceiptSource {
    ImageUpload,
    Text,
    Manual,
}

impl ReceiptSource {
    pub fn as_str(self) -> &'static str {
        match self {
            ReceiptSource::ImageUpload => "image_upload",
            ReceiptSource::Text => "text",
            ReceiptSource::Manual => "manual",
        }
    }
}

/// Receipt import lifecycle: received -> parsed | failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceiptStatus {
    Received,
    Parsed,
    Failed,
}

impl ReceiptStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ReceiptStatus::Received => "received",
            ReceiptStatus::Parsed => "parsed",
            ReceiptStatus::Failed => "failed",
        }
    }
}
