//! Feedback orchestration — the authoritative append plus best-effort hooks
//!
//! The feedback-copy insert is the only authoritative write here. Everything
//! downstream (consumption, taste) is isolated: a hook failure or timeout is
//! logged and the response is still `{recorded: true}`. The two must never
//! be collapsed into one transaction.

use chrono::DateTime;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::entity::decision_event;
use crate::errors::AppError;
use crate::models::feedback::{FeedbackRequest, FeedbackResponse};
use crate::models::types::{notes, DecisionType, FeedbackAction, UserAction};
use crate::services::consumption::ConsumptionService;
use crate::services::decision::HOOK_TIMEOUT_SECS;
use crate::services::taste::TasteService;
use crate::store::ArbiterStore;

pub struct FeedbackService {
    store: Arc<dyn ArbiterStore>,
    taste: TasteService,
    consumption: ConsumptionService,
}

impl FeedbackService {
    pub fn new(store: Arc<dyn ArbiterStore>) -> Self {
        Self {
            taste: TasteService::new(store.clone()),
            consumption: ConsumptionService::new(store.clone()),
            store,
        }
    }

    /// Record one feedback. Unknown originals still produce a row — the
    /// append-only log treats a missing original as a metadata gap, not a
    /// failure.
    pub async fn record(
        &self,
        household_key: &str,
        request: &FeedbackRequest,
    ) -> Result<FeedbackResponse, AppError> {
        let actioned_at = DateTime::parse_from_rfc3339(&request.actioned_at)
            .map_err(|_| AppError::BadRequest("actionedAt must be ISO-8601 with offset".into()))?;

        let stored_action = request.user_action.stored_action();
        let event_notes = if request.user_action == FeedbackAction::Undo {
            Some(notes::UNDO_AUTOPILOT.to_string())
        } else {
            request.notes.clone()
        };

        let original = self.store.event_by_id(request.event_id, Some(household_key)).await?;

        let new_id = Uuid::new_v4();
        let copy = match &original {
            Some(original) => {
                self.store
                    .insert_feedback_copy(
                        original,
                        new_id,
                        stored_action.as_str(),
                        actioned_at,
                        event_notes,
                    )
                    .await?
            }
            None => {
                // No original to copy: append a bare row so the feedback is
                // still recorded
                let row = decision_event::Model {
                    id: new_id,
                    household_key: household_key.to_string(),
                    decided_at: actioned_at,
                    decision_type: DecisionType::ZeroCook.as_str().to_string(),
                    meal_id: None,
                    external_vendor_key: None,
                    context_hash: String::new(),
                    decision_payload: json!(null),
                    user_action: stored_action.as_str().to_string(),
                    actioned_at: Some(actioned_at),
                    notes: event_notes,
                };
                self.store.insert_event(row.clone()).await?;
                row
            }
        };

        let hook_deadline = std::time::Duration::from_secs(HOOK_TIMEOUT_SECS);

        // Consumption: approved cook decisions only
        let is_approved_cook = stored_action == UserAction::Approved
            && request.user_action != FeedbackAction::Undo
            && copy.decision_type == DecisionType::Cook.as_str();
        if is_approved_cook {
            if let Some(meal_id) = &copy.meal_id {
                if tokio::time::timeout(
                    hook_deadline,
                    self.consumption.run(household_key, meal_id, actioned_at),
                )
                .await
                .is_err()
                {
                    tracing::warn!("consumption hook timed out for event {}", copy.id);
                }
            }
        }

        // Taste updater runs on every feedback
        match tokio::time::timeout(hook_deadline, self.taste.apply(&copy)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) if e.is_unique_violation() => {
                tracing::debug!("taste signal for event {} already processed", copy.id);
            }
            Ok(Err(e)) => {
                tracing::warn!("taste updater failed for event {}: {}", copy.id, e);
            }
            Err(_) => {
                tracing::warn!("taste updater timed out for event {}", copy.id);
            }
        }

        Ok(FeedbackResponse { recorded: true })
    }
}
