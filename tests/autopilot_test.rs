//! Autopilot eligibility, idempotency and the undo throttle

mod common;

use common::*;

use arbiter_api::models::feedback::FeedbackRequest;
use arbiter_api::models::types::FeedbackAction;
use arbiter_api::services::{DecisionService, FeedbackService};
use arbiter_api::store::ArbiterStore;

const HH: &str = "hh-test";

/// Stock the pantry so the household inventory fallback clears the 0.85
/// gate, and prime taste so the taste fallback clears 0.70.
async fn prime_household(store: &std::sync::Arc<arbiter_api::store::MemoryStore>, seen: &str) {
    for name in [
        // meal-001 non-staples
        "spaghetti",
        "marinara sauce",
        "parmesan cheese",
        // meal-012 non-staples
        "chicken breast",
        "broccoli",
        "bell pepper",
        // meal-005 partial
        "eggs",
    ] {
        store
            .insert_inventory_item(pantry_item(HH, name, 1.0, 5.0, seen))
            .await
            .unwrap();
    }

    for meal_id in ["meal-001", "meal-012"] {
        store
            .upsert_taste_score(HH, meal_id, 5.0, true, false, at(seen))
            .await
            .unwrap();
    }
}

#[actix_rt::test]
async fn autopilot_inserts_approved_row_and_is_idempotent() {
    let store = store();
    prime_household(&store, "2026-01-20T17:30:00-06:00").await;

    let decisions = DecisionService::new(store.clone());
    let request = decision_request("2026-01-20T17:30:00-06:00", dinner_signal());

    let first = decisions.decide(HH, &request).await.unwrap();
    assert_eq!(first.autopilot, Some(true));
    assert!(!first.drm_recommended);
    let card = first.decision.as_ref().unwrap();

    let event = store
        .event_by_id(card.decision_event_id, Some(HH))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(event.user_action, "approved");
    assert_eq!(event.notes.as_deref(), Some("autopilot"));
    assert!(event.actioned_at.is_some());

    let events_after_first = store.event_count(HH).await.unwrap();
    let signals_scores = store.taste_scores(HH).await.unwrap();
    let winner_score = signals_scores
        .iter()
        .find(|s| s.meal_id == card.meal_id.clone().unwrap())
        .unwrap();
    let approvals_after_first = winner_score.approvals;
    let used_after_first: f64 = store
        .inventory_for_household(HH)
        .await
        .unwrap()
        .iter()
        .map(|i| i.qty_used_estimated)
        .sum();
    assert!(used_after_first > 0.0);

    // Retried call with the same context hash: same row, no extra hooks
    let second = decisions.decide(HH, &request).await.unwrap();
    assert_eq!(second.autopilot, Some(true));
    assert_eq!(
        second.decision.as_ref().unwrap().decision_event_id,
        card.decision_event_id
    );

    assert_eq!(store.event_count(HH).await.unwrap(), events_after_first);
    let used_after_second: f64 = store
        .inventory_for_household(HH)
        .await
        .unwrap()
        .iter()
        .map(|i| i.qty_used_estimated)
        .sum();
    assert_eq!(used_after_first, used_after_second);

    let scores = store.taste_scores(HH).await.unwrap();
    let winner_score = scores
        .iter()
        .find(|s| s.meal_id == card.meal_id.clone().unwrap())
        .unwrap();
    assert_eq!(winner_score.approvals, approvals_after_first);
}

#[actix_rt::test]
async fn outside_window_is_not_autopiloted() {
    let store = store();
    prime_household(&store, "2026-01-20T18:30:00-06:00").await;

    let decisions = DecisionService::new(store.clone());
    let response = decisions
        .decide(HH, &decision_request("2026-01-20T18:30:00-06:00", dinner_signal()))
        .await
        .unwrap();

    assert_eq!(response.autopilot, Some(false));
    let card = response.decision.as_ref().unwrap();
    let event = store
        .event_by_id(card.decision_event_id, Some(HH))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(event.user_action, "pending");
}

#[actix_rt::test]
async fn undo_throttles_autopilot_for_72_hours() {
    let store = store();
    prime_household(&store, "2026-01-20T17:30:00-06:00").await;

    let decisions = DecisionService::new(store.clone());
    let feedbacks = FeedbackService::new(store.clone());

    let first = decisions
        .decide(HH, &decision_request("2026-01-20T17:30:00-06:00", dinner_signal()))
        .await
        .unwrap();
    assert_eq!(first.autopilot, Some(true));
    let card = first.decision.as_ref().unwrap();

    // Household undoes the autopilot decision
    feedbacks
        .record(
            HH,
            &FeedbackRequest {
                event_id: card.decision_event_id,
                user_action: FeedbackAction::Undo,
                actioned_at: "2026-01-20T17:45:00-06:00".to_string(),
                notes: None,
            },
        )
        .await
        .unwrap();

    // The undo copy exists and the original is untouched
    let original = store
        .event_by_id(card.decision_event_id, Some(HH))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(original.user_action, "approved");
    let recent = store.recent_events(HH, 10).await.unwrap();
    assert!(recent
        .iter()
        .any(|e| e.notes.as_deref() == Some("undo_autopilot")));

    // Next evening, gates would pass, but the throttle suppresses autopilot
    let next_day = decisions
        .decide(HH, &decision_request("2026-01-21T17:30:00-06:00", dinner_signal()))
        .await
        .unwrap();
    assert_eq!(next_day.autopilot, Some(false));
}

#[actix_rt::test]
async fn undo_leaves_taste_scores_alone() {
    let store = store();
    prime_household(&store, "2026-01-20T17:30:00-06:00").await;

    let decisions = DecisionService::new(store.clone());
    let feedbacks = FeedbackService::new(store.clone());

    let first = decisions
        .decide(HH, &decision_request("2026-01-20T17:30:00-06:00", dinner_signal()))
        .await
        .unwrap();
    let card = first.decision.as_ref().unwrap();
    let meal_id = card.meal_id.clone().unwrap();

    let before = store
        .taste_scores(HH)
        .await
        .unwrap()
        .into_iter()
        .find(|s| s.meal_id == meal_id)
        .unwrap();

    feedbacks
        .record(
            HH,
            &FeedbackRequest {
                event_id: card.decision_event_id,
                user_action: FeedbackAction::Undo,
                actioned_at: "2026-01-20T17:45:00-06:00".to_string(),
                notes: None,
            },
        )
        .await
        .unwrap();

    let after = store
        .taste_scores(HH)
        .await
        .unwrap()
        .into_iter()
        .find(|s| s.meal_id == meal_id)
        .unwrap();

    assert_eq!(before.score, after.score);
    assert_eq!(before.approvals, after.approvals);
    assert_eq!(before.rejections, after.rejections);
}
