//! End-to-end decision and feedback flows against the in-memory store

mod common;

use common::*;

use arbiter_api::models::feedback::FeedbackRequest;
use arbiter_api::models::types::{EnergyLevel, FeedbackAction, TimeWindow};
use arbiter_api::services::{DecisionService, FeedbackService};
use arbiter_api::store::ArbiterStore;
use uuid::Uuid;

const HH: &str = "hh-test";

#[actix_rt::test]
async fn clean_cook_day_one() {
    let store = store();
    store
        .insert_inventory_item(pantry_item(HH, "chicken breast", 0.90, 2.0, "2026-01-20T18:30:00-06:00"))
        .await
        .unwrap();

    let decisions = DecisionService::new(store.clone());
    let response = decisions
        .decide(HH, &decision_request("2026-01-20T18:30:00-06:00", dinner_signal()))
        .await
        .unwrap();

    assert!(!response.drm_recommended);
    assert_eq!(response.autopilot, Some(false));
    let card = response.decision.as_ref().expect("a decision card");
    assert_eq!(card.meal_id.as_deref(), Some("meal-012"));
    assert_eq!(card.title, "Chicken Stir-Fry");
    assert!(!card.context_hash.is_empty());

    // The original row is pending until feedback arrives
    let original = store
        .event_by_id(card.decision_event_id, Some(HH))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(original.user_action, "pending");
    assert!(original.actioned_at.is_none());

    // Approve it
    let feedbacks = FeedbackService::new(store.clone());
    let response = feedbacks
        .record(
            HH,
            &FeedbackRequest {
                event_id: card.decision_event_id,
                user_action: FeedbackAction::Approved,
                actioned_at: "2026-01-20T18:30:00-06:00".to_string(),
                notes: None,
            },
        )
        .await
        .unwrap();
    assert!(response.recorded);

    // Original untouched, exactly one new row
    let original = store
        .event_by_id(card.decision_event_id, Some(HH))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(original.user_action, "pending");
    assert!(original.actioned_at.is_none());
    assert_eq!(store.event_count(HH).await.unwrap(), 2);

    // Consumption drew down the matched chicken breast
    let inventory = store.inventory_for_household(HH).await.unwrap();
    let chicken = inventory.iter().find(|i| i.item_name == "chicken breast").unwrap();
    assert!(chicken.qty_used_estimated > 0.0);
    assert!(chicken.last_used_at.is_some());

    // Taste cache: +1.0, one approval (18:30 is before the stress hour)
    let scores = store.taste_scores(HH).await.unwrap();
    let score = scores.iter().find(|s| s.meal_id == "meal-012").unwrap();
    assert!((score.score - 1.0).abs() < 1e-9);
    assert_eq!(score.approvals, 1);
    assert_eq!(score.rejections, 0);
}

#[actix_rt::test]
async fn two_quick_rejections_route_to_drm() {
    let store = store();
    store
        .insert_event(cook_event(HH, "meal-001", "rejected", "2026-01-20T18:50:00-06:00"))
        .await
        .unwrap();
    store
        .insert_event(cook_event(HH, "meal-002", "rejected", "2026-01-20T18:55:00-06:00"))
        .await
        .unwrap();

    let decisions = DecisionService::new(store.clone());
    let response = decisions
        .decide(HH, &decision_request("2026-01-20T19:00:00-06:00", dinner_signal()))
        .await
        .unwrap();

    assert!(response.decision.is_none());
    assert!(response.drm_recommended);
    assert_eq!(response.reason.as_deref(), Some("two_rejections"));
    // autopilot is not evaluated on the DRM path
    assert_eq!(response.autopilot, None);
}

#[actix_rt::test]
async fn late_evening_approval_gets_stress_multiplier() {
    let store = store();
    let original = cook_event(HH, "meal-001", "pending", "2026-01-20T18:00:00-06:00");
    let original_id = original.id;
    store.insert_event(original).await.unwrap();

    let feedbacks = FeedbackService::new(store.clone());
    feedbacks
        .record(
            HH,
            &FeedbackRequest {
                event_id: original_id,
                user_action: FeedbackAction::Approved,
                actioned_at: "2026-01-20T20:00:00-06:00".to_string(),
                notes: None,
            },
        )
        .await
        .unwrap();

    let scores = store.taste_scores(HH).await.unwrap();
    let score = scores.iter().find(|s| s.meal_id == "meal-001").unwrap();
    assert!((score.score - 1.10).abs() < 1e-9);
    assert_eq!(score.approvals, 1);
}

#[actix_rt::test]
async fn feedback_for_unknown_event_still_succeeds() {
    let store = store();
    let feedbacks = FeedbackService::new(store.clone());

    let response = feedbacks
        .record(
            HH,
            &FeedbackRequest {
                event_id: Uuid::new_v4(),
                user_action: FeedbackAction::Rejected,
                actioned_at: "2026-01-20T19:00:00-06:00".to_string(),
                notes: None,
            },
        )
        .await
        .unwrap();

    assert!(response.recorded);
    // The append-only log still gained a row
    assert_eq!(store.event_count(HH).await.unwrap(), 1);
    // ... and nothing touched inventory
    assert!(store.inventory_for_household(HH).await.unwrap().is_empty());
}

#[actix_rt::test]
async fn non_approved_feedback_never_touches_inventory() {
    let store = store();
    store
        .insert_inventory_item(pantry_item(HH, "chicken breast", 0.90, 2.0, "2026-01-20T18:00:00-06:00"))
        .await
        .unwrap();
    let original = cook_event(HH, "meal-012", "pending", "2026-01-20T18:00:00-06:00");
    let original_id = original.id;
    store.insert_event(original).await.unwrap();

    let feedbacks = FeedbackService::new(store.clone());
    feedbacks
        .record(
            HH,
            &FeedbackRequest {
                event_id: original_id,
                user_action: FeedbackAction::Rejected,
                actioned_at: "2026-01-20T19:00:00-06:00".to_string(),
                notes: None,
            },
        )
        .await
        .unwrap();

    let inventory = store.inventory_for_household(HH).await.unwrap();
    let chicken = inventory.iter().find(|i| i.item_name == "chicken breast").unwrap();
    assert_eq!(chicken.qty_used_estimated, 0.0);
    assert!(chicken.last_used_at.is_none());

    // rejection still lands in the taste cache
    let scores = store.taste_scores(HH).await.unwrap();
    let score = scores.iter().find(|s| s.meal_id == "meal-012").unwrap();
    assert_eq!(score.rejections, 1);
    assert!(score.score < 0.0);
}

#[actix_rt::test]
async fn decision_response_contains_no_arrays() {
    let store = store();
    let decisions = DecisionService::new(store.clone());

    let decided = decisions
        .decide(HH, &decision_request("2026-01-20T18:30:00-06:00", dinner_signal()))
        .await
        .unwrap();
    assert_no_arrays(&serde_json::to_value(&decided).unwrap(), "$");

    // DRM-shaped responses too
    let mut low_energy = dinner_signal();
    low_energy.energy = EnergyLevel::Low;
    let drm = decisions
        .decide(HH, &decision_request("2026-01-20T19:00:00-06:00", low_energy))
        .await
        .unwrap();
    assert_no_arrays(&serde_json::to_value(&drm).unwrap(), "$");
}

#[actix_rt::test]
async fn identical_inputs_pick_the_same_meal() {
    let store = store();
    store
        .insert_inventory_item(pantry_item(HH, "chicken breast", 0.90, 2.0, "2026-01-20T12:00:00-06:00"))
        .await
        .unwrap();

    let decisions = DecisionService::new(store.clone());
    let request = decision_request("2026-01-20T12:00:00-06:00", {
        let mut s = dinner_signal();
        s.time_window = TimeWindow::Lunch;
        s
    });

    let first = decisions.decide(HH, &request).await.unwrap();
    let second = decisions.decide(HH, &request).await.unwrap();
    assert_eq!(
        first.decision.as_ref().unwrap().meal_id,
        second.decision.as_ref().unwrap().meal_id
    );
}
