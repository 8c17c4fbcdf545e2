//! Dinner Rescue Mode: selection, pattern suppression and exhaustion

mod common;

use common::*;

use arbiter_api::models::drm::RescueType;
use arbiter_api::services::DrmService;
use arbiter_api::store::ArbiterStore;

const HH: &str = "hh-test";

#[actix_rt::test]
async fn first_rescue_is_the_highest_confidence_option() {
    let store = store();
    let rescues = DrmService::new(store.clone());

    let response = rescues
        .rescue(HH, "two_rejections", at("2026-01-20T19:00:00-06:00"))
        .await
        .unwrap();

    assert_eq!(response.rescue.rescue_type, RescueType::Order);
    assert_eq!(response.rescue.vendor_key.as_deref(), Some("vendor-pizzeria"));
    assert!(response.rescue.deep_link_url.is_some());
    assert!(!response.exhausted);

    // A pending rescue event landed in the log
    let event = store
        .event_by_id(response.rescue.decision_event_id, Some(HH))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(event.decision_type, "order");
    assert_eq!(event.user_action, "pending");
    assert_eq!(event.notes.as_deref(), Some("drm"));
    assert_eq!(event.external_vendor_key.as_deref(), Some("vendor-pizzeria"));
}

#[actix_rt::test]
async fn repeated_rescues_rotate_patterns_and_exhaust() {
    let store = store();
    let rescues = DrmService::new(store.clone());

    let first = rescues
        .rescue(HH, "low_energy", at("2026-01-20T19:00:00-06:00"))
        .await
        .unwrap();
    assert_eq!(first.rescue.vendor_key.as_deref(), Some("vendor-pizzeria"));
    assert!(!first.exhausted);

    // Same pattern suppressed within 72 h: next best option surfaces
    let second = rescues
        .rescue(HH, "low_energy", at("2026-01-21T19:00:00-06:00"))
        .await
        .unwrap();
    assert_eq!(second.rescue.vendor_key.as_deref(), Some("vendor-thai-express"));
    assert!(!second.exhausted);

    // Third consecutive unapproved rescue: zero-cook, and exhausted
    let third = rescues
        .rescue(HH, "low_energy", at("2026-01-22T19:00:00-06:00"))
        .await
        .unwrap();
    assert_eq!(third.rescue.rescue_type, RescueType::ZeroCook);
    assert!(third.exhausted);
}

#[actix_rt::test]
async fn approval_resets_the_exhaustion_streak() {
    let store = store();
    let rescues = DrmService::new(store.clone());

    rescues
        .rescue(HH, "low_energy", at("2026-01-20T19:00:00-06:00"))
        .await
        .unwrap();
    rescues
        .rescue(HH, "low_energy", at("2026-01-21T19:00:00-06:00"))
        .await
        .unwrap();

    // Household approves something in between
    store
        .insert_event(cook_event(HH, "meal-001", "approved", "2026-01-22T18:00:00-06:00"))
        .await
        .unwrap();

    let next = rescues
        .rescue(HH, "low_energy", at("2026-01-22T19:00:00-06:00"))
        .await
        .unwrap();
    assert!(!next.exhausted);
}

#[actix_rt::test]
async fn suppression_expires_after_72_hours() {
    let store = store();
    let rescues = DrmService::new(store.clone());

    let first = rescues
        .rescue(HH, "low_energy", at("2026-01-20T19:00:00-06:00"))
        .await
        .unwrap();
    assert_eq!(first.rescue.vendor_key.as_deref(), Some("vendor-pizzeria"));

    // Four days later the pizzeria pattern is fair game again
    let later = rescues
        .rescue(HH, "low_energy", at("2026-01-24T20:00:00-06:00"))
        .await
        .unwrap();
    assert_eq!(later.rescue.vendor_key.as_deref(), Some("vendor-pizzeria"));
}
