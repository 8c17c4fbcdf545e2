//! Shared fixtures for integration tests running against the in-memory store
#![allow(dead_code)]

use chrono::{DateTime, FixedOffset};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use arbiter_api::entity::{decision_event, inventory_item};
use arbiter_api::models::decision::DecisionRequest;
use arbiter_api::models::types::{ContextSignal, EnergyLevel, TimeWindow};
use arbiter_api::store::MemoryStore;

pub fn store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::new())
}

pub fn at(iso: &str) -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339(iso).unwrap()
}

pub fn dinner_signal() -> ContextSignal {
    ContextSignal {
        time_window: TimeWindow::Dinner,
        energy: EnergyLevel::Normal,
        calendar_conflict: false,
    }
}

pub fn decision_request(now_iso: &str, signal: ContextSignal) -> DecisionRequest {
    DecisionRequest {
        household_key: "hh-test".to_string(),
        now_iso: now_iso.to_string(),
        signal,
    }
}

pub fn pantry_item(
    household: &str,
    name: &str,
    confidence: f64,
    qty: f64,
    seen_iso: &str,
) -> inventory_item::Model {
    inventory_item::Model {
        id: Uuid::new_v4(),
        household_key: household.to_string(),
        item_name: name.to_string(),
        qty_estimated: Some(qty),
        qty_used_estimated: 0.0,
        unit: None,
        confidence,
        source: "receipt".to_string(),
        last_seen_at: at(seen_iso),
        last_used_at: None,
        expiry_date: None,
        decay_rate_per_day: 0.05,
        created_at: at(seen_iso),
    }
}

pub fn cook_event(
    household: &str,
    meal_id: &str,
    user_action: &str,
    when_iso: &str,
) -> decision_event::Model {
    decision_event::Model {
        id: Uuid::new_v4(),
        household_key: household.to_string(),
        decided_at: at(when_iso),
        decision_type: "cook".to_string(),
        meal_id: Some(meal_id.to_string()),
        external_vendor_key: None,
        context_hash: "test-ctx".to_string(),
        decision_payload: json!({}),
        user_action: user_action.to_string(),
        actioned_at: Some(at(when_iso)),
        notes: None,
    }
}

/// Recursively assert a JSON value contains no arrays anywhere
pub fn assert_no_arrays(value: &serde_json::Value, path: &str) {
    match value {
        serde_json::Value::Array(_) => panic!("array found in response at {}", path),
        serde_json::Value::Object(map) => {
            for (key, inner) in map {
                assert_no_arrays(inner, &format!("{}.{}", path, key));
            }
        }
        _ => {}
    }
}
