//! Autopilot policy — eight ordered gates plus the undo throttle
//!
//! Gates are evaluated in a fixed order and the first failure's reason is
//! reported. All thresholds are named constants. The 72-hour undo throttle
//! is a pre-gate suppression, not a gate reason: a household that recently
//! undid an autopilot decision gets no autopilot at all.

use chrono::{DateTime, Duration, FixedOffset, Timelike};

use crate::entity::decision_event;
use crate::models::types::{notes, ContextSignal, EnergyLevel, UserAction};

/// Autopilot window, inclusive on both ends (local clock)
pub const WINDOW_START_MINUTES: u32 = 17 * 60;
pub const WINDOW_END_MINUTES: u32 = 18 * 60 + 15;

pub const MIN_INVENTORY_SCORE: f64 = 0.85;
pub const MIN_TASTE_SCORE: f64 = 0.70;

/// A meal approved within this many days is too recent to autopilot
pub const MEAL_REUSE_LOCKOUT_DAYS: i64 = 3;

/// Rolling approval-rate window and threshold
pub const APPROVAL_RATE_WINDOW_DAYS: i64 = 7;
pub const MIN_APPROVAL_RATE: f64 = 0.70;

/// A rejection within this many hours blocks autopilot (inclusive boundary)
pub const RECENT_REJECTION_HOURS: i64 = 24;

/// Undo feedback suppresses autopilot for this long
pub const UNDO_THROTTLE_HOURS: i64 = 72;

pub const ALL_GATES_PASSED: &str = "all_gates_passed";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Eligibility {
    pub eligible: bool,
    pub reason: &'static str,
}

pub struct AutopilotInput<'a> {
    pub now: DateTime<FixedOffset>,
    pub signal: &'a ContextSignal,
    /// Household fallback inventory score (mean of top-K meals)
    pub inventory_score: f64,
    /// Household fallback taste score
    pub taste_score: f64,
    /// The meal the arbiter picked
    pub meal_id: &'a str,
    /// Recent events, decided_at descending
    pub recent_events: &'a [decision_event::Model],
}

/// Timestamp a feedback-style event counts at
fn event_time(event: &decision_event::Model) -> DateTime<FixedOffset> {
    event.actioned_at.unwrap_or(event.decided_at)
}

/// Evaluate the eight gates in order; the first failure wins.
pub fn evaluate_gates(input: &AutopilotInput<'_>) -> Eligibility {
    let fail = |reason| Eligibility { eligible: false, reason };

    // 1. local clock inside the autopilot window
    let minutes = input.now.hour() * 60 + input.now.minute();
    if !(WINDOW_START_MINUTES..=WINDOW_END_MINUTES).contains(&minutes) {
        return fail("outside_autopilot_window");
    }

    // 2. no calendar conflict
    if input.signal.calendar_conflict {
        return fail("calendar_conflict");
    }

    // 3. energy is not low
    if input.signal.energy == EnergyLevel::Low {
        return fail("low_energy");
    }

    // 4. inventory strong enough
    if input.inventory_score < MIN_INVENTORY_SCORE {
        return fail("low_inventory_score");
    }

    // 5. taste strong enough
    if input.taste_score < MIN_TASTE_SCORE {
        return fail("low_taste_score");
    }

    // 6. meal not approved in the last 3 local days
    let reuse_cutoff = input.now - Duration::days(MEAL_REUSE_LOCKOUT_DAYS);
    let reused = input.recent_events.iter().any(|e| {
        e.user_action == UserAction::Approved.as_str()
            && e.meal_id.as_deref() == Some(input.meal_id)
            && event_time(e) >= reuse_cutoff
    });
    if reused {
        return fail("meal_used_recently");
    }

    // 7. rolling 7-day approval rate; an empty window gets the benefit of
    // the doubt
    let rate_cutoff = input.now - Duration::days(APPROVAL_RATE_WINDOW_DAYS);
    let mut approved = 0u32;
    let mut rejected = 0u32;
    for event in input.recent_events {
        if event_time(event) < rate_cutoff {
            continue;
        }
        match event.user_action.as_str() {
            "approved" => approved += 1,
            "rejected" => rejected += 1,
            _ => {}
        }
    }
    let rate = if approved + rejected == 0 {
        1.0
    } else {
        f64::from(approved) / f64::from(approved + rejected)
    };
    if rate < MIN_APPROVAL_RATE {
        return fail("low_approval_rate");
    }

    // 8. no rejection in the last 24 hours, boundary inclusive
    let rejection_cutoff = input.now - Duration::hours(RECENT_REJECTION_HOURS);
    let recently_rejected = input.recent_events.iter().any(|e| {
        e.user_action == UserAction::Rejected.as_str() && event_time(e) >= rejection_cutoff
    });
    if recently_rejected {
        return fail("recent_rejection");
    }

    Eligibility { eligible: true, reason: ALL_GATES_PASSED }
}

/// Pre-gate suppression: any undo feedback inside the throttle window
/// disables autopilot outright.
pub fn undo_throttled(
    recent_events: &[decision_event::Model],
    now: DateTime<FixedOffset>,
) -> bool {
    let cutoff = now - Duration::hours(UNDO_THROTTLE_HOURS);
    recent_events.iter().any(|e| {
        e.notes.as_deref() == Some(notes::UNDO_AUTOPILOT) && event_time(e) >= cutoff
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::types::TimeWindow;
    use serde_json::json;
    use uuid::Uuid;

    fn signal() -> ContextSignal {
        ContextSignal {
            time_window: TimeWindow::Dinner,
            energy: EnergyLevel::Normal,
            calendar_conflict: false,
        }
    }

    fn at(iso: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(iso).unwrap()
    }

    fn event(action: &str, meal: Option<&str>, when: &str, note: Option<&str>) -> decision_event::Model {
        decision_event::Model {
            id: Uuid::new_v4(),
            household_key: "hh-1".to_string(),
            decided_at: at(when),
            decision_type: "cook".to_string(),
            meal_id: meal.map(str::to_string),
            external_vendor_key: None,
            context_hash: "ctx".to_string(),
            decision_payload: json!({}),
            user_action: action.to_string(),
            actioned_at: Some(at(when)),
            notes: note.map(str::to_string),
        }
    }

    fn input<'a>(
        now: &str,
        signal: &'a ContextSignal,
        events: &'a [decision_event::Model],
    ) -> AutopilotInput<'a> {
        AutopilotInput {
            now: at(now),
            signal,
            inventory_score: 0.90,
            taste_score: 0.80,
            meal_id: "meal-012",
            recent_events: events,
        }
    }

    #[test]
    fn window_boundaries_are_inclusive() {
        let sig = signal();
        let passed = evaluate_gates(&input("2026-01-20T17:00:00-06:00", &sig, &[]));
        assert!(passed.eligible);

        let passed = evaluate_gates(&input("2026-01-20T18:15:00-06:00", &sig, &[]));
        assert!(passed.eligible);
        assert_eq!(passed.reason, ALL_GATES_PASSED);

        let failed = evaluate_gates(&input("2026-01-20T18:16:00-06:00", &sig, &[]));
        assert_eq!(failed.reason, "outside_autopilot_window");

        let failed = evaluate_gates(&input("2026-01-20T16:59:00-06:00", &sig, &[]));
        assert!(!failed.eligible);
    }

    #[test]
    fn first_failing_gate_wins() {
        // calendar conflict and low energy both hold; gate 2 is reported
        let sig = ContextSignal {
            time_window: TimeWindow::Dinner,
            energy: EnergyLevel::Low,
            calendar_conflict: true,
        };
        let result = evaluate_gates(&input("2026-01-20T17:30:00-06:00", &sig, &[]));
        assert_eq!(result.reason, "calendar_conflict");
    }

    #[test]
    fn score_gates() {
        let sig = signal();
        let mut inp = input("2026-01-20T17:30:00-06:00", &sig, &[]);
        inp.inventory_score = 0.84;
        assert_eq!(evaluate_gates(&inp).reason, "low_inventory_score");

        let mut inp = input("2026-01-20T17:30:00-06:00", &sig, &[]);
        inp.taste_score = 0.69;
        assert_eq!(evaluate_gates(&inp).reason, "low_taste_score");
    }

    #[test]
    fn recently_approved_meal_is_locked_out() {
        let sig = signal();
        let events = vec![event("approved", Some("meal-012"), "2026-01-19T18:00:00-06:00", None)];
        let result = evaluate_gates(&input("2026-01-20T17:30:00-06:00", &sig, &events));
        assert_eq!(result.reason, "meal_used_recently");

        // a different meal does not trip the gate
        let events = vec![event("approved", Some("meal-001"), "2026-01-19T18:00:00-06:00", None)];
        let result = evaluate_gates(&input("2026-01-20T17:30:00-06:00", &sig, &events));
        assert!(result.eligible);
    }

    #[test]
    fn approval_rate_counts_only_approved_and_rejected() {
        let sig = signal();
        // 1 approval, 2 rejections in window -> rate 1/3. Rejections are old
        // enough (> 24 h) not to trip gate 8 first.
        let events = vec![
            event("approved", Some("meal-001"), "2026-01-16T18:00:00-06:00", None),
            event("rejected", Some("meal-002"), "2026-01-16T19:00:00-06:00", None),
            event("rejected", Some("meal-003"), "2026-01-17T10:00:00-06:00", None),
            event("expired", Some("meal-004"), "2026-01-17T12:00:00-06:00", None),
        ];
        let result = evaluate_gates(&input("2026-01-20T17:30:00-06:00", &sig, &events));
        assert_eq!(result.reason, "low_approval_rate");
    }

    #[test]
    fn rejection_exactly_24_hours_ago_is_recent() {
        let sig = signal();
        // approvals keep the rate gate satisfied
        let events = vec![
            event("approved", Some("meal-001"), "2026-01-18T18:00:00-06:00", None),
            event("approved", Some("meal-002"), "2026-01-17T18:00:00-06:00", None),
            event("approved", Some("meal-003"), "2026-01-16T18:00:00-06:00", None),
            event("approved", Some("meal-004"), "2026-01-15T18:00:00-06:00", None),
            event("approved", Some("meal-005"), "2026-01-14T18:00:00-06:00", None),
            event("approved", Some("meal-006"), "2026-01-20T10:00:00-06:00", None),
            event("approved", Some("meal-007"), "2026-01-19T12:00:00-06:00", None),
            event("rejected", Some("meal-008"), "2026-01-19T17:30:00-06:00", None),
        ];
        let result = evaluate_gates(&input("2026-01-20T17:30:00-06:00", &sig, &events));
        assert_eq!(result.reason, "recent_rejection");
    }

    #[test]
    fn undo_throttle_covers_72_hours() {
        let undo = vec![event(
            "rejected",
            Some("meal-012"),
            "2026-01-18T18:00:00-06:00",
            Some("undo_autopilot"),
        )];
        assert!(undo_throttled(&undo, at("2026-01-20T17:30:00-06:00")));
        assert!(!undo_throttled(&undo, at("2026-01-22T18:00:01-06:00")));
    }
}
