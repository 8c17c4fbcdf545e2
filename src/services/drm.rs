//! Dinner Rescue Mode — trigger evaluation and rescue selection
//!
//! Trigger rules are priority-ordered and the first hit wins:
//!   1. calendar_conflict  2. low_energy  3. two_rejections  4. late_no_action
//!
//! The rescue service picks one order/zero-cook option from the seeded
//! catalog: highest confidence first, skipping any pattern already used for
//! a rescue in the last 72 hours. Three consecutive rescues without an
//! approval mark the household exhausted.

use chrono::{DateTime, Datelike, Duration, FixedOffset, Timelike};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::entity::decision_event;
use crate::errors::AppError;
use crate::models::drm::{DrmResponse, RescueCard, RescueType};
use crate::models::types::{notes, ContextSignal, EnergyLevel, TimeWindow, UserAction};
use crate::store::{ArbiterStore, RECENT_EVENT_LIMIT};

/// Two rejections within this window trigger rescue
pub const REJECTION_WINDOW_MINUTES: i64 = 30;

/// Hard late-evening cutoff (local clock)
pub const LATE_HOUR: u32 = 20;

/// Softer cutoff that needs engagement-without-approval to trigger
pub const ENGAGED_HOUR: u32 = 18;

/// Same rescue pattern is suppressed for this long
pub const PATTERN_SUPPRESSION_HOURS: i64 = 72;

/// Consecutive unapproved rescues before the household is exhausted
pub const EXHAUSTION_COUNT: usize = 3;

struct RescueOption {
    rescue_type: RescueType,
    vendor_key: Option<&'static str>,
    title: &'static str,
    est_minutes: i32,
    deep_link_url: Option<&'static str>,
    confidence: f64,
}

/// Seeded rescue catalog, consulted highest-confidence first
const RESCUE_OPTIONS: &[RescueOption] = &[
    RescueOption {
        rescue_type: RescueType::Order,
        vendor_key: Some("vendor-pizzeria"),
        title: "Order: Neighborhood Pizza",
        est_minutes: 35,
        deep_link_url: Some("https://order.example.com/pizzeria"),
        confidence: 0.90,
    },
    RescueOption {
        rescue_type: RescueType::Order,
        vendor_key: Some("vendor-thai-express"),
        title: "Order: Thai Express",
        est_minutes: 40,
        deep_link_url: Some("https://order.example.com/thai-express"),
        confidence: 0.80,
    },
    RescueOption {
        rescue_type: RescueType::ZeroCook,
        vendor_key: None,
        title: "Zero-cook: Pantry Plate Night",
        est_minutes: 10,
        deep_link_url: None,
        confidence: 0.70,
    },
    RescueOption {
        rescue_type: RescueType::ZeroCook,
        vendor_key: None,
        title: "Zero-cook: Breakfast for Dinner",
        est_minutes: 15,
        deep_link_url: None,
        confidence: 0.60,
    },
];

fn event_time(event: &decision_event::Model) -> DateTime<FixedOffset> {
    event.actioned_at.unwrap_or(event.decided_at)
}

fn same_local_day(a: DateTime<FixedOffset>, b: DateTime<FixedOffset>) -> bool {
    a.year() == b.year() && a.ordinal() == b.ordinal()
}

/// Priority-ordered trigger evaluation. Later rules are not evaluated once
/// one hits.
pub fn evaluate_triggers(
    now: DateTime<FixedOffset>,
    signal: &ContextSignal,
    recent_events: &[decision_event::Model],
) -> Option<&'static str> {
    // 1. hard calendar conflict
    if signal.calendar_conflict {
        return Some("calendar_conflict");
    }

    // 2. household has no energy to decide
    if signal.energy == EnergyLevel::Low {
        return Some("low_energy");
    }

    // 3. two rejections inside the 30-minute window
    let rejection_cutoff = now - Duration::minutes(REJECTION_WINDOW_MINUTES);
    let recent_rejections = recent_events
        .iter()
        .filter(|e| {
            e.user_action == UserAction::Rejected.as_str() && event_time(e) >= rejection_cutoff
        })
        .count();
    if recent_rejections >= 2 {
        return Some("two_rejections");
    }

    // 4. dinner window, late, and still nothing approved today
    if signal.time_window == TimeWindow::Dinner {
        let hour = now.hour();
        let engaged_today = recent_events.iter().any(|e| {
            same_local_day(event_time(e), now)
                && matches!(e.user_action.as_str(), "pending" | "rejected" | "expired")
        });
        let approved_today = recent_events.iter().any(|e| {
            same_local_day(event_time(e), now) && e.user_action == UserAction::Approved.as_str()
        });
        if hour >= LATE_HOUR || (hour >= ENGAGED_HOUR && engaged_today && !approved_today) {
            return Some("late_no_action");
        }
    }

    None
}

pub struct DrmService {
    store: Arc<dyn ArbiterStore>,
}

impl DrmService {
    pub fn new(store: Arc<dyn ArbiterStore>) -> Self {
        Self { store }
    }

    /// Count rescues since the last approval, newest first
    fn consecutive_unapproved_rescues(recent_events: &[decision_event::Model]) -> usize {
        let mut count = 0;
        for event in recent_events {
            if event.user_action == UserAction::Approved.as_str() {
                break;
            }
            if event.notes.as_deref() == Some(notes::DRM) {
                count += 1;
            }
        }
        count
    }

    /// Resolve a rescue: pick an option, append the decision event, report
    /// exhaustion.
    pub async fn rescue(
        &self,
        household_key: &str,
        trigger_reason: &str,
        now: DateTime<FixedOffset>,
    ) -> Result<DrmResponse, AppError> {
        let recent = self.store.recent_events(household_key, RECENT_EVENT_LIMIT).await?;

        // Patterns used for a rescue within the suppression window
        let suppression_cutoff = now - Duration::hours(PATTERN_SUPPRESSION_HOURS);
        let suppressed: Vec<(String, Option<String>)> = recent
            .iter()
            .filter(|e| {
                e.notes.as_deref() == Some(notes::DRM) && event_time(e) >= suppression_cutoff
            })
            .map(|e| (e.decision_type.clone(), e.external_vendor_key.clone()))
            .collect();

        let is_suppressed = |option: &RescueOption| {
            let decision_type = match option.rescue_type {
                RescueType::Order => "order",
                RescueType::ZeroCook => "zero_cook",
            };
            suppressed.iter().any(|(dt, vendor)| {
                dt == decision_type && vendor.as_deref() == option.vendor_key
            })
        };

        // Highest confidence not recently used; if everything is suppressed,
        // fall back to the best option outright — rescue never returns empty
        let option = RESCUE_OPTIONS
            .iter()
            .filter(|o| !is_suppressed(o))
            .max_by(|a, b| a.confidence.partial_cmp(&b.confidence).unwrap_or(std::cmp::Ordering::Equal))
            .unwrap_or(&RESCUE_OPTIONS[0]);

        let decision_type = match option.rescue_type {
            RescueType::Order => "order",
            RescueType::ZeroCook => "zero_cook",
        };

        let event_id = Uuid::new_v4();
        let event = decision_event::Model {
            id: event_id,
            household_key: household_key.to_string(),
            decided_at: now,
            decision_type: decision_type.to_string(),
            meal_id: None,
            external_vendor_key: option.vendor_key.map(str::to_string),
            context_hash: crate::services::decision::context_hash_for_rescue(
                household_key,
                now,
                trigger_reason,
            ),
            decision_payload: json!({
                "title": option.title,
                "estMinutes": option.est_minutes,
                "deepLinkUrl": option.deep_link_url,
                "triggerReason": trigger_reason,
            }),
            user_action: UserAction::Pending.as_str().to_string(),
            actioned_at: None,
            notes: Some(notes::DRM.to_string()),
        };
        self.store.insert_event(event).await?;

        // The fresh rescue counts toward exhaustion
        let exhausted = Self::consecutive_unapproved_rescues(&recent) + 1 >= EXHAUSTION_COUNT;

        Ok(DrmResponse {
            rescue: RescueCard {
                rescue_type: option.rescue_type,
                decision_event_id: event_id,
                title: option.title.to_string(),
                est_minutes: option.est_minutes,
                vendor_key: option.vendor_key.map(str::to_string),
                deep_link_url: option.deep_link_url.map(str::to_string),
            },
            exhausted,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(iso: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(iso).unwrap()
    }

    fn signal(energy: EnergyLevel, conflict: bool) -> ContextSignal {
        ContextSignal {
            time_window: TimeWindow::Dinner,
            energy,
            calendar_conflict: conflict,
        }
    }

    fn event(action: &str, when: &str) -> decision_event::Model {
        decision_event::Model {
            id: Uuid::new_v4(),
            household_key: "hh-1".to_string(),
            decided_at: at(when),
            decision_type: "cook".to_string(),
            meal_id: Some("meal-001".to_string()),
            external_vendor_key: None,
            context_hash: "ctx".to_string(),
            decision_payload: json!({}),
            user_action: action.to_string(),
            actioned_at: Some(at(when)),
            notes: None,
        }
    }

    #[test]
    fn priority_order_first_hit_wins() {
        // calendar conflict outranks low energy
        let both = signal(EnergyLevel::Low, true);
        assert_eq!(
            evaluate_triggers(at("2026-01-20T19:00:00-06:00"), &both, &[]),
            Some("calendar_conflict")
        );

        let low = signal(EnergyLevel::Low, false);
        assert_eq!(
            evaluate_triggers(at("2026-01-20T19:00:00-06:00"), &low, &[]),
            Some("low_energy")
        );
    }

    #[test]
    fn two_quick_rejections_trigger() {
        let events = vec![
            event("rejected", "2026-01-20T18:50:00-06:00"),
            event("rejected", "2026-01-20T18:55:00-06:00"),
        ];
        assert_eq!(
            evaluate_triggers(
                at("2026-01-20T19:00:00-06:00"),
                &signal(EnergyLevel::Normal, false),
                &events
            ),
            Some("two_rejections")
        );

        // one rejection is not enough
        let events = vec![event("rejected", "2026-01-20T18:55:00-06:00")];
        assert_eq!(
            evaluate_triggers(
                at("2026-01-20T19:00:00-06:00"),
                &signal(EnergyLevel::Normal, false),
                &events
            ),
            None
        );
    }

    #[test]
    fn late_no_action_paths() {
        let sig = signal(EnergyLevel::Normal, false);

        // hard cutoff at 8 PM regardless of engagement
        assert_eq!(
            evaluate_triggers(at("2026-01-20T20:01:00-06:00"), &sig, &[]),
            Some("late_no_action")
        );

        // 6 PM with engagement but no approval today
        let engaged = vec![event("rejected", "2026-01-20T12:00:00-06:00")];
        assert_eq!(
            evaluate_triggers(at("2026-01-20T18:30:00-06:00"), &sig, &engaged),
            Some("late_no_action")
        );

        // 6 PM with an approval today: no trigger
        let approved = vec![
            event("rejected", "2026-01-20T12:00:00-06:00"),
            event("approved", "2026-01-20T13:00:00-06:00"),
        ];
        assert_eq!(
            evaluate_triggers(at("2026-01-20T18:30:00-06:00"), &sig, &approved),
            None
        );

        // 6 PM with no engagement at all: no trigger
        assert_eq!(evaluate_triggers(at("2026-01-20T18:30:00-06:00"), &sig, &[]), None);
    }

    #[test]
    fn non_dinner_windows_never_late_trigger() {
        let sig = ContextSignal {
            time_window: TimeWindow::Lunch,
            energy: EnergyLevel::Normal,
            calendar_conflict: false,
        };
        assert_eq!(evaluate_triggers(at("2026-01-20T21:00:00-06:00"), &sig, &[]), None);
    }

    #[test]
    fn exhaustion_counts_rescues_since_last_approval() {
        let mut events = vec![
            {
                let mut e = event("pending", "2026-01-20T19:00:00-06:00");
                e.notes = Some("drm".to_string());
                e
            },
            {
                let mut e = event("pending", "2026-01-20T18:00:00-06:00");
                e.notes = Some("drm".to_string());
                e
            },
        ];
        assert_eq!(DrmService::consecutive_unapproved_rescues(&events), 2);

        // an approval in between resets the streak
        events.insert(1, event("approved", "2026-01-20T18:30:00-06:00"));
        assert_eq!(DrmService::consecutive_unapproved_rescues(&events), 1);
    }
}
