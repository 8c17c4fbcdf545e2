//! Inventory decay model — remaining quantity and confidence over time
//!
//! Quantity decays linearly from the last sighting; confidence decays with a
//! floor so an old receipt never proves absence. Rows are never deleted,
//! depletion is entirely time- and consumption-driven.

use chrono::{DateTime, FixedOffset};

use crate::entity::inventory_item;

/// Default linear quantity decay per day
pub const DEFAULT_DECAY_RATE: f64 = 0.05;

/// Confidence decay per day since last seen
pub const CONFIDENCE_DECAY_PER_DAY: f64 = 0.03;

/// Confidence multiplier never drops below this
pub const CONFIDENCE_FLOOR: f64 = 0.20;

/// Decayed confidence at or above this counts as "likely there"
pub const AVAILABILITY_THRESHOLD: f64 = 0.60;

/// Fractional days since the item was last seen. Future timestamps and
/// invalid spans floor at 0.
pub fn days_since_seen(item: &inventory_item::Model, now: DateTime<FixedOffset>) -> f64 {
    let seconds = (now - item.last_seen_at).num_seconds();
    if seconds <= 0 {
        return 0.0;
    }
    seconds as f64 / 86_400.0
}

/// Estimated remaining quantity.
///
/// None means the quantity was never estimated — unknown, treat as present.
pub fn remaining_quantity(
    item: &inventory_item::Model,
    now: DateTime<FixedOffset>,
) -> Option<f64> {
    let estimated = item.qty_estimated?;
    let base = (estimated - item.qty_used_estimated).max(0.0);
    let rate = if item.decay_rate_per_day > 0.0 {
        item.decay_rate_per_day
    } else {
        DEFAULT_DECAY_RATE
    };
    let multiplier = (1.0 - days_since_seen(item, now) * rate).max(0.0);
    Some((base * multiplier).max(0.0))
}

/// Confidence after time decay, clamped to [0, 1]
pub fn decayed_confidence(item: &inventory_item::Model, now: DateTime<FixedOffset>) -> f64 {
    let multiplier =
        (1.0 - days_since_seen(item, now) * CONFIDENCE_DECAY_PER_DAY).max(CONFIDENCE_FLOOR);
    (item.confidence * multiplier).clamp(0.0, 1.0)
}

/// Is this item probably still in the pantry?
pub fn likely_available(item: &inventory_item::Model, now: DateTime<FixedOffset>) -> bool {
    if decayed_confidence(item, now) < AVAILABILITY_THRESHOLD {
        return false;
    }
    match remaining_quantity(item, now) {
        Some(remaining) => remaining > 0.0,
        None => true,
    }
}
