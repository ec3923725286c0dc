use std::collections::BTreeMap;

use chrono::NaiveDate;
use rota_core::DateRange;
use rota_shared::BookingSlot;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::urgency::{AvailabilityLevel, AvailabilityThresholds};

/// Capacity summary of one calendar date
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateAvailability {
    pub date: NaiveDate,
    pub level: AvailabilityLevel,
    /// Open slots on this date that fit the party
    pub slots_available: u32,
    /// Open slots on this date regardless of party size
    pub total_slots: u32,
    pub lowest_price: Option<i64>,
    pub highest_price: Option<i64>,
}

impl DateAvailability {
    fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            level: AvailabilityLevel::None,
            slots_available: 0,
            total_slots: 0,
            lowest_price: None,
            highest_price: None,
        }
    }
}

/// One entry per date of the query window
pub type Calendar = BTreeMap<NaiveDate, DateAvailability>;

/// Projects raw slot rows onto the calendar window.
///
/// Dates with nothing bookable still get an entry at level `none`. Prices
/// only consider slots that fit the party and carry an override.
pub fn aggregate_calendar(
    slots: &[BookingSlot],
    range: &DateRange,
    resource_id: Option<Uuid>,
    party_size: u32,
    thresholds: &AvailabilityThresholds,
) -> Calendar {
    let mut calendar: Calendar = range
        .start
        .iter_days()
        .take_while(|d| *d <= range.end)
        .map(|d| (d, DateAvailability::empty(d)))
        .collect();

    for slot in slots {
        if !slot.is_open() || !range.contains(slot.date) {
            continue;
        }
        if resource_id.is_some() && slot.resource_id != resource_id {
            continue;
        }

        let Some(day) = calendar.get_mut(&slot.date) else {
            continue;
        };
        day.total_slots += 1;

        if !slot.is_available_for(party_size) {
            continue;
        }
        day.slots_available += 1;

        if let Some(price) = slot.price_override {
            day.lowest_price = Some(day.lowest_price.map_or(price, |p| p.min(price)));
            day.highest_price = Some(day.highest_price.map_or(price, |p| p.max(price)));
        }
    }

    for day in calendar.values_mut() {
        day.level = thresholds.level_for(day.slots_available);
    }

    calendar
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::slot;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, day).unwrap()
    }

    #[test]
    fn test_one_entry_per_date() {
        let range = DateRange::new(d(1), d(7));
        let calendar = aggregate_calendar(&[], &range, None, 1, &AvailabilityThresholds::default());

        assert_eq!(calendar.len(), 7);
        assert!(calendar.values().all(|day| day.level == AvailabilityLevel::None));
    }

    #[test]
    fn test_capacity_filter_and_prices() {
        let range = DateRange::new(d(1), d(2));
        let mut cheap = slot(d(1), 9, 10, 2);
        cheap.price_override = Some(4500);
        let mut dear = slot(d(1), 11, 10, 0);
        dear.price_override = Some(6000);
        let mut full = slot(d(1), 14, 10, 9);
        full.price_override = Some(1000);

        let calendar = aggregate_calendar(
            &[cheap, dear, full],
            &range,
            None,
            3,
            &AvailabilityThresholds::default(),
        );
        let day = &calendar[&d(1)];

        assert_eq!(day.slots_available, 2);
        assert_eq!(day.total_slots, 3);
        assert_eq!(day.lowest_price, Some(4500));
        assert_eq!(day.highest_price, Some(6000));
        assert_eq!(day.level, AvailabilityLevel::Medium);
        assert_eq!(calendar[&d(2)].level, AvailabilityLevel::None);
    }

    #[test]
    fn test_resource_filter_and_closed_slots() {
        let range = DateRange::single(d(3));
        let guide = Uuid::new_v4();
        let mut with_guide = slot(d(3), 9, 8, 0);
        with_guide.resource_id = Some(guide);
        let other = slot(d(3), 10, 8, 0);
        let mut blocked = slot(d(3), 11, 8, 0);
        blocked.resource_id = Some(guide);
        blocked.status = rota_shared::SlotStatus::Blocked;

        let calendar = aggregate_calendar(
            &[with_guide, other, blocked],
            &range,
            Some(guide),
            1,
            &AvailabilityThresholds::default(),
        );

        assert_eq!(calendar[&d(3)].slots_available, 1);
        assert_eq!(calendar[&d(3)].lowest_price, None);
    }

    #[test]
    fn test_slots_outside_window_ignored() {
        let range = DateRange::single(d(3));
        let calendar = aggregate_calendar(
            &[slot(d(4), 9, 8, 0)],
            &range,
            None,
            1,
            &AvailabilityThresholds::default(),
        );
        assert_eq!(calendar.len(), 1);
        assert_eq!(calendar[&d(3)].slots_available, 0);
    }
}
