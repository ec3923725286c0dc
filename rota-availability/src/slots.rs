use chrono::{NaiveDate, NaiveTime, Timelike};
use rota_shared::{BookingSlot, ResourceSummary};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::urgency::{urgency_level, UrgencyLevel};

/// A slot as presented on the time step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnhancedSlot {
    pub id: Uuid,
    pub resource_id: Option<Uuid>,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub display_start_time: String,
    pub display_end_time: String,
    pub max_capacity: i32,
    pub current_bookings: i32,
    pub spots_left: i32,
    /// Override if present, otherwise the attraction base price
    pub price: i64,
    pub price_override: Option<i64>,
    pub urgency_level: UrgencyLevel,
    pub resource: Option<ResourceSummary>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
}

impl TimeOfDay {
    pub fn of(time: NaiveTime) -> Self {
        match time.hour() {
            h if h < 12 => TimeOfDay::Morning,
            h if h < 17 => TimeOfDay::Afternoon,
            _ => TimeOfDay::Evening,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TimeOfDay::Morning => "Morning",
            TimeOfDay::Afternoon => "Afternoon",
            TimeOfDay::Evening => "Evening",
        }
    }

    pub fn time_range(&self) -> &'static str {
        match self {
            TimeOfDay::Morning => "6:00 AM - 12:00 PM",
            TimeOfDay::Afternoon => "12:00 PM - 5:00 PM",
            TimeOfDay::Evening => "5:00 PM - 10:00 PM",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSlotGroup {
    pub id: TimeOfDay,
    pub label: String,
    pub time_range: String,
    pub slots: Vec<EnhancedSlot>,
}

/// Bookable slots of one date for one party size
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotList {
    pub date: NaiveDate,
    pub party_size: u32,
    pub slots: Vec<EnhancedSlot>,
    pub groups: Vec<TimeSlotGroup>,
}

impl SlotList {
    pub fn slot(&self, id: &Uuid) -> Option<&EnhancedSlot> {
        self.slots.iter().find(|s| &s.id == id)
    }
}

pub fn display_time(time: NaiveTime) -> String {
    time.format("%-I:%M %p").to_string()
}

/// Builds the slot list for `date`: closed slots, slots of other dates or
/// resources, and slots that cannot fit the party are dropped; the rest is
/// ordered by start time and grouped by time of day.
pub fn build_slot_list(
    raw: Vec<BookingSlot>,
    date: NaiveDate,
    resource_id: Option<Uuid>,
    party_size: u32,
    base_price: i64,
) -> SlotList {
    let mut slots: Vec<EnhancedSlot> = raw
        .into_iter()
        .filter(|s| s.is_open() && s.date == date)
        .filter(|s| resource_id.is_none() || s.resource_id == resource_id)
        .filter(|s| s.is_available_for(party_size))
        .map(|s| enhance(s, base_price))
        .collect();
    slots.sort_by_key(|s| s.start_time);

    let groups = group_by_time_of_day(&slots);
    SlotList {
        date,
        party_size,
        slots,
        groups,
    }
}

fn enhance(slot: BookingSlot, base_price: i64) -> EnhancedSlot {
    let spots_left = slot.available_spots();
    EnhancedSlot {
        id: slot.id,
        resource_id: slot.resource_id,
        date: slot.date,
        start_time: slot.start_time,
        end_time: slot.end_time,
        display_start_time: display_time(slot.start_time),
        display_end_time: display_time(slot.end_time),
        max_capacity: slot.max_capacity,
        current_bookings: slot.current_bookings,
        spots_left,
        price: slot.price_override.unwrap_or(base_price),
        price_override: slot.price_override,
        urgency_level: urgency_level(spots_left, slot.max_capacity),
        resource: slot.resource,
    }
}

/// Empty groups are omitted
pub fn group_by_time_of_day(slots: &[EnhancedSlot]) -> Vec<TimeSlotGroup> {
    [TimeOfDay::Morning, TimeOfDay::Afternoon, TimeOfDay::Evening]
        .into_iter()
        .filter_map(|part| {
            let members: Vec<EnhancedSlot> = slots
                .iter()
                .filter(|s| TimeOfDay::of(s.start_time) == part)
                .cloned()
                .collect();
            (!members.is_empty()).then(|| TimeSlotGroup {
                id: part,
                label: part.label().to_string(),
                time_range: part.time_range().to_string(),
                slots: members,
            })
        })
        .collect()
}
