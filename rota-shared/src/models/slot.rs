use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Slot status as stored by the data layer
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SlotStatus {
    Available,
    Booked,
    Blocked,
    Maintenance,
}

/// Compact view of the resource attached to a slot
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResourceSummary {
    pub id: Uuid,
    pub name: String,
    pub photo_url: Option<String>,
    #[serde(default)]
    pub specialties: Vec<String>,
}

/// Read-only projection of a bookable time window.
///
/// `date`, `start_time` and `end_time` are expressed in the attraction's local
/// time; the data layer is responsible for that conversion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingSlot {
    pub id: Uuid,
    pub attraction_id: Uuid,
    pub resource_id: Option<Uuid>,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub max_capacity: i32,
    pub current_bookings: i32,
    /// Price in minor currency units, replacing the attraction base price
    pub price_override: Option<i64>,
    pub status: SlotStatus,
    #[serde(default)]
    pub resource: Option<ResourceSummary>,
}

impl BookingSlot {
    /// Remaining seats. An over-booked row reports zero.
    pub fn available_spots(&self) -> i32 {
        let raw = self.max_capacity - self.current_bookings;
        if raw < 0 {
            tracing::warn!(
                slot_id = %self.id,
                max_capacity = self.max_capacity,
                current_bookings = self.current_bookings,
                "Slot reports more bookings than capacity, treating as full"
            );
            return 0;
        }
        raw
    }

    /// Whether a party of `party_size` still fits
    pub fn is_available_for(&self, party_size: u32) -> bool {
        i64::from(self.available_spots()) >= i64::from(party_size)
    }

    pub fn is_open(&self) -> bool {
        self.status == SlotStatus::Available
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(max_capacity: i32, current_bookings: i32) -> BookingSlot {
        BookingSlot {
            id: Uuid::new_v4(),
            attraction_id: Uuid::new_v4(),
            resource_id: None,
            date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            max_capacity,
            current_bookings,
            price_override: None,
            status: SlotStatus::Available,
            resource: None,
        }
    }

    #[test]
    fn test_available_spots() {
        assert_eq!(slot(10, 3).available_spots(), 7);
        assert!(slot(10, 3).is_available_for(7));
        assert!(!slot(10, 3).is_available_for(8));
    }

    #[test]
    fn test_overbooked_slot_is_full() {
        let overbooked = slot(4, 6);
        assert_eq!(overbooked.available_spots(), 0);
        assert!(!overbooked.is_available_for(1));
    }
}
