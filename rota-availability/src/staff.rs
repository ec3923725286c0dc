use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use rota_catalog::ResourceRating;
use rota_shared::{BookingSlot, StaffProfile};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Widget-visible roster plus who is free on the selected date
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StaffDirectory {
    pub date: Option<NaiveDate>,
    staff: Vec<StaffProfile>,
    /// `None` while no date is selected
    available_ids: Option<HashSet<Uuid>>,
}

impl StaffDirectory {
    /// Keeps active, widget-visible resources in display order and merges
    /// their review ratings. With a date, `open_slots` decides availability:
    /// a resource is available if any open slot with spare capacity on that
    /// date belongs to it.
    pub fn build(
        roster: Vec<StaffProfile>,
        ratings: &HashMap<Uuid, ResourceRating>,
        date: Option<NaiveDate>,
        open_slots: &[BookingSlot],
    ) -> Self {
        let mut staff: Vec<StaffProfile> = roster
            .into_iter()
            .filter(|s| s.is_active && s.show_on_widget)
            .map(|mut s| {
                if let Some(rating) = ratings.get(&s.id) {
                    s.rating_average = Some(rating.average);
                    s.booking_count = Some(rating.count);
                }
                s
            })
            .collect();
        staff.sort_by_key(|s| s.display_order);

        let available_ids = date.map(|date| {
            open_slots
                .iter()
                .filter(|slot| slot.date == date && slot.is_open() && slot.available_spots() > 0)
                .filter_map(|slot| slot.resource_id)
                .collect()
        });

        Self {
            date,
            staff,
            available_ids,
        }
    }

    pub fn staff(&self) -> &[StaffProfile] {
        &self.staff
    }

    pub fn staff_by_id(&self, id: &Uuid) -> Option<&StaffProfile> {
        self.staff.iter().find(|s| &s.id == id)
    }

    /// Everyone when no date is selected
    pub fn available_staff(&self) -> Vec<&StaffProfile> {
        match &self.available_ids {
            None => self.staff.iter().collect(),
            Some(ids) => self.staff.iter().filter(|s| ids.contains(&s.id)).collect(),
        }
    }

    pub fn is_available(&self, id: &Uuid) -> bool {
        self.available_staff().iter().any(|s| &s.id == id)
    }
}
