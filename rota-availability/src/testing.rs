//! Fixtures shared by the unit tests of this crate.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use rota_core::{AttractionDataSource, DataResult, DataSourceError, DateRange};
use rota_shared::{
    Addon, AttractionProfile, BookingSlot, Package, Review, SlotStatus, StaffProfile,
};
use uuid::Uuid;

pub fn slot(date: NaiveDate, hour: u32, max_capacity: i32, current_bookings: i32) -> BookingSlot {
    BookingSlot {
        id: Uuid::new_v4(),
        attraction_id: Uuid::nil(),
        resource_id: None,
        date,
        start_time: NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
        end_time: NaiveTime::from_hms_opt(hour + 1, 0, 0).unwrap(),
        max_capacity,
        current_bookings,
        price_override: None,
        status: SlotStatus::Available,
        resource: None,
    }
}

pub fn staff(name: &str, display_order: i32) -> StaffProfile {
    StaffProfile {
        id: Uuid::new_v4(),
        attraction_id: Uuid::nil(),
        name: name.to_string(),
        bio: None,
        photo_url: None,
        specialties: vec![],
        capacity: 1,
        display_order,
        is_active: true,
        show_on_widget: true,
        rating_average: None,
        booking_count: None,
    }
}

pub fn profile() -> AttractionProfile {
    AttractionProfile {
        id: Uuid::nil(),
        name: "Glowworm caves".to_string(),
        base_price: 5000,
        currency: "NZD".to_string(),
        timezone: "Pacific/Auckland".to_string(),
        requires_staff: false,
        requirements: vec![],
    }
}

/// In-process data source that counts slot fetches
#[derive(Default)]
pub struct FakeSource {
    pub slots: Mutex<Vec<BookingSlot>>,
    pub staff: Vec<StaffProfile>,
    pub reviews: Vec<Review>,
    pub slot_fetches: AtomicUsize,
    pub fail_slots: std::sync::atomic::AtomicBool,
    pub fail_reviews: std::sync::atomic::AtomicBool,
}

impl FakeSource {
    pub fn with_slots(slots: Vec<BookingSlot>) -> Self {
        Self {
            slots: Mutex::new(slots),
            ..Default::default()
        }
    }

    pub fn fetches(&self) -> usize {
        self.slot_fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AttractionDataSource for FakeSource {
    async fn load_attraction(&self, _attraction_id: Uuid) -> DataResult<AttractionProfile> {
        Ok(profile())
    }

    async fn list_slots(
        &self,
        _attraction_id: Uuid,
        resource_id: Option<Uuid>,
        range: &DateRange,
    ) -> DataResult<Vec<BookingSlot>> {
        self.slot_fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail_slots.load(Ordering::SeqCst) {
            return Err(DataSourceError::Backend("connection reset".to_string()));
        }
        let slots = self.slots.lock().unwrap();
        Ok(slots
            .iter()
            .filter(|s| range.contains(s.date))
            .filter(|s| resource_id.is_none() || s.resource_id == resource_id)
            .cloned()
            .collect())
    }

    async fn list_addons(&self, _attraction_id: Uuid) -> DataResult<Vec<Addon>> {
        Ok(vec![])
    }

    async fn list_packages(&self, _attraction_id: Uuid) -> DataResult<Vec<Package>> {
        Ok(vec![])
    }

    async fn list_resources(&self, _attraction_id: Uuid) -> DataResult<Vec<StaffProfile>> {
        Ok(self.staff.clone())
    }

    async fn list_reviews(&self, _attraction_id: Uuid, limit: usize) -> DataResult<Vec<Review>> {
        if self.fail_reviews.load(Ordering::SeqCst) {
            return Err(DataSourceError::Backend("reviews service down".to_string()));
        }
        Ok(self.reviews.iter().take(limit).cloned().collect())
    }
}
