use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, NaiveTime, Utc};
use rota_core::{
    AttractionDataSource, BookingCommitter, BookingConfirmation, CommitError, CommitRequest,
    DataResult, DataSourceError, DateRange, MockPaymentGateway, PaymentGateway,
};
use rota_shared::{
    Addon, AddonPricingType, AttractionProfile, BookingSlot, Package, Requirement,
    ResourceSummary, Review, SlotStatus, StaffProfile,
};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::pg_commit::{capture, check_capacity, compensate, confirmation_code};

/// Fixed id of the attraction created by [`InMemoryStore::seed_demo`]
pub const DEMO_ATTRACTION_ID: Uuid = Uuid::from_u128(0x5f3c_2a10_8d4e_4b6a_9c1e_7a2b_3c4d_5e6f);

#[derive(Default)]
struct MemoryState {
    attractions: HashMap<Uuid, AttractionProfile>,
    slots: Vec<BookingSlot>,
    addons: Vec<Addon>,
    packages: Vec<Package>,
    resources: Vec<StaffProfile>,
    reviews: Vec<Review>,
    bookings: Vec<BookingConfirmation>,
}

/// Process-local binding of both boundaries, used when no database is
/// configured and in tests. Commits are serialized by one mutex.
pub struct InMemoryStore {
    state: Mutex<MemoryState>,
    payments: Arc<dyn PaymentGateway>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::with_payments(Arc::new(MockPaymentGateway))
    }

    pub fn with_payments(payments: Arc<dyn PaymentGateway>) -> Self {
        Self {
            state: Mutex::new(MemoryState::default()),
            payments,
        }
    }

    pub async fn insert_attraction(&self, attraction: AttractionProfile) {
        self.state.lock().await.attractions.insert(attraction.id, attraction);
    }

    pub async fn insert_slot(&self, slot: BookingSlot) {
        self.state.lock().await.slots.push(slot);
    }

    pub async fn insert_addon(&self, addon: Addon) {
        self.state.lock().await.addons.push(addon);
    }

    pub async fn insert_package(&self, package: Package) {
        self.state.lock().await.packages.push(package);
    }

    pub async fn insert_resource(&self, resource: StaffProfile) {
        self.state.lock().await.resources.push(resource);
    }

    pub async fn insert_review(&self, review: Review) {
        self.state.lock().await.reviews.push(review);
    }

    pub async fn slot(&self, slot_id: Uuid) -> Option<BookingSlot> {
        self.state
            .lock()
            .await
            .slots
            .iter()
            .find(|s| s.id == slot_id)
            .cloned()
    }

    pub async fn bookings(&self) -> Vec<BookingConfirmation> {
        self.state.lock().await.bookings.clone()
    }

    /// Seeds a guided kayak tour with two guides and two weeks of slots
    /// starting at `today`. Returns the attraction id.
    pub async fn seed_demo(&self, today: NaiveDate) -> Uuid {
        let attraction_id = DEMO_ATTRACTION_ID;
        let mut state = self.state.lock().await;

        state.attractions.insert(
            attraction_id,
            AttractionProfile {
                id: attraction_id,
                name: "Harbour Kayak Tour".to_string(),
                base_price: 6500,
                currency: "NZD".to_string(),
                timezone: "Pacific/Auckland".to_string(),
                requires_staff: true,
                requirements: vec![Requirement {
                    id: Uuid::from_u128(0x1001),
                    title: "Able to swim 50 metres".to_string(),
                    description: None,
                    is_mandatory: true,
                }],
            },
        );

        let guides = [("Mere", 0, 4.9), ("Tama", 1, 4.6)];
        for (i, (name, order, _)) in guides.iter().enumerate() {
            state.resources.push(StaffProfile {
                id: Uuid::from_u128(0x2000 + i as u128),
                attraction_id,
                name: name.to_string(),
                bio: Some(format!("{name} has guided harbour trips for years.")),
                photo_url: None,
                specialties: vec!["sea kayaking".to_string()],
                capacity: 8,
                display_order: *order,
                is_active: true,
                show_on_widget: true,
                rating_average: None,
                booking_count: None,
            });
        }

        let hot_chocolate = Uuid::from_u128(0x3001);
        state.addons.push(Addon {
            id: hot_chocolate,
            attraction_id,
            name: "Hot chocolate".to_string(),
            description: None,
            price: 450,
            pricing_type: AddonPricingType::PerPerson,
            is_required: false,
            is_active: true,
            max_quantity: Some(3),
            min_quantity: 0,
            category: Some("food".to_string()),
            display_order: 1,
            availability_rules: None,
        });
        state.addons.push(Addon {
            id: Uuid::from_u128(0x3002),
            attraction_id,
            name: "Waterproof camera hire".to_string(),
            description: None,
            price: 1500,
            pricing_type: AddonPricingType::PerBooking,
            is_required: false,
            is_active: true,
            max_quantity: Some(2),
            min_quantity: 0,
            category: Some("equipment".to_string()),
            display_order: 0,
            availability_rules: None,
        });
        state.packages.push(Package {
            id: Uuid::from_u128(0x4001),
            attraction_id,
            name: "Sunset bundle".to_string(),
            description: Some("Tour for two with hot drinks".to_string()),
            price: 13500,
            original_price: None,
            discount_label: Some("Save with the bundle".to_string()),
            included_addon_ids: vec![hot_chocolate],
            party_size_min: Some(2),
            party_size_max: Some(4),
            is_featured: true,
            is_active: true,
            display_order: 0,
            validity_rules: None,
        });

        let starts = [(9, 0), (11, 30), (14, 0), (17, 30)];
        for day in 0..14 {
            let date = today + Duration::days(day);
            for (i, (hour, minute)) in starts.iter().enumerate() {
                let guide = Uuid::from_u128(0x2000 + (i % guides.len()) as u128);
                let start = NaiveTime::from_hms_opt(*hour, *minute, 0).unwrap_or_default();
                state.slots.push(BookingSlot {
                    id: Uuid::new_v4(),
                    attraction_id,
                    resource_id: Some(guide),
                    date,
                    start_time: start,
                    end_time: start + Duration::hours(2),
                    max_capacity: 8,
                    current_bookings: ((day as i32) + (i as i32) * 3) % 9,
                    price_override: (*hour >= 17).then_some(7500),
                    status: SlotStatus::Available,
                    resource: None,
                });
            }
        }

        for (i, (_, _, rating)) in guides.iter().enumerate() {
            state.reviews.push(Review {
                id: Uuid::new_v4(),
                attraction_id,
                booking_id: None,
                resource_id: Some(Uuid::from_u128(0x2000 + i as u128)),
                customer_name: "Sam".to_string(),
                rating: if *rating > 4.7 { 5 } else { 4 },
                title: Some("Great morning out".to_string()),
                review_text: None,
                is_verified: true,
                is_featured: i == 0,
                is_published: true,
                created_at: Utc::now() - Duration::days(3 + i as i64),
            });
        }

        tracing::info!(%attraction_id, slots = state.slots.len(), "Seeded demo attraction");
        attraction_id
    }
}

#[async_trait]
impl AttractionDataSource for InMemoryStore {
    async fn load_attraction(&self, attraction_id: Uuid) -> DataResult<AttractionProfile> {
        self.state
            .lock()
            .await
            .attractions
            .get(&attraction_id)
            .cloned()
            .ok_or_else(|| DataSourceError::NotFound(format!("attraction {attraction_id}")))
    }

    async fn list_slots(
        &self,
        attraction_id: Uuid,
        resource_id: Option<Uuid>,
        range: &DateRange,
    ) -> DataResult<Vec<BookingSlot>> {
        let state = self.state.lock().await;
        let mut slots: Vec<BookingSlot> = state
            .slots
            .iter()
            .filter(|s| s.attraction_id == attraction_id && range.contains(s.date))
            .filter(|s| resource_id.is_none() || s.resource_id == resource_id)
            .cloned()
            .map(|mut slot| {
                if slot.resource.is_none() {
                    slot.resource = slot.resource_id.and_then(|id| {
                        state.resources.iter().find(|r| r.id == id).map(|r| ResourceSummary {
                            id: r.id,
                            name: r.name.clone(),
                            photo_url: r.photo_url.clone(),
                            specialties: r.specialties.clone(),
                        })
                    });
                }
                slot
            })
            .collect();
        slots.sort_by_key(|s| (s.date, s.start_time));
        Ok(slots)
    }

    async fn list_addons(&self, attraction_id: Uuid) -> DataResult<Vec<Addon>> {
        let state = self.state.lock().await;
        Ok(state
            .addons
            .iter()
            .filter(|a| a.attraction_id == attraction_id)
            .cloned()
            .collect())
    }

    async fn list_packages(&self, attraction_id: Uuid) -> DataResult<Vec<Package>> {
        let state = self.state.lock().await;
        Ok(state
            .packages
            .iter()
            .filter(|p| p.attraction_id == attraction_id)
            .cloned()
            .collect())
    }

    async fn list_resources(&self, attraction_id: Uuid) -> DataResult<Vec<StaffProfile>> {
        let state = self.state.lock().await;
        Ok(state
            .resources
            .iter()
            .filter(|r| r.attraction_id == attraction_id)
            .cloned()
            .collect())
    }

    async fn list_reviews(&self, attraction_id: Uuid, limit: usize) -> DataResult<Vec<Review>> {
        let state = self.state.lock().await;
        let mut reviews: Vec<Review> = state
            .reviews
            .iter()
            .filter(|r| r.attraction_id == attraction_id && r.is_published)
            .cloned()
            .collect();
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        reviews.truncate(limit);
        Ok(reviews)
    }
}

#[async_trait]
impl BookingCommitter for InMemoryStore {
    async fn commit(&self, request: &CommitRequest) -> Result<BookingConfirmation, CommitError> {
        let mut state = self.state.lock().await;

        let slot = state
            .slots
            .iter()
            .find(|s| s.id == request.slot_id && s.attraction_id == request.attraction_id)
            .ok_or(CommitError::SlotUnavailable(request.slot_id))?;
        check_capacity(request, slot.status, slot.max_capacity, slot.current_bookings)?;

        let party_size = i32::try_from(request.party_size)
            .map_err(|_| CommitError::Backend("party size out of range".to_string()))?;

        let booking_id = Uuid::new_v4();
        let intent = capture(self.payments.as_ref(), booking_id, request).await?;
        match state.slots.iter_mut().find(|s| s.id == request.slot_id) {
            Some(slot) => slot.current_bookings += party_size,
            None => {
                compensate(self.payments.as_ref(), &intent).await;
                return Err(CommitError::SlotUnavailable(request.slot_id));
            }
        }

        let confirmation = BookingConfirmation {
            booking_id,
            confirmation_code: confirmation_code(booking_id),
            slot_id: request.slot_id,
            party_size: request.party_size,
            total: request.total,
            currency: request.currency.clone(),
            created_at: Utc::now(),
        };
        state.bookings.push(confirmation.clone());
        tracing::info!(%booking_id, slot_id = %request.slot_id, "Booking committed in memory");
        Ok(confirmation)
    }
}
