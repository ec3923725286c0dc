use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use rota_catalog::ratings_by_resource;
use rota_core::{AttractionDataSource, DataSourceError, DateRange};
use rota_shared::AttractionProfile;
use uuid::Uuid;

use crate::cache::{FetchTicket, QueryCache};
use crate::calendar::{aggregate_calendar, Calendar};
use crate::poller::AvailabilityPoller;
use crate::slots::{build_slot_list, SlotList};
use crate::staff::StaffDirectory;
use crate::urgency::AvailabilityThresholds;

/// Reviews sampled when deriving staff ratings
const STAFF_RATING_SAMPLE: usize = 500;

#[derive(Debug, thiserror::Error)]
pub enum AvailabilityError {
    #[error("Availability fetch failed: {0}")]
    Source(#[from] DataSourceError),

    #[error("Result superseded by a newer query")]
    Superseded,
}

#[derive(Debug, Clone)]
pub struct AvailabilitySettings {
    pub polling_interval: Duration,
    /// Length of the default calendar window
    pub window_months: u32,
    pub thresholds: AvailabilityThresholds,
}

impl Default for AvailabilitySettings {
    fn default() -> Self {
        Self {
            polling_interval: Duration::from_secs(30),
            window_months: 3,
            thresholds: AvailabilityThresholds::default(),
        }
    }
}

impl AvailabilitySettings {
    pub fn stale_after(&self) -> Duration {
        self.polling_interval / 2
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CalendarKey {
    pub attraction_id: Uuid,
    pub resource_id: Option<Uuid>,
    pub range: DateRange,
    pub party_size: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SlotKey {
    pub attraction_id: Uuid,
    pub resource_id: Option<Uuid>,
    pub date: NaiveDate,
    pub party_size: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StaffKey {
    pub attraction_id: Uuid,
    pub date: Option<NaiveDate>,
}

/// Owns the calendar, slot-list and staff read models of one attraction
pub struct AvailabilityService {
    source: Arc<dyn AttractionDataSource>,
    attraction_id: Uuid,
    base_price: i64,
    settings: AvailabilitySettings,
    calendar: QueryCache<CalendarKey, Calendar>,
    slots: QueryCache<SlotKey, SlotList>,
    staff: QueryCache<StaffKey, StaffDirectory>,
}

impl AvailabilityService {
    pub fn new(
        source: Arc<dyn AttractionDataSource>,
        attraction: &AttractionProfile,
        settings: AvailabilitySettings,
    ) -> Self {
        let stale_after = settings.stale_after();
        Self {
            source,
            attraction_id: attraction.id,
            base_price: attraction.base_price,
            settings,
            calendar: QueryCache::new(stale_after),
            slots: QueryCache::new(stale_after),
            staff: QueryCache::new(stale_after),
        }
    }

    pub fn settings(&self) -> &AvailabilitySettings {
        &self.settings
    }

    /// Key for the calendar; `range` defaults to today plus the configured window
    pub fn calendar_key(
        &self,
        resource_id: Option<Uuid>,
        party_size: u32,
        range: Option<DateRange>,
    ) -> CalendarKey {
        CalendarKey {
            attraction_id: self.attraction_id,
            resource_id,
            range: range.unwrap_or_else(|| DateRange::upcoming(self.settings.window_months)),
            party_size: party_size.max(1),
        }
    }

    pub fn slot_key(&self, resource_id: Option<Uuid>, date: NaiveDate, party_size: u32) -> SlotKey {
        SlotKey {
            attraction_id: self.attraction_id,
            resource_id,
            date,
            party_size: party_size.max(1),
        }
    }

    pub fn staff_key(&self, date: Option<NaiveDate>) -> StaffKey {
        StaffKey {
            attraction_id: self.attraction_id,
            date,
        }
    }

    pub async fn refresh_calendar(&self, key: CalendarKey) -> Result<Arc<Calendar>, AvailabilityError> {
        let ticket = self.calendar.begin(key.clone()).await;
        let fetched = self
            .source
            .list_slots(key.attraction_id, key.resource_id, &key.range)
            .await
            .map(|rows| {
                aggregate_calendar(
                    &rows,
                    &key.range,
                    key.resource_id,
                    key.party_size,
                    &self.settings.thresholds,
                )
            });
        self.settle(&self.calendar, ticket, fetched, "calendar").await
    }

    pub async fn refresh_slots(&self, key: SlotKey) -> Result<Arc<SlotList>, AvailabilityError> {
        let ticket = self.slots.begin(key.clone()).await;
        let fetched = self
            .source
            .list_slots(key.attraction_id, key.resource_id, &DateRange::single(key.date))
            .await
            .map(|rows| {
                build_slot_list(rows, key.date, key.resource_id, key.party_size, self.base_price)
            });
        self.settle(&self.slots, ticket, fetched, "slots").await
    }

    pub async fn refresh_staff(&self, key: StaffKey) -> Result<Arc<StaffDirectory>, AvailabilityError> {
        let ticket = self.staff.begin(key.clone()).await;
        let fetched = self.fetch_staff(&key).await;
        self.settle(&self.staff, ticket, fetched, "staff").await
    }

    async fn fetch_staff(&self, key: &StaffKey) -> Result<StaffDirectory, DataSourceError> {
        let roster = self.source.list_resources(key.attraction_id).await?;
        // Ratings are optional; the roster stands without them
        let ratings = match self
            .source
            .list_reviews(key.attraction_id, STAFF_RATING_SAMPLE)
            .await
        {
            Ok(reviews) => ratings_by_resource(&reviews),
            Err(e) => {
                tracing::warn!(attraction_id = %self.attraction_id, error = %e, "Staff ratings unavailable");
                Default::default()
            }
        };
        let open_slots = match key.date {
            Some(date) => {
                self.source
                    .list_slots(key.attraction_id, None, &DateRange::single(date))
                    .await?
            }
            None => Vec::new(),
        };
        Ok(StaffDirectory::build(
            roster,
            &ratings,
            key.date,
            &open_slots,
        ))
    }

    async fn settle<K, T>(
        &self,
        cache: &QueryCache<K, T>,
        ticket: FetchTicket<K>,
        fetched: Result<T, DataSourceError>,
        query: &'static str,
    ) -> Result<Arc<T>, AvailabilityError>
    where
        K: Clone + PartialEq + std::fmt::Debug,
    {
        let key = ticket.key().clone();
        match fetched {
            Ok(data) => {
                if !cache.complete(ticket, Ok(data)).await {
                    return Err(AvailabilityError::Superseded);
                }
                tracing::debug!(attraction_id = %self.attraction_id, query, "Availability refreshed");
                cache.data_for(&key).await.ok_or(AvailabilityError::Superseded)
            }
            Err(e) => {
                tracing::error!(attraction_id = %self.attraction_id, query, error = %e, "Availability fetch failed");
                cache.complete(ticket, Err(e.to_string())).await;
                Err(e.into())
            }
        }
    }

    /// Date change: switches the slot list to the new key and fetches now,
    /// independent of any poll timer
    pub async fn select_date(&self, key: SlotKey) -> Result<Arc<SlotList>, AvailabilityError> {
        tracing::info!(attraction_id = %self.attraction_id, date = %key.date, party_size = key.party_size, "Date selected");
        self.refresh_slots(key).await
    }

    /// Drops what the engine believes about a slot list and re-reads it; used
    /// after the commit boundary reported the slot as taken
    pub async fn force_refresh_slots(&self, key: SlotKey) -> Result<Arc<SlotList>, AvailabilityError> {
        self.slots.invalidate().await;
        self.calendar.invalidate().await;
        self.refresh_slots(key).await
    }

    pub fn calendar_cache(&self) -> &QueryCache<CalendarKey, Calendar> {
        &self.calendar
    }

    pub fn slots_cache(&self) -> &QueryCache<SlotKey, SlotList> {
        &self.slots
    }

    pub fn staff_cache(&self) -> &QueryCache<StaffKey, StaffDirectory> {
        &self.staff
    }

    /// Refreshes the calendar on the polling interval until the poller is dropped
    pub fn poll_calendar(self: &Arc<Self>, key: Option<CalendarKey>) -> AvailabilityPoller<CalendarKey> {
        let service = Arc::clone(self);
        AvailabilityPoller::spawn(self.settings.polling_interval, key, move |key| {
            let service = Arc::clone(&service);
            async move {
                // Failures are recorded on the cache
                let _ = service.refresh_calendar(key).await;
            }
        })
    }

    /// Refreshes the slot list on the polling interval until the poller is dropped
    pub fn poll_slots(self: &Arc<Self>, key: Option<SlotKey>) -> AvailabilityPoller<SlotKey> {
        let service = Arc::clone(self);
        AvailabilityPoller::spawn(self.settings.polling_interval, key, move |key| {
            let service = Arc::clone(&service);
            async move {
                let _ = service.refresh_slots(key).await;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{profile, slot, staff, FakeSource};
    use std::sync::atomic::Ordering;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, day).unwrap()
    }

    fn service(source: Arc<FakeSource>) -> Arc<AvailabilityService> {
        Arc::new(AvailabilityService::new(
            source,
            &profile(),
            AvailabilitySettings::default(),
        ))
    }

    #[tokio::test]
    async fn test_refresh_slots_filters_capacity() {
        let source = Arc::new(FakeSource::with_slots(vec![
            slot(d(1), 9, 10, 9),
            slot(d(1), 10, 10, 0),
        ]));
        let svc = service(source);

        let list = svc.refresh_slots(svc.slot_key(None, d(1), 2)).await.unwrap();
        assert_eq!(list.slots.len(), 1);
        assert!(list.slots.iter().all(|s| s.spots_left >= 2));
        assert_eq!(list.slots[0].price, 5000);
    }

    #[tokio::test]
    async fn test_refresh_calendar_window() {
        let source = Arc::new(FakeSource::with_slots(vec![slot(d(2), 9, 10, 0)]));
        let svc = service(source);
        let key = svc.calendar_key(None, 1, Some(DateRange::new(d(1), d(3))));

        let calendar = svc.refresh_calendar(key).await.unwrap();
        assert_eq!(calendar.len(), 3);
        assert_eq!(calendar[&d(2)].slots_available, 1);
    }

    #[tokio::test]
    async fn test_fetch_error_is_recorded_per_query() {
        let source = Arc::new(FakeSource::with_slots(vec![]));
        source.fail_slots.store(true, Ordering::SeqCst);
        let svc = service(source);

        let result = svc.refresh_slots(svc.slot_key(None, d(1), 1)).await;
        assert!(matches!(result, Err(AvailabilityError::Source(_))));

        let snapshot = svc.slots_cache().snapshot().await;
        assert!(snapshot.error.is_some());
        // Other queries are unaffected
        assert!(svc.staff_cache().snapshot().await.error.is_none());
    }

    #[tokio::test]
    async fn test_date_change_supersedes_previous_date() {
        let source = Arc::new(FakeSource::with_slots(vec![
            slot(d(1), 9, 10, 0),
            slot(d(2), 9, 10, 0),
        ]));
        let svc = service(source);

        let stale = svc.slots_cache().begin(svc.slot_key(None, d(1), 1)).await;
        let fresh = svc.select_date(svc.slot_key(None, d(2), 1)).await.unwrap();
        assert_eq!(fresh.date, d(2));

        let late = crate::slots::build_slot_list(vec![], d(1), None, 1, 5000);
        assert!(!svc.slots_cache().complete(stale, Ok(late)).await);
        let snapshot = svc.slots_cache().snapshot().await;
        assert_eq!(snapshot.data.unwrap().date, d(2));
    }

    #[tokio::test]
    async fn test_staff_directory_for_date() {
        let guide = staff("Mere", 0);
        let mut guided = slot(d(1), 9, 4, 0);
        guided.resource_id = Some(guide.id);
        let source = Arc::new(FakeSource {
            staff: vec![guide.clone(), staff("Tom", 1)],
            ..FakeSource::with_slots(vec![guided])
        });
        let svc = service(source);

        let directory = svc.refresh_staff(svc.staff_key(Some(d(1)))).await.unwrap();
        assert_eq!(directory.available_staff().len(), 1);
        assert_eq!(directory.available_staff()[0].id, guide.id);

        let everyone = svc.refresh_staff(svc.staff_key(None)).await.unwrap();
        assert_eq!(everyone.available_staff().len(), 2);
    }

    #[tokio::test]
    async fn test_staff_roster_survives_reviews_outage() {
        let guide = staff("Mere", 0);
        let source = Arc::new(FakeSource {
            staff: vec![guide.clone()],
            ..FakeSource::with_slots(vec![])
        });
        source.fail_reviews.store(true, Ordering::SeqCst);
        let svc = service(source);

        let directory = svc.refresh_staff(svc.staff_key(None)).await.unwrap();
        assert_eq!(directory.staff().len(), 1);
        assert_eq!(directory.staff()[0].id, guide.id);
        assert_eq!(directory.staff()[0].rating_average, None);
        assert!(svc.staff_cache().snapshot().await.error.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_calendar_poller_refetches_and_follows_party_size() {
        let source = Arc::new(FakeSource::with_slots(vec![
            slot(d(1), 9, 10, 7),
            slot(d(2), 9, 10, 0),
        ]));
        let svc = service(source.clone());
        let range = Some(DateRange::new(d(1), d(3)));

        let poller = svc.poll_calendar(Some(svc.calendar_key(None, 2, range)));
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(source.fetches(), 1);
        let calendar = svc.calendar_cache().snapshot().await.data.unwrap();
        assert_eq!(calendar[&d(1)].slots_available, 1);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(source.fetches() >= 2);

        poller.set_key(Some(svc.calendar_key(None, 4, range)));
        tokio::time::sleep(Duration::from_millis(10)).await;
        let snapshot = svc.calendar_cache().snapshot().await;
        assert_eq!(snapshot.key.map(|k| k.party_size), Some(4));
        let calendar = snapshot.data.unwrap();
        assert_eq!(calendar[&d(1)].slots_available, 0);
        assert_eq!(calendar[&d(2)].slots_available, 1);

        poller.shutdown().await;
        let after = source.fetches();
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(source.fetches(), after);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slot_poller_refetches_and_follows_key() {
        let source = Arc::new(FakeSource::with_slots(vec![slot(d(1), 9, 10, 0)]));
        let svc = service(source.clone());

        let poller = svc.poll_slots(Some(svc.slot_key(None, d(1), 1)));
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(source.fetches(), 1);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(source.fetches() >= 2);

        poller.set_key(Some(svc.slot_key(None, d(2), 1)));
        tokio::time::sleep(Duration::from_millis(10)).await;
        let snapshot = svc.slots_cache().snapshot().await;
        assert_eq!(snapshot.key.map(|k| k.date), Some(d(2)));

        poller.shutdown().await;
        let after = source.fetches();
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(source.fetches(), after);
    }
}
