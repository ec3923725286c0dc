use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use rota_availability::{
    AvailabilityPoller, AvailabilityService, AvailabilitySettings, AvailabilityThresholds,
    CalendarKey, SlotKey,
};
use rota_booking::BookingFlow;
use rota_core::{AttractionDataSource, BookingCommitter};
use rota_store::app_config::AvailabilityConfig;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use uuid::Uuid;

#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn AttractionDataSource>,
    pub committer: Arc<dyn BookingCommitter>,
    pub availability: AvailabilitySettings,
    pub sessions: Arc<SessionStore>,
}

impl AppState {
    pub fn new(
        source: Arc<dyn AttractionDataSource>,
        committer: Arc<dyn BookingCommitter>,
        availability: AvailabilitySettings,
    ) -> Self {
        Self {
            source,
            committer,
            availability,
            sessions: Arc::new(SessionStore::default()),
        }
    }
}

pub fn availability_settings(config: &AvailabilityConfig) -> AvailabilitySettings {
    AvailabilitySettings {
        polling_interval: Duration::from_millis(config.polling_interval_ms),
        window_months: config.window_months,
        thresholds: AvailabilityThresholds {
            low_max: config.date_level.low_max,
            medium_max: config.date_level.medium_max,
        },
    }
}

/// One open booking wizard
pub struct BookingSession {
    pub id: Uuid,
    pub flow: BookingFlow,
    pub availability: Arc<AvailabilityService>,
    calendar_poller: Option<AvailabilityPoller<CalendarKey>>,
    slot_poller: Option<AvailabilityPoller<SlotKey>>,
    last_active: Instant,
}

impl BookingSession {
    pub fn new(flow: BookingFlow, availability: Arc<AvailabilityService>) -> Self {
        Self {
            id: Uuid::new_v4(),
            flow,
            availability,
            calendar_poller: None,
            slot_poller: None,
            last_active: Instant::now(),
        }
    }

    pub fn touch(&mut self) {
        self.last_active = Instant::now();
    }

    pub fn idle_for(&self) -> Duration {
        self.last_active.elapsed()
    }

    /// Calendar key for the current draft over the default window
    pub fn calendar_key(&self) -> CalendarKey {
        let draft = self.flow.draft();
        self.availability
            .calendar_key(draft.selected_staff_id, draft.party_size, None)
    }

    /// Slot-list key for the current draft, if a date is chosen
    pub fn slot_key(&self) -> Option<SlotKey> {
        let draft = self.flow.draft();
        draft.selected_date.map(|date| {
            self.availability
                .slot_key(draft.selected_staff_id, date, draft.party_size)
        })
    }

    /// Points the slot poller at the current draft. The poller fetches
    /// immediately on a key change; without a date it is stopped.
    pub fn sync_slot_polling(&mut self) {
        match (self.slot_key(), &self.slot_poller) {
            (None, _) => {
                self.slot_poller = None;
            }
            (Some(key), Some(poller)) => poller.set_key(Some(key)),
            (Some(key), None) => {
                self.slot_poller = Some(self.availability.poll_slots(Some(key)));
            }
        }
    }

    /// Points the calendar poller at the current party size and staff
    /// member, starting it on first use
    pub fn sync_calendar_polling(&mut self) {
        let key = self.calendar_key();
        match &self.calendar_poller {
            Some(poller) => poller.set_key(Some(key)),
            None => {
                self.calendar_poller = Some(self.availability.poll_calendar(Some(key)));
            }
        }
    }

    pub fn is_polling(&self) -> bool {
        self.slot_poller.as_ref().is_some_and(|p| p.is_running())
    }
}

/// Open sessions; each is locked independently
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, Arc<Mutex<BookingSession>>>>,
}

impl SessionStore {
    pub async fn insert(&self, session: BookingSession) -> Arc<Mutex<BookingSession>> {
        let id = session.id;
        let handle = Arc::new(Mutex::new(session));
        self.sessions.write().await.insert(id, handle.clone());
        handle
    }

    pub async fn get(&self, id: &Uuid) -> Option<Arc<Mutex<BookingSession>>> {
        self.sessions.read().await.get(id).cloned()
    }

    pub async fn remove(&self, id: &Uuid) -> bool {
        self.sessions.write().await.remove(id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drops sessions idle for at least `ttl`. Dropping a session stops its
    /// pollers. Returns how many were removed.
    pub async fn sweep(&self, ttl: Duration) -> usize {
        let mut sessions = self.sessions.write().await;
        let mut expired = Vec::new();
        for (id, session) in sessions.iter() {
            // A session busy in a request is in use
            if let Ok(session) = session.try_lock() {
                if session.idle_for() >= ttl {
                    expired.push(*id);
                }
            }
        }
        for id in &expired {
            sessions.remove(id);
        }
        expired.len()
    }
}
