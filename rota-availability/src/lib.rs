pub mod cache;
pub mod calendar;
pub mod poller;
pub mod service;
pub mod slots;
pub mod staff;
pub mod urgency;

#[cfg(test)]
pub(crate) mod testing;

pub use cache::{FetchTicket, QueryCache, QuerySnapshot};
pub use calendar::{aggregate_calendar, Calendar, DateAvailability};
pub use poller::AvailabilityPoller;
pub use service::{
    AvailabilityError, AvailabilityService, AvailabilitySettings, CalendarKey, SlotKey, StaffKey,
};
pub use slots::{build_slot_list, EnhancedSlot, SlotList, TimeOfDay, TimeSlotGroup};
pub use staff::StaffDirectory;
pub use urgency::{urgency_level, AvailabilityLevel, AvailabilityThresholds, UrgencyLevel};
