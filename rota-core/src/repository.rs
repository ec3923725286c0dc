use async_trait::async_trait;
use rota_shared::{
    Addon, AttractionProfile, BookingSlot, Package, RatingSummaryRow, Review, StaffProfile,
};
use uuid::Uuid;

use crate::range::DateRange;

#[derive(Debug, Clone, thiserror::Error)]
pub enum DataSourceError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Data backend failure: {0}")]
    Backend(String),

    #[error("Malformed row: {0}")]
    Decode(String),
}

pub type DataResult<T> = Result<T, DataSourceError>;

/// Read side of the managed backend the engine is embedded in.
///
/// Every call is an independent fetch; implementations must not cache on the
/// engine's behalf, the engine owns its own read-model caches.
#[async_trait]
pub trait AttractionDataSource: Send + Sync {
    async fn load_attraction(&self, attraction_id: Uuid) -> DataResult<AttractionProfile>;

    /// Slots with `range.start <= date <= range.end`, optionally for one resource
    async fn list_slots(
        &self,
        attraction_id: Uuid,
        resource_id: Option<Uuid>,
        range: &DateRange,
    ) -> DataResult<Vec<BookingSlot>>;

    async fn list_addons(&self, attraction_id: Uuid) -> DataResult<Vec<Addon>>;

    async fn list_packages(&self, attraction_id: Uuid) -> DataResult<Vec<Package>>;

    async fn list_resources(&self, attraction_id: Uuid) -> DataResult<Vec<StaffProfile>>;

    /// Published reviews, newest first
    async fn list_reviews(&self, attraction_id: Uuid, limit: usize) -> DataResult<Vec<Review>>;

    async fn rating_summary(&self, _attraction_id: Uuid) -> DataResult<Option<RatingSummaryRow>> {
        Ok(None)
    }
}
