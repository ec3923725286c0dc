use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use indexmap::{IndexMap, IndexSet};
use rota_shared::CustomerInfo;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A finalized draft plus the total the engine computed for it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitRequest {
    pub attraction_id: Uuid,
    pub slot_id: Uuid,
    pub date: NaiveDate,
    pub staff_id: Option<Uuid>,
    pub party_size: u32,
    pub addons: IndexMap<Uuid, u32>,
    pub package_id: Option<Uuid>,
    pub customer: CustomerInfo,
    pub custom_fields: IndexMap<String, serde_json::Value>,
    pub acknowledged_requirements: IndexSet<Uuid>,
    /// Minor currency units
    pub total: i64,
    pub currency: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingConfirmation {
    pub booking_id: Uuid,
    pub confirmation_code: String,
    pub slot_id: Uuid,
    pub party_size: u32,
    pub total: i64,
    pub currency: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum CommitError {
    #[error("Slot is full: requested {requested}, available {available}")]
    CapacityExceeded { requested: u32, available: i32 },

    #[error("Slot no longer bookable: {0}")]
    SlotUnavailable(Uuid),

    #[error("Payment declined: {0}")]
    PaymentDeclined(String),

    #[error("Booking backend failure: {0}")]
    Backend(String),
}

impl CommitError {
    /// The customer can recover by picking another slot
    pub fn is_capacity_race(&self) -> bool {
        matches!(
            self,
            CommitError::CapacityExceeded { .. } | CommitError::SlotUnavailable(_)
        )
    }
}

/// Transactional reservation service.
///
/// Implementations must re-check `available_spots >= party_size` atomically
/// with the reservation; what the engine last observed is only advisory.
#[async_trait]
pub trait BookingCommitter: Send + Sync {
    async fn commit(&self, request: &CommitRequest) -> Result<BookingConfirmation, CommitError>;
}
