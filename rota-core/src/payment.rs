use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    RequiresPaymentMethod,
    RequiresAction,
    Processing,
    Succeeded,
    Canceled,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntent {
    /// Provider reference, stored on the booking row
    pub id: String,
    pub booking_id: Uuid,
    pub amount: i64,
    pub currency: String,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum PaymentError {
    #[error("Payment declined: {0}")]
    Declined(String),

    #[error("Payment provider unavailable: {0}")]
    Provider(String),
}

impl PaymentIntent {
    pub fn is_captured(&self) -> bool {
        self.status == PaymentStatus::Succeeded
    }
}

/// Turns a computed total into a charge
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn charge(
        &self,
        booking_id: Uuid,
        amount: i64,
        currency: &str,
    ) -> Result<PaymentIntent, PaymentError>;

    /// Voids or refunds a charge whose booking could not be recorded
    async fn refund(&self, intent: &PaymentIntent) -> Result<(), PaymentError>;
}

/// Approves every charge; used when no provider is configured
#[derive(Debug, Default)]
pub struct MockPaymentGateway;

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn charge(
        &self,
        booking_id: Uuid,
        amount: i64,
        currency: &str,
    ) -> Result<PaymentIntent, PaymentError> {
        if amount < 0 {
            return Err(PaymentError::Declined(format!("negative amount {amount}")));
        }
        Ok(PaymentIntent {
            id: format!("mock_pi_{}", booking_id.simple()),
            booking_id,
            amount,
            currency: currency.to_string(),
            status: PaymentStatus::Succeeded,
            created_at: Utc::now(),
        })
    }

    async fn refund(&self, intent: &PaymentIntent) -> Result<(), PaymentError> {
        if !intent.id.starts_with("mock_pi_") {
            return Err(PaymentError::Provider(format!("unknown intent {}", intent.id)));
        }
        Ok(())
    }
}
