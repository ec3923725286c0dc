use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rota_core::{
    BookingCommitter, BookingConfirmation, CommitError, CommitRequest, PaymentError,
    PaymentGateway, PaymentIntent,
};
use rota_shared::{Masked, SlotStatus};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::pg_source::parse_slot_status;

/// Short human-readable code derived from the booking id
pub fn confirmation_code(booking_id: Uuid) -> String {
    let hex = booking_id.simple().to_string().to_uppercase();
    format!("RT-{}", &hex[..8])
}

/// Checks a locked slot against a request
pub(crate) fn check_capacity(
    request: &CommitRequest,
    status: SlotStatus,
    max_capacity: i32,
    current_bookings: i32,
) -> Result<(), CommitError> {
    if status != SlotStatus::Available {
        return Err(CommitError::SlotUnavailable(request.slot_id));
    }
    let available = (max_capacity - current_bookings).max(0);
    if i64::from(available) < i64::from(request.party_size) {
        return Err(CommitError::CapacityExceeded {
            requested: request.party_size,
            available,
        });
    }
    Ok(())
}

fn payment_err(e: PaymentError) -> CommitError {
    match e {
        PaymentError::Declined(reason) => CommitError::PaymentDeclined(reason),
        PaymentError::Provider(msg) => CommitError::Backend(msg),
    }
}

/// Charges the request total. An intent that did not settle is voided and
/// reported as declined.
pub(crate) async fn capture(
    payments: &dyn PaymentGateway,
    booking_id: Uuid,
    request: &CommitRequest,
) -> Result<PaymentIntent, CommitError> {
    let intent = payments
        .charge(booking_id, request.total, &request.currency)
        .await
        .map_err(payment_err)?;
    if !intent.is_captured() {
        let reason = format!("payment {} not captured ({:?})", intent.id, intent.status);
        compensate(payments, &intent).await;
        return Err(CommitError::PaymentDeclined(reason));
    }
    Ok(intent)
}

/// Gives back a charge whose booking was not recorded
pub(crate) async fn compensate(payments: &dyn PaymentGateway, intent: &PaymentIntent) {
    match payments.refund(intent).await {
        Ok(()) => tracing::warn!(
            booking_id = %intent.booking_id,
            payment_reference = %intent.id,
            "Charge refunded, booking not recorded"
        ),
        Err(e) => tracing::error!(
            booking_id = %intent.booking_id,
            payment_reference = %intent.id,
            error = %e,
            "Refund failed, charge needs manual reconciliation"
        ),
    }
}

fn db_err(e: sqlx::Error) -> CommitError {
    tracing::error!(error = %e, "Booking transaction failed");
    CommitError::Backend(e.to_string())
}

#[derive(sqlx::FromRow)]
struct LockedSlot {
    max_capacity: i32,
    current_bookings: i32,
    status: String,
}

/// Reserves capacity inside one transaction holding a row lock on the slot,
/// so two customers racing for the last spot cannot both succeed
pub struct PgBookingCommitter {
    pool: PgPool,
    payments: Arc<dyn PaymentGateway>,
}

impl PgBookingCommitter {
    pub fn new(pool: PgPool, payments: Arc<dyn PaymentGateway>) -> Self {
        Self { pool, payments }
    }
}

#[async_trait]
impl BookingCommitter for PgBookingCommitter {
    async fn commit(&self, request: &CommitRequest) -> Result<BookingConfirmation, CommitError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let slot = sqlx::query_as::<_, LockedSlot>(
            "SELECT max_capacity, current_bookings, status FROM booking_slots \
             WHERE id = $1 AND attraction_id = $2 \
             FOR UPDATE",
        )
        .bind(request.slot_id)
        .bind(request.attraction_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err)?
        .ok_or(CommitError::SlotUnavailable(request.slot_id))?;

        let status = parse_slot_status(&slot.status).map_err(|e| CommitError::Backend(e.to_string()))?;
        check_capacity(request, status, slot.max_capacity, slot.current_bookings)?;

        let party_size = i32::try_from(request.party_size)
            .map_err(|_| CommitError::Backend("party size out of range".to_string()))?;

        sqlx::query("UPDATE booking_slots SET current_bookings = current_bookings + $2 WHERE id = $1")
            .bind(request.slot_id)
            .bind(party_size)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

        // Dropping `tx` on any failure up to here rolls the reservation back
        let booking_id = Uuid::new_v4();
        let intent = capture(self.payments.as_ref(), booking_id, request).await?;

        let code = confirmation_code(booking_id);
        let created_at = Utc::now();
        if let Err(e) = record_booking(tx, request, booking_id, &code, party_size, &intent, created_at).await {
            compensate(self.payments.as_ref(), &intent).await;
            return Err(db_err(e));
        }

        tracing::info!(
            %booking_id,
            slot_id = %request.slot_id,
            party_size = request.party_size,
            email = %Masked(&request.customer.email),
            "Booking committed"
        );

        Ok(BookingConfirmation {
            booking_id,
            confirmation_code: code,
            slot_id: request.slot_id,
            party_size: request.party_size,
            total: request.total,
            currency: request.currency.clone(),
            created_at,
        })
    }
}

/// Inserts the booking row and commits the reservation
async fn record_booking(
    mut tx: Transaction<'_, Postgres>,
    request: &CommitRequest,
    booking_id: Uuid,
    code: &str,
    party_size: i32,
    intent: &PaymentIntent,
    created_at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    let customer = &request.customer;
    let acknowledged: Vec<Uuid> = request.acknowledged_requirements.iter().copied().collect();

    sqlx::query(
        "INSERT INTO attraction_bookings \
         (id, attraction_id, slot_id, resource_id, confirmation_code, party_size, package_id, \
          addons, custom_fields, acknowledged_requirements, customer_first_name, \
          customer_last_name, customer_email, customer_phone, special_requests, \
          marketing_opt_in, total, currency, payment_reference, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)",
    )
    .bind(booking_id)
    .bind(request.attraction_id)
    .bind(request.slot_id)
    .bind(request.staff_id)
    .bind(code)
    .bind(party_size)
    .bind(request.package_id)
    .bind(Json(&request.addons))
    .bind(Json(&request.custom_fields))
    .bind(&acknowledged)
    .bind(&customer.first_name)
    .bind(&customer.last_name)
    .bind(&customer.email)
    .bind(&customer.phone)
    .bind(&customer.special_requests)
    .bind(customer.marketing_opt_in)
    .bind(request.total)
    .bind(&request.currency)
    .bind(&intent.id)
    .bind(created_at)
    .execute(&mut *tx)
    .await?;

    tx.commit().await
}
