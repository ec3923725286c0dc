use std::sync::Arc;

use rota_availability::AvailabilityService;
use rota_core::{BookingCommitter, BookingConfirmation, CommitError, CommitRequest};
use rota_shared::Masked;

use crate::flow::BookingFlow;
use crate::steps::BookingStep;
use crate::validation::StepBlocker;

#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    #[error("Checkout is only possible from the payment step, not {0}")]
    WrongStep(BookingStep),

    #[error("Booking is incomplete: {0}")]
    Incomplete(#[from] StepBlocker),

    /// The slot filled up after the customer picked it; they are back on the
    /// time step with fresh availability
    #[error("Selected slot is no longer available: {0}")]
    SlotTaken(#[source] CommitError),

    #[error("Payment declined: {0}")]
    PaymentDeclined(String),

    #[error("Booking could not be completed: {0}")]
    Commit(#[source] CommitError),
}

impl CheckoutError {
    /// The customer can fix this without starting over
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, CheckoutError::Commit(_))
    }
}

/// Hands a finished draft to the commit boundary and routes the outcome
/// back into the flow
pub struct Checkout {
    committer: Arc<dyn BookingCommitter>,
    availability: Option<Arc<AvailabilityService>>,
}

impl Checkout {
    pub fn new(committer: Arc<dyn BookingCommitter>) -> Self {
        Self {
            committer,
            availability: None,
        }
    }

    /// Slot lists in `availability` are re-fetched after a capacity race
    pub fn with_availability(mut self, availability: Arc<AvailabilityService>) -> Self {
        self.availability = Some(availability);
        self
    }

    /// Builds the payload for the commit boundary from a flow sitting on the
    /// payment step
    pub fn build_request(flow: &BookingFlow) -> Result<CommitRequest, CheckoutError> {
        if flow.current_step() != BookingStep::Payment {
            return Err(CheckoutError::WrongStep(flow.current_step()));
        }
        for step in flow.steps().iter().take_while(|s| **s != BookingStep::Payment) {
            flow.validate_step(*step)?;
        }

        let draft = flow.draft();
        let (Some(slot_id), Some(date)) = (draft.selected_slot_id, draft.selected_date) else {
            return Err(StepBlocker::MissingSlot.into());
        };
        let quote = flow.quote();

        Ok(CommitRequest {
            attraction_id: flow.config().attraction_id,
            slot_id,
            date,
            staff_id: draft.selected_staff_id,
            party_size: draft.party_size,
            addons: draft.selected_addons.clone(),
            package_id: flow.selected_package().map(|p| p.id),
            customer: draft.customer_info.clone(),
            custom_fields: draft.custom_field_responses.clone(),
            acknowledged_requirements: draft.acknowledged_requirements.clone(),
            total: quote.total,
            currency: quote.currency,
        })
    }

    pub async fn submit(&self, flow: &mut BookingFlow) -> Result<BookingConfirmation, CheckoutError> {
        let request = Self::build_request(flow)?;
        tracing::info!(
            attraction_id = %request.attraction_id,
            slot_id = %request.slot_id,
            party_size = request.party_size,
            total = request.total,
            email = %Masked(&request.customer.email),
            "Submitting booking"
        );

        match self.committer.commit(&request).await {
            Ok(confirmation) => {
                tracing::info!(
                    booking_id = %confirmation.booking_id,
                    code = %confirmation.confirmation_code,
                    "Booking confirmed"
                );
                flow.record_confirmation(confirmation.clone());
                Ok(confirmation)
            }
            Err(e) if e.is_capacity_race() => {
                tracing::warn!(slot_id = %request.slot_id, error = %e, "Slot taken at commit, returning to time selection");
                flow.return_to_slot_selection();
                self.refresh_slots(&request).await;
                Err(CheckoutError::SlotTaken(e))
            }
            Err(CommitError::PaymentDeclined(reason)) => {
                tracing::warn!(slot_id = %request.slot_id, reason = %reason, "Payment declined");
                Err(CheckoutError::PaymentDeclined(reason))
            }
            Err(e) => {
                tracing::error!(slot_id = %request.slot_id, error = %e, "Booking commit failed");
                Err(CheckoutError::Commit(e))
            }
        }
    }

    async fn refresh_slots(&self, request: &CommitRequest) {
        let Some(availability) = &self.availability else {
            return;
        };
        let key = availability.slot_key(request.staff_id, request.date, request.party_size);
        if let Err(e) = availability.force_refresh_slots(key).await {
            tracing::warn!(error = %e, "Slot refresh after capacity race failed");
        }
    }
}
