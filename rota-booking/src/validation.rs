use std::sync::LazyLock;

use regex::Regex;
use rota_shared::Requirement;
use uuid::Uuid;

use crate::draft::BookingDraft;
use crate::steps::BookingStep;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex")
});

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Why the current step cannot be left
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StepBlocker {
    #[error("Select a date")]
    MissingDate,

    #[error("Select a time slot")]
    MissingSlot,

    #[error("First name is required")]
    MissingFirstName,

    #[error("Last name is required")]
    MissingLastName,

    #[error("Email is required")]
    MissingEmail,

    #[error("Email address is not valid")]
    InvalidEmail,

    #[error("{} requirement(s) must be acknowledged", .0.len())]
    UnacknowledgedRequirements(Vec<Uuid>),
}

impl StepBlocker {
    pub fn code(&self) -> &'static str {
        match self {
            StepBlocker::MissingDate => "missing_date",
            StepBlocker::MissingSlot => "missing_slot",
            StepBlocker::MissingFirstName => "missing_first_name",
            StepBlocker::MissingLastName => "missing_last_name",
            StepBlocker::MissingEmail => "missing_email",
            StepBlocker::InvalidEmail => "invalid_email",
            StepBlocker::UnacknowledgedRequirements(_) => "unacknowledged_requirements",
        }
    }
}

/// Checks the data `step` needs against the draft.
///
/// Only mandatory entries of `requirements` gate the requirements step.
pub fn validate_step(
    step: BookingStep,
    draft: &BookingDraft,
    requirements: &[Requirement],
) -> Result<(), StepBlocker> {
    match step {
        BookingStep::Date => draft.selected_date.map(|_| ()).ok_or(StepBlocker::MissingDate),
        BookingStep::Time => draft.selected_slot_id.map(|_| ()).ok_or(StepBlocker::MissingSlot),
        BookingStep::Requirements => {
            let missing: Vec<Uuid> = requirements
                .iter()
                .filter(|r| r.is_mandatory && !draft.acknowledged_requirements.contains(&r.id))
                .map(|r| r.id)
                .collect();
            if missing.is_empty() {
                Ok(())
            } else {
                Err(StepBlocker::UnacknowledgedRequirements(missing))
            }
        }
        BookingStep::Details => {
            let info = &draft.customer_info;
            if info.first_name.trim().is_empty() {
                Err(StepBlocker::MissingFirstName)
            } else if info.last_name.trim().is_empty() {
                Err(StepBlocker::MissingLastName)
            } else if info.email.trim().is_empty() {
                Err(StepBlocker::MissingEmail)
            } else if !is_valid_email(info.email.trim()) {
                Err(StepBlocker::InvalidEmail)
            } else {
                Ok(())
            }
        }
        BookingStep::Staff
        | BookingStep::Addons
        | BookingStep::Payment
        | BookingStep::Confirmation => Ok(()),
    }
}
