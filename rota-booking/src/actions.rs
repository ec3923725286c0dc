use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::draft::CustomerInfoUpdate;
use crate::flow::BookingFlow;
use crate::steps::BookingStep;

/// One customer interaction with the wizard, as sent by a client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BookingAction {
    NextStep,
    PrevStep,
    GoToStep { step: BookingStep },
    SelectDate { date: NaiveDate },
    SelectSlot { slot_id: Uuid, time: String },
    SelectStaff { staff_id: Option<Uuid> },
    SetPartySize { size: i64 },
    UpdateAddon { addon_id: Uuid, quantity: i64 },
    IncrementAddon { addon_id: Uuid },
    DecrementAddon { addon_id: Uuid },
    RemoveAddon { addon_id: Uuid },
    ClearAddons,
    SelectPackage { package_id: Option<Uuid> },
    UpdateCustomerInfo { info: CustomerInfoUpdate },
    UpdateCustomField { field_id: String, value: serde_json::Value },
    AcknowledgeRequirement { requirement_id: Uuid },
    Reset,
}

impl BookingAction {
    pub fn name(&self) -> &'static str {
        match self {
            BookingAction::NextStep => "next_step",
            BookingAction::PrevStep => "prev_step",
            BookingAction::GoToStep { .. } => "go_to_step",
            BookingAction::SelectDate { .. } => "select_date",
            BookingAction::SelectSlot { .. } => "select_slot",
            BookingAction::SelectStaff { .. } => "select_staff",
            BookingAction::SetPartySize { .. } => "set_party_size",
            BookingAction::UpdateAddon { .. } => "update_addon",
            BookingAction::IncrementAddon { .. } => "increment_addon",
            BookingAction::DecrementAddon { .. } => "decrement_addon",
            BookingAction::RemoveAddon { .. } => "remove_addon",
            BookingAction::ClearAddons => "clear_addons",
            BookingAction::SelectPackage { .. } => "select_package",
            BookingAction::UpdateCustomerInfo { .. } => "update_customer_info",
            BookingAction::UpdateCustomField { .. } => "update_custom_field",
            BookingAction::AcknowledgeRequirement { .. } => "acknowledge_requirement",
            BookingAction::Reset => "reset",
        }
    }

    /// Changes that alter which slots the customer should be shown
    pub fn affects_availability(&self) -> bool {
        matches!(
            self,
            BookingAction::SelectDate { .. }
                | BookingAction::SelectStaff { .. }
                | BookingAction::SetPartySize { .. }
                | BookingAction::Reset
        )
    }

    /// Applies the action. Navigation reports whether the step changed;
    /// edits always apply and report `true`.
    pub fn apply(self, flow: &mut BookingFlow) -> bool {
        match self {
            BookingAction::NextStep => return flow.next_step(),
            BookingAction::PrevStep => return flow.prev_step(),
            BookingAction::GoToStep { step } => return flow.go_to_step(step),
            BookingAction::SelectDate { date } => flow.select_date(date),
            BookingAction::SelectSlot { slot_id, time } => flow.select_slot(slot_id, time),
            BookingAction::SelectStaff { staff_id } => flow.select_staff(staff_id),
            BookingAction::SetPartySize { size } => flow.set_party_size(size),
            BookingAction::UpdateAddon { addon_id, quantity } => flow.update_addon(addon_id, quantity),
            BookingAction::IncrementAddon { addon_id } => flow.increment_addon(addon_id),
            BookingAction::DecrementAddon { addon_id } => flow.decrement_addon(addon_id),
            BookingAction::RemoveAddon { addon_id } => flow.remove_addon(addon_id),
            BookingAction::ClearAddons => flow.clear_addons(),
            BookingAction::SelectPackage { package_id } => flow.select_package(package_id),
            BookingAction::UpdateCustomerInfo { info } => flow.update_customer_info(info),
            BookingAction::UpdateCustomField { field_id, value } => {
                flow.update_custom_field(field_id, value)
            }
            BookingAction::AcknowledgeRequirement { requirement_id } => {
                flow.acknowledge_requirement(requirement_id)
            }
            BookingAction::Reset => flow.reset(),
        }
        true
    }
}
