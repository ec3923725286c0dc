use chrono::NaiveDate;
use indexmap::{IndexMap, IndexSet};
use rota_shared::CustomerInfo;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::steps::BookingStep;

/// Everything the customer has chosen so far in one session.
///
/// `selected_addons` never holds a zero quantity and is empty whenever a
/// package is selected through [`crate::BookingFlow::select_package`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingDraft {
    pub step: BookingStep,
    pub party_size: u32,
    pub selected_date: Option<NaiveDate>,
    pub selected_slot_id: Option<Uuid>,
    pub selected_time: String,
    /// `None` is "no preference"
    pub selected_staff_id: Option<Uuid>,
    pub selected_addons: IndexMap<Uuid, u32>,
    pub selected_package_id: Option<Uuid>,
    pub customer_info: CustomerInfo,
    pub custom_field_responses: IndexMap<String, serde_json::Value>,
    pub acknowledged_requirements: IndexSet<Uuid>,
}

impl Default for BookingDraft {
    fn default() -> Self {
        Self {
            step: BookingStep::Date,
            party_size: 1,
            selected_date: None,
            selected_slot_id: None,
            selected_time: String::new(),
            selected_staff_id: None,
            selected_addons: IndexMap::new(),
            selected_package_id: None,
            customer_info: CustomerInfo::default(),
            custom_field_responses: IndexMap::new(),
            acknowledged_requirements: IndexSet::new(),
        }
    }
}

/// Partial customer details; absent fields are left as they are
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CustomerInfoUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub special_requests: Option<String>,
    pub marketing_opt_in: Option<bool>,
}

impl CustomerInfoUpdate {
    pub fn apply_to(self, info: &mut CustomerInfo) {
        if let Some(v) = self.first_name {
            info.first_name = v;
        }
        if let Some(v) = self.last_name {
            info.last_name = v;
        }
        if let Some(v) = self.email {
            // Pasted addresses often carry stray whitespace
            info.email = v.trim().to_string();
        }
        if let Some(v) = self.phone {
            info.phone = v;
        }
        if let Some(v) = self.special_requests {
            info.special_requests = v;
        }
        if let Some(v) = self.marketing_opt_in {
            info.marketing_opt_in = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_update_keeps_other_fields() {
        let mut info = CustomerInfo {
            first_name: "Aroha".into(),
            email: "aroha@example.com".into(),
            ..Default::default()
        };
        CustomerInfoUpdate {
            last_name: Some("Ngata".into()),
            ..Default::default()
        }
        .apply_to(&mut info);

        assert_eq!(info.first_name, "Aroha");
        assert_eq!(info.last_name, "Ngata");
        assert_eq!(info.email, "aroha@example.com");
    }

    #[test]
    fn test_email_is_stored_trimmed() {
        let mut info = CustomerInfo::default();
        CustomerInfoUpdate {
            email: Some("  kiri@example.com\n".into()),
            ..Default::default()
        }
        .apply_to(&mut info);
        assert_eq!(info.email, "kiri@example.com");
    }

    #[test]
    fn test_draft_serialization_keeps_selection_order() {
        let mut draft = BookingDraft::default();
        let ids: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
        for (i, id) in ids.iter().enumerate() {
            draft.selected_addons.insert(*id, i as u32 + 1);
        }
        draft.acknowledged_requirements.insert(ids[2]);

        let json = serde_json::to_string(&draft).unwrap();
        let back: BookingDraft = serde_json::from_str(&json).unwrap();
        assert_eq!(back.selected_addons.keys().copied().collect::<Vec<_>>(), ids);
        assert_eq!(back, draft);
    }
}
