use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Something the customer must acknowledge before booking (waivers, age limits)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Requirement {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub is_mandatory: bool,
}

/// Attraction settings the booking engine needs
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AttractionProfile {
    pub id: Uuid,
    pub name: String,
    /// Per-person price in minor currency units
    pub base_price: i64,
    pub currency: String,
    pub timezone: String,
    pub requires_staff: bool,
    #[serde(default)]
    pub requirements: Vec<Requirement>,
}
