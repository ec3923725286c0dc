use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How an add-on price scales
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AddonPricingType {
    PerPerson,
    #[serde(alias = "flat")]
    PerBooking,
}

/// Context restrictions on when an add-on may be offered
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AddonAvailabilityRules {
    /// 0 = Sunday .. 6 = Saturday
    pub days_of_week: Vec<u8>,
    pub min_party_size: Option<u32>,
    pub max_party_size: Option<u32>,
    pub resource_ids: Vec<Uuid>,
}

/// An optional extra sold alongside a booking
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Addon {
    pub id: Uuid,
    pub attraction_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// Unit price in minor currency units
    pub price: i64,
    pub pricing_type: AddonPricingType,
    #[serde(default)]
    pub is_required: bool,
    pub is_active: bool,
    pub max_quantity: Option<u32>,
    #[serde(default)]
    pub min_quantity: u32,
    pub category: Option<String>,
    #[serde(default)]
    pub display_order: i32,
    pub availability_rules: Option<AddonAvailabilityRules>,
}

impl Addon {
    pub const DEFAULT_MAX_QUANTITY: u32 = 99;

    pub fn quantity_limit(&self) -> u32 {
        self.max_quantity.unwrap_or(Self::DEFAULT_MAX_QUANTITY)
    }
}

/// Date restrictions on a package
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PackageValidityRules {
    pub valid_from: Option<NaiveDate>,
    pub valid_until: Option<NaiveDate>,
    pub days_of_week: Vec<u8>,
    pub blackout_dates: Vec<NaiveDate>,
}

/// A fixed-price bundle replacing the base price and a set of add-ons
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Package {
    pub id: Uuid,
    pub attraction_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub original_price: Option<i64>,
    pub discount_label: Option<String>,
    #[serde(default)]
    pub included_addon_ids: Vec<Uuid>,
    pub party_size_min: Option<u32>,
    pub party_size_max: Option<u32>,
    #[serde(default)]
    pub is_featured: bool,
    pub is_active: bool,
    #[serde(default)]
    pub display_order: i32,
    pub validity_rules: Option<PackageValidityRules>,
}
