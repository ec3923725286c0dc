pub mod models;
pub mod pii;

pub use models::{
    Addon, AddonAvailabilityRules, AddonPricingType, AttractionProfile, BookingSlot,
    CustomerInfo, Package, PackageValidityRules, RatingSummaryRow, Requirement, ResourceSummary,
    Review, SlotStatus, StaffProfile,
};
pub use pii::Masked;
