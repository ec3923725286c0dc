pub mod attraction;
pub mod catalog;
pub mod customer;
pub mod review;
pub mod slot;
pub mod staff;

pub use attraction::{AttractionProfile, Requirement};
pub use catalog::{Addon, AddonAvailabilityRules, AddonPricingType, Package, PackageValidityRules};
pub use customer::CustomerInfo;
pub use review::{RatingSummaryRow, Review};
pub use slot::{BookingSlot, ResourceSummary, SlotStatus};
pub use staff::StaffProfile;
