pub mod catalog;
pub mod pricing;
pub mod reviews;

pub use catalog::AddonCatalog;
pub use pricing::{PriceQuote, PricingEngine};
pub use reviews::{featured, ratings_by_resource, ResourceRating, ReviewSummary, StarCount};
