use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Review {
    pub id: Uuid,
    pub attraction_id: Uuid,
    pub booking_id: Option<Uuid>,
    pub resource_id: Option<Uuid>,
    pub customer_name: String,
    /// 1..=5 stars
    pub rating: u8,
    pub title: Option<String>,
    pub review_text: Option<String>,
    pub is_verified: bool,
    pub is_featured: bool,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

/// Precomputed rating aggregate, when the data layer maintains one
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RatingSummaryRow {
    pub average_rating: f64,
    pub total_reviews: u32,
    pub recent_reviews: u32,
}
