use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use rota_shared::{RatingSummaryRow, Review};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Reviews newer than this count as recent
const RECENT_WINDOW_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StarCount {
    pub stars: u8,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewSummary {
    pub average_rating: f64,
    pub total_count: u32,
    /// Five entries, 5 stars first
    pub breakdown: Vec<StarCount>,
    pub recent_count: u32,
}

impl ReviewSummary {
    /// Summary for `reviews`, preferring the counts of a precomputed row.
    ///
    /// The precomputed row only covers totals, so the star breakdown always
    /// comes from the fetched reviews.
    pub fn build(
        reviews: &[Review],
        precomputed: Option<&RatingSummaryRow>,
        now: DateTime<Utc>,
    ) -> Self {
        let breakdown = breakdown(reviews);

        if let Some(row) = precomputed {
            return Self {
                average_rating: row.average_rating,
                total_count: row.total_reviews,
                breakdown,
                recent_count: row.recent_reviews,
            };
        }

        let total: u32 = reviews.iter().map(|r| u32::from(r.rating)).sum();
        let average_rating = if reviews.is_empty() {
            0.0
        } else {
            f64::from(total) / reviews.len() as f64
        };
        let cutoff = now - Duration::days(RECENT_WINDOW_DAYS);
        let recent_count = reviews.iter().filter(|r| r.created_at >= cutoff).count() as u32;

        Self {
            average_rating,
            total_count: reviews.len() as u32,
            breakdown,
            recent_count,
        }
    }
}

fn breakdown(reviews: &[Review]) -> Vec<StarCount> {
    (1..=5u8)
        .rev()
        .map(|stars| StarCount {
            stars,
            count: reviews.iter().filter(|r| r.rating == stars).count() as u32,
        })
        .collect()
}

pub fn featured(reviews: &[Review]) -> Vec<&Review> {
    reviews.iter().filter(|r| r.is_featured).collect()
}

/// Per-resource rating aggregate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResourceRating {
    pub average: f64,
    pub count: u32,
}

/// Averages published reviews by the resource they mention
pub fn ratings_by_resource(reviews: &[Review]) -> HashMap<Uuid, ResourceRating> {
    let mut sums: HashMap<Uuid, (u32, u32)> = HashMap::new();
    for review in reviews.iter().filter(|r| r.is_published) {
        if let Some(resource_id) = review.resource_id {
            let entry = sums.entry(resource_id).or_default();
            entry.0 += u32::from(review.rating);
            entry.1 += 1;
        }
    }
    sums.into_iter()
        .map(|(id, (total, count))| {
            (
                id,
                ResourceRating {
                    average: f64::from(total) / f64::from(count),
                    count,
                },
            )
        })
        .collect()
}
