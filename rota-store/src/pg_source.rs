use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rota_core::{AttractionDataSource, DataResult, DataSourceError, DateRange};
use rota_shared::{
    Addon, AddonAvailabilityRules, AddonPricingType, AttractionProfile, BookingSlot, Package,
    PackageValidityRules, RatingSummaryRow, Requirement, ResourceSummary, Review, SlotStatus,
    StaffProfile,
};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::StoreError;

/// Postgres binding of the data boundary
pub struct PgAttractionSource {
    pool: PgPool,
}

impl PgAttractionSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn db_err(e: sqlx::Error) -> DataSourceError {
    tracing::error!(error = %e, "Attraction query failed");
    StoreError::from(e).into()
}

fn to_u32(value: i32, column: &str) -> Result<u32, StoreError> {
    u32::try_from(value).map_err(|_| StoreError::Decode(format!("{column} is negative: {value}")))
}

pub(crate) fn parse_slot_status(raw: &str) -> Result<SlotStatus, StoreError> {
    match raw {
        "available" => Ok(SlotStatus::Available),
        "booked" => Ok(SlotStatus::Booked),
        "blocked" => Ok(SlotStatus::Blocked),
        "maintenance" => Ok(SlotStatus::Maintenance),
        other => Err(StoreError::Decode(format!("unknown slot status {other:?}"))),
    }
}

fn parse_pricing_type(raw: &str) -> Result<AddonPricingType, StoreError> {
    match raw {
        "per_person" => Ok(AddonPricingType::PerPerson),
        "per_booking" | "flat" => Ok(AddonPricingType::PerBooking),
        other => Err(StoreError::Decode(format!("unknown pricing type {other:?}"))),
    }
}

#[derive(sqlx::FromRow)]
struct AttractionRow {
    id: Uuid,
    name: String,
    base_price: i64,
    currency: String,
    timezone: String,
    requires_staff: bool,
}

#[derive(sqlx::FromRow)]
struct RequirementRow {
    id: Uuid,
    title: String,
    description: Option<String>,
    is_mandatory: bool,
}

#[derive(sqlx::FromRow)]
struct SlotRow {
    id: Uuid,
    attraction_id: Uuid,
    resource_id: Option<Uuid>,
    slot_date: NaiveDate,
    start_time: NaiveTime,
    end_time: NaiveTime,
    max_capacity: i32,
    current_bookings: i32,
    price_override: Option<i64>,
    status: String,
    resource_name: Option<String>,
    resource_photo_url: Option<String>,
    resource_specialties: Option<Vec<String>>,
}

impl TryFrom<SlotRow> for BookingSlot {
    type Error = StoreError;

    fn try_from(row: SlotRow) -> Result<Self, Self::Error> {
        let resource = match (row.resource_id, row.resource_name) {
            (Some(id), Some(name)) => Some(ResourceSummary {
                id,
                name,
                photo_url: row.resource_photo_url,
                specialties: row.resource_specialties.unwrap_or_default(),
            }),
            _ => None,
        };
        Ok(BookingSlot {
            id: row.id,
            attraction_id: row.attraction_id,
            resource_id: row.resource_id,
            date: row.slot_date,
            start_time: row.start_time,
            end_time: row.end_time,
            max_capacity: row.max_capacity,
            current_bookings: row.current_bookings,
            price_override: row.price_override,
            status: parse_slot_status(&row.status)?,
            resource,
        })
    }
}

#[derive(sqlx::FromRow)]
struct AddonRow {
    id: Uuid,
    attraction_id: Uuid,
    name: String,
    description: Option<String>,
    price: i64,
    pricing_type: String,
    is_required: bool,
    is_active: bool,
    max_quantity: Option<i32>,
    min_quantity: i32,
    category: Option<String>,
    display_order: i32,
    availability_rules: Option<Json<AddonAvailabilityRules>>,
}

impl TryFrom<AddonRow> for Addon {
    type Error = StoreError;

    fn try_from(row: AddonRow) -> Result<Self, Self::Error> {
        Ok(Addon {
            id: row.id,
            attraction_id: row.attraction_id,
            name: row.name,
            description: row.description,
            price: row.price,
            pricing_type: parse_pricing_type(&row.pricing_type)?,
            is_required: row.is_required,
            is_active: row.is_active,
            max_quantity: row.max_quantity.map(|q| to_u32(q, "max_quantity")).transpose()?,
            min_quantity: to_u32(row.min_quantity, "min_quantity")?,
            category: row.category,
            display_order: row.display_order,
            availability_rules: row.availability_rules.map(|Json(rules)| rules),
        })
    }
}

#[derive(sqlx::FromRow)]
struct PackageRow {
    id: Uuid,
    attraction_id: Uuid,
    name: String,
    description: Option<String>,
    price: i64,
    original_price: Option<i64>,
    discount_label: Option<String>,
    included_addon_ids: Vec<Uuid>,
    party_size_min: Option<i32>,
    party_size_max: Option<i32>,
    is_featured: bool,
    is_active: bool,
    display_order: i32,
    validity_rules: Option<Json<PackageValidityRules>>,
}

impl TryFrom<PackageRow> for Package {
    type Error = StoreError;

    fn try_from(row: PackageRow) -> Result<Self, Self::Error> {
        Ok(Package {
            id: row.id,
            attraction_id: row.attraction_id,
            name: row.name,
            description: row.description,
            price: row.price,
            original_price: row.original_price,
            discount_label: row.discount_label,
            included_addon_ids: row.included_addon_ids,
            party_size_min: row.party_size_min.map(|n| to_u32(n, "party_size_min")).transpose()?,
            party_size_max: row.party_size_max.map(|n| to_u32(n, "party_size_max")).transpose()?,
            is_featured: row.is_featured,
            is_active: row.is_active,
            display_order: row.display_order,
            validity_rules: row.validity_rules.map(|Json(rules)| rules),
        })
    }
}

#[derive(sqlx::FromRow)]
struct ResourceRow {
    id: Uuid,
    attraction_id: Uuid,
    name: String,
    bio: Option<String>,
    photo_url: Option<String>,
    specialties: Vec<String>,
    capacity: i32,
    display_order: i32,
    is_active: bool,
    show_on_widget: bool,
}

impl From<ResourceRow> for StaffProfile {
    fn from(row: ResourceRow) -> Self {
        StaffProfile {
            id: row.id,
            attraction_id: row.attraction_id,
            name: row.name,
            bio: row.bio,
            photo_url: row.photo_url,
            specialties: row.specialties,
            capacity: row.capacity,
            display_order: row.display_order,
            is_active: row.is_active,
            show_on_widget: row.show_on_widget,
            rating_average: None,
            booking_count: None,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ReviewRow {
    id: Uuid,
    attraction_id: Uuid,
    booking_id: Option<Uuid>,
    resource_id: Option<Uuid>,
    customer_name: String,
    rating: i16,
    title: Option<String>,
    review_text: Option<String>,
    is_verified: bool,
    is_featured: bool,
    is_published: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<ReviewRow> for Review {
    type Error = StoreError;

    fn try_from(row: ReviewRow) -> Result<Self, Self::Error> {
        let rating = u8::try_from(row.rating)
            .ok()
            .filter(|r| (1..=5).contains(r))
            .ok_or_else(|| StoreError::Decode(format!("rating out of range: {}", row.rating)))?;
        Ok(Review {
            id: row.id,
            attraction_id: row.attraction_id,
            booking_id: row.booking_id,
            resource_id: row.resource_id,
            customer_name: row.customer_name,
            rating,
            title: row.title,
            review_text: row.review_text,
            is_verified: row.is_verified,
            is_featured: row.is_featured,
            is_published: row.is_published,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct RatingSummaryDbRow {
    average_rating: Option<f64>,
    total_reviews: i64,
    recent_reviews: i64,
}

fn convert_all<R, T>(rows: Vec<R>) -> DataResult<Vec<T>>
where
    T: TryFrom<R, Error = StoreError>,
{
    rows.into_iter()
        .map(|row| T::try_from(row).map_err(DataSourceError::from))
        .collect()
}

#[async_trait]
impl AttractionDataSource for PgAttractionSource {
    async fn load_attraction(&self, attraction_id: Uuid) -> DataResult<AttractionProfile> {
        let row = sqlx::query_as::<_, AttractionRow>(
            "SELECT id, name, base_price, currency, timezone, requires_staff \
             FROM attractions WHERE id = $1",
        )
        .bind(attraction_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?
        .ok_or_else(|| DataSourceError::NotFound(format!("attraction {attraction_id}")))?;

        let requirements = sqlx::query_as::<_, RequirementRow>(
            "SELECT id, title, description, is_mandatory FROM attraction_requirements \
             WHERE attraction_id = $1 ORDER BY display_order",
        )
        .bind(attraction_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(AttractionProfile {
            id: row.id,
            name: row.name,
            base_price: row.base_price,
            currency: row.currency,
            timezone: row.timezone,
            requires_staff: row.requires_staff,
            requirements: requirements
                .into_iter()
                .map(|r| Requirement {
                    id: r.id,
                    title: r.title,
                    description: r.description,
                    is_mandatory: r.is_mandatory,
                })
                .collect(),
        })
    }

    async fn list_slots(
        &self,
        attraction_id: Uuid,
        resource_id: Option<Uuid>,
        range: &DateRange,
    ) -> DataResult<Vec<BookingSlot>> {
        let rows = sqlx::query_as::<_, SlotRow>(
            "SELECT s.id, s.attraction_id, s.resource_id, s.slot_date, s.start_time, s.end_time, \
                    s.max_capacity, s.current_bookings, s.price_override, s.status, \
                    r.name AS resource_name, r.photo_url AS resource_photo_url, \
                    r.specialties AS resource_specialties \
             FROM booking_slots s \
             LEFT JOIN attraction_resources r ON r.id = s.resource_id \
             WHERE s.attraction_id = $1 \
               AND s.slot_date BETWEEN $2 AND $3 \
               AND ($4::uuid IS NULL OR s.resource_id = $4) \
             ORDER BY s.slot_date, s.start_time",
        )
        .bind(attraction_id)
        .bind(range.start)
        .bind(range.end)
        .bind(resource_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        tracing::debug!(%attraction_id, rows = rows.len(), "Loaded booking slots");
        convert_all(rows)
    }

    async fn list_addons(&self, attraction_id: Uuid) -> DataResult<Vec<Addon>> {
        let rows = sqlx::query_as::<_, AddonRow>(
            "SELECT id, attraction_id, name, description, price, pricing_type, is_required, \
                    is_active, max_quantity, min_quantity, category, display_order, \
                    availability_rules \
             FROM attraction_addons \
             WHERE attraction_id = $1 AND is_active \
             ORDER BY display_order",
        )
        .bind(attraction_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        convert_all(rows)
    }

    async fn list_packages(&self, attraction_id: Uuid) -> DataResult<Vec<Package>> {
        let rows = sqlx::query_as::<_, PackageRow>(
            "SELECT id, attraction_id, name, description, price, original_price, discount_label, \
                    included_addon_ids, party_size_min, party_size_max, is_featured, is_active, \
                    display_order, validity_rules \
             FROM attraction_packages \
             WHERE attraction_id = $1 AND is_active \
             ORDER BY display_order",
        )
        .bind(attraction_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        convert_all(rows)
    }

    async fn list_resources(&self, attraction_id: Uuid) -> DataResult<Vec<StaffProfile>> {
        let rows = sqlx::query_as::<_, ResourceRow>(
            "SELECT id, attraction_id, name, bio, photo_url, specialties, capacity, \
                    display_order, is_active, show_on_widget \
             FROM attraction_resources \
             WHERE attraction_id = $1 AND is_active AND show_on_widget \
             ORDER BY display_order",
        )
        .bind(attraction_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows.into_iter().map(StaffProfile::from).collect())
    }

    async fn list_reviews(&self, attraction_id: Uuid, limit: usize) -> DataResult<Vec<Review>> {
        let rows = sqlx::query_as::<_, ReviewRow>(
            "SELECT id, attraction_id, booking_id, resource_id, customer_name, rating, title, \
                    review_text, is_verified, is_featured, is_published, created_at \
             FROM attraction_reviews \
             WHERE attraction_id = $1 AND is_published \
             ORDER BY created_at DESC \
             LIMIT $2",
        )
        .bind(attraction_id)
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        convert_all(rows)
    }

    async fn rating_summary(&self, attraction_id: Uuid) -> DataResult<Option<RatingSummaryRow>> {
        let row = sqlx::query_as::<_, RatingSummaryDbRow>(
            "SELECT average_rating, total_reviews, recent_reviews \
             FROM attraction_rating_summary WHERE attraction_id = $1",
        )
        .bind(attraction_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(row.map(|r| RatingSummaryRow {
            average_rating: r.average_rating.unwrap_or(0.0),
            total_reviews: u32::try_from(r.total_reviews).unwrap_or(u32::MAX),
            recent_reviews: u32::try_from(r.recent_reviews).unwrap_or(u32::MAX),
        }))
    }
}
