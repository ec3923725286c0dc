use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use rota_availability::{AvailabilityService, Calendar, SlotList};
use rota_catalog::{featured, AddonCatalog, ReviewSummary};
use rota_core::DateRange;
use rota_shared::{Addon, Package, Review, StaffProfile};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

const MAX_CALENDAR_DAYS: i64 = 366;
const DEFAULT_REVIEW_LIMIT: usize = 20;
const MAX_REVIEW_LIMIT: usize = 100;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/attractions/{id}/calendar", get(calendar))
        .route("/v1/attractions/{id}/slots", get(slots))
        .route("/v1/attractions/{id}/staff", get(staff))
        .route("/v1/attractions/{id}/reviews", get(reviews))
        .route("/v1/attractions/{id}/catalog", get(catalog))
}

fn party_size(raw: Option<i64>) -> u32 {
    u32::try_from(raw.unwrap_or(1).max(1)).unwrap_or(u32::MAX)
}

#[derive(Debug, Deserialize)]
pub struct CalendarQuery {
    pub party_size: Option<i64>,
    pub resource_id: Option<Uuid>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct SlotQuery {
    pub date: NaiveDate,
    pub party_size: Option<i64>,
    pub resource_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct StaffQuery {
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct ReviewQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct CatalogQuery {
    pub party_size: Option<i64>,
    pub date: Option<NaiveDate>,
    pub resource_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct StaffResponse {
    pub date: Option<NaiveDate>,
    pub staff: Vec<StaffProfile>,
    pub available_staff: Vec<StaffProfile>,
}

#[derive(Debug, Serialize)]
pub struct ReviewsResponse {
    pub summary: ReviewSummary,
    pub featured: Vec<Review>,
    pub reviews: Vec<Review>,
}

#[derive(Debug, Serialize)]
pub struct CatalogResponse {
    pub addons: Vec<Addon>,
    pub packages: Vec<Package>,
}

async fn service_for(state: &AppState, attraction_id: Uuid) -> Result<AvailabilityService, AppError> {
    let attraction = state.source.load_attraction(attraction_id).await?;
    Ok(AvailabilityService::new(
        state.source.clone(),
        &attraction,
        state.availability.clone(),
    ))
}

/// GET /v1/attractions/{id}/calendar
/// Per-date availability over the window, today plus the configured months
/// by default
async fn calendar(
    State(state): State<AppState>,
    Path(attraction_id): Path<Uuid>,
    Query(q): Query<CalendarQuery>,
) -> Result<Json<Calendar>, AppError> {
    let range = match (q.start, q.end) {
        (None, None) => None,
        (Some(start), None) => Some(DateRange::months_from(start, state.availability.window_months)),
        (start, Some(end)) => Some(DateRange::new(
            start.unwrap_or_else(|| Utc::now().date_naive()),
            end,
        )),
    };
    if let Some(range) = &range {
        if (range.end - range.start).num_days() > MAX_CALENDAR_DAYS {
            return Err(AppError::Validation(format!(
                "calendar window is limited to {MAX_CALENDAR_DAYS} days"
            )));
        }
    }

    let service = service_for(&state, attraction_id).await?;
    let key = service.calendar_key(q.resource_id, party_size(q.party_size), range);
    let calendar = service.refresh_calendar(key).await?;
    Ok(Json((*calendar).clone()))
}

/// GET /v1/attractions/{id}/slots?date=YYYY-MM-DD
async fn slots(
    State(state): State<AppState>,
    Path(attraction_id): Path<Uuid>,
    Query(q): Query<SlotQuery>,
) -> Result<Json<SlotList>, AppError> {
    let service = service_for(&state, attraction_id).await?;
    let key = service.slot_key(q.resource_id, q.date, party_size(q.party_size));
    let list = service.refresh_slots(key).await?;
    Ok(Json((*list).clone()))
}

/// GET /v1/attractions/{id}/staff
async fn staff(
    State(state): State<AppState>,
    Path(attraction_id): Path<Uuid>,
    Query(q): Query<StaffQuery>,
) -> Result<Json<StaffResponse>, AppError> {
    let service = service_for(&state, attraction_id).await?;
    let directory = service.refresh_staff(service.staff_key(q.date)).await?;
    Ok(Json(StaffResponse {
        date: directory.date,
        staff: directory.staff().to_vec(),
        available_staff: directory.available_staff().into_iter().cloned().collect(),
    }))
}

/// GET /v1/attractions/{id}/reviews
async fn reviews(
    State(state): State<AppState>,
    Path(attraction_id): Path<Uuid>,
    Query(q): Query<ReviewQuery>,
) -> Result<Json<ReviewsResponse>, AppError> {
    let limit = q.limit.unwrap_or(DEFAULT_REVIEW_LIMIT).clamp(1, MAX_REVIEW_LIMIT);
    let (reviews, precomputed) = tokio::try_join!(
        state.source.list_reviews(attraction_id, limit),
        state.source.rating_summary(attraction_id),
    )?;

    Ok(Json(ReviewsResponse {
        summary: ReviewSummary::build(&reviews, precomputed.as_ref(), Utc::now()),
        featured: featured(&reviews).into_iter().cloned().collect(),
        reviews,
    }))
}

/// GET /v1/attractions/{id}/catalog
/// Add-ons and packages offered for a party size, date and resource
async fn catalog(
    State(state): State<AppState>,
    Path(attraction_id): Path<Uuid>,
    Query(q): Query<CatalogQuery>,
) -> Result<Json<CatalogResponse>, AppError> {
    let (addons, packages) = tokio::try_join!(
        state.source.list_addons(attraction_id),
        state.source.list_packages(attraction_id),
    )?;
    let catalog = AddonCatalog::new(addons, packages);
    let party = party_size(q.party_size);

    Ok(Json(CatalogResponse {
        addons: catalog
            .available_addons(party, q.date, q.resource_id)
            .into_iter()
            .cloned()
            .collect(),
        packages: catalog
            .available_packages(party, q.date)
            .into_iter()
            .cloned()
            .collect(),
    }))
}
