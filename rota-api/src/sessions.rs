use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use rota_availability::{AvailabilityService, Calendar, SlotList};
use rota_booking::{BookingAction, BookingFlow, Checkout, FlowSnapshot};
use rota_catalog::AddonCatalog;
use rota_core::BookingConfirmation;
use serde::Serialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::{AppState, BookingSession};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/attractions/{id}/sessions", post(create_session))
        .route("/v1/sessions/{id}", get(get_session).delete(delete_session))
        .route("/v1/sessions/{id}/actions", post(apply_action))
        .route("/v1/sessions/{id}/checkout", post(checkout))
}

/// Slot list the session is currently polling
#[derive(Debug, Serialize)]
pub struct SlotsView {
    pub data: Option<SlotList>,
    pub error: Option<String>,
    pub is_loading: bool,
    pub is_stale: bool,
}

/// Calendar the session is currently polling
#[derive(Debug, Serialize)]
pub struct CalendarView {
    pub data: Option<Calendar>,
    pub error: Option<String>,
    pub is_loading: bool,
    pub is_stale: bool,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session_id: Uuid,
    #[serde(flatten)]
    pub flow: FlowSnapshot,
    pub calendar: CalendarView,
    pub slots: Option<SlotsView>,
}

#[derive(Debug, Serialize)]
pub struct ActionResponse {
    /// `false` when navigation was blocked
    pub applied: bool,
    #[serde(flatten)]
    pub session: SessionResponse,
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub confirmation: BookingConfirmation,
    #[serde(flatten)]
    pub session: SessionResponse,
}

async fn session_response(session: &BookingSession) -> SessionResponse {
    let slots = match session.slot_key() {
        Some(_) => {
            let snapshot = session.availability.slots_cache().snapshot().await;
            Some(SlotsView {
                data: snapshot.data.map(|list| (*list).clone()),
                error: snapshot.error,
                is_loading: snapshot.is_loading,
                is_stale: snapshot.is_stale,
            })
        }
        None => None,
    };
    let calendar = session.availability.calendar_cache().snapshot().await;
    SessionResponse {
        session_id: session.id,
        flow: session.flow.snapshot(),
        calendar: CalendarView {
            data: calendar.data.map(|c| (*c).clone()),
            error: calendar.error,
            is_loading: calendar.is_loading,
            is_stale: calendar.is_stale,
        },
        slots,
    }
}

/// POST /v1/attractions/{id}/sessions
/// Opens a booking wizard with a fresh draft
async fn create_session(
    State(state): State<AppState>,
    Path(attraction_id): Path<Uuid>,
) -> Result<(StatusCode, Json<SessionResponse>), AppError> {
    let (attraction, addons, packages) = tokio::try_join!(
        state.source.load_attraction(attraction_id),
        state.source.list_addons(attraction_id),
        state.source.list_packages(attraction_id),
    )?;

    let flow = BookingFlow::for_attraction(&attraction, AddonCatalog::new(addons, packages));
    let availability = Arc::new(AvailabilityService::new(
        state.source.clone(),
        &attraction,
        state.availability.clone(),
    ));
    let mut session = BookingSession::new(flow, availability);
    session.sync_calendar_polling();
    let session_id = session.id;
    let response = session_response(&session).await;
    state.sessions.insert(session).await;

    tracing::info!(%session_id, %attraction_id, "Booking session opened");
    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /v1/sessions/{id}
async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionResponse>, AppError> {
    let handle = find(&state, session_id).await?;
    let mut session = handle.lock().await;
    session.touch();
    Ok(Json(session_response(&session).await))
}

/// POST /v1/sessions/{id}/actions
async fn apply_action(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(action): Json<BookingAction>,
) -> Result<Json<ActionResponse>, AppError> {
    let handle = find(&state, session_id).await?;
    let mut session = handle.lock().await;
    session.touch();

    let name = action.name();
    let refresh_slots = action.affects_availability();
    let applied = action.apply(&mut session.flow);
    if refresh_slots {
        session.sync_calendar_polling();
        session.sync_slot_polling();
    }
    tracing::debug!(%session_id, action = name, applied, step = %session.flow.current_step(), "Action applied");

    Ok(Json(ActionResponse {
        applied,
        session: session_response(&session).await,
    }))
}

/// POST /v1/sessions/{id}/checkout
/// Commits the booking. A slot that filled up in the meantime yields 409 and
/// the session is back on time selection.
async fn checkout(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<CheckoutResponse>, AppError> {
    let handle = find(&state, session_id).await?;
    let mut session = handle.lock().await;
    session.touch();

    let checkout = Checkout::new(state.committer.clone()).with_availability(session.availability.clone());
    let result = checkout.submit(&mut session.flow).await;
    // Slot cleared on a capacity race; keep polling the date
    session.sync_slot_polling();
    let confirmation = result?;

    Ok(Json(CheckoutResponse {
        confirmation,
        session: session_response(&session).await,
    }))
}

/// DELETE /v1/sessions/{id}
async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if state.sessions.remove(&session_id).await {
        tracing::info!(%session_id, "Booking session closed");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("session {session_id} not found")))
    }
}

async fn find(
    state: &AppState,
    session_id: Uuid,
) -> Result<Arc<tokio::sync::Mutex<BookingSession>>, AppError> {
    state
        .sessions
        .get(&session_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("session {session_id} not found")))
}
