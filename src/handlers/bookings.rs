use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::handlers::auth::Requester;
use crate::handlers::workspaces::StatusQuery;
use crate::models::{Booking, BookingHistory, NewBooking, Workspace};
use crate::services::{availability, calendar, history};
use crate::state::AppState;

#[derive(Serialize)]
pub struct BookingResponse {
    booking: Booking,
    check_in_url: String,
}

impl BookingResponse {
    fn new(state: &AppState, booking: Booking) -> Self {
        let check_in_url = state.bookings.check_in_url(&booking.id);
        Self {
            booking,
            check_in_url,
        }
    }
}

// POST /api/bookings
#[derive(Deserialize)]
pub struct CreateBookingRequest {
    pub workspace_id: String,
    pub start_time: String,
    pub end_time: String,
}

pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    requester: Requester,
    Json(body): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<BookingResponse>), AppError> {
    let request = NewBooking {
        workspace_id: body.workspace_id.trim().to_string(),
        requester_id: requester.id().to_string(),
        start_time: availability::parse_timestamp(&body.start_time)?,
        end_time: availability::parse_timestamp(&body.end_time)?,
    };

    let booking = state
        .bookings
        .create_booking(request, Utc::now().naive_utc())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(BookingResponse::new(&state, booking)),
    ))
}

// GET /api/bookings?status=..
pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    requester: Requester,
    Query(query): Query<StatusQuery>,
) -> Result<Json<Vec<Booking>>, AppError> {
    let status = query.parsed()?;
    let bookings = {
        let db = state.conn()?;
        queries::bookings_for_requester(&db, requester.id(), status)?
    };
    Ok(Json(bookings))
}

// GET /api/bookings/history
pub async fn booking_history(
    State(state): State<Arc<AppState>>,
    requester: Requester,
) -> Result<Json<BookingHistory>, AppError> {
    let bookings = {
        let db = state.conn()?;
        queries::bookings_for_requester(&db, requester.id(), None)?
    };
    Ok(Json(history::split_history(
        bookings,
        &Utc::now().naive_utc(),
    )))
}

/// Loads a booking visible to the requester: their own, or one on a workspace
/// they own. Anything else is reported as missing.
fn visible_booking(
    state: &AppState,
    requester: &Requester,
    booking_id: &str,
) -> Result<(Booking, Workspace), AppError> {
    let db = state.conn()?;
    let not_found = || AppError::NotFound(format!("booking {booking_id}"));

    let booking = queries::get_booking(&db, booking_id)?.ok_or_else(not_found)?;
    let workspace = queries::get_workspace(&db, &booking.workspace_id)?.ok_or_else(not_found)?;

    if booking.requester_id != requester.id() && workspace.owner_id != requester.id() {
        return Err(not_found());
    }
    Ok((booking, workspace))
}

// GET /api/bookings/:id
pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    requester: Requester,
    Path(id): Path<String>,
) -> Result<Json<BookingResponse>, AppError> {
    let (booking, _) = visible_booking(&state, &requester, &id)?;
    Ok(Json(BookingResponse::new(&state, booking)))
}

// POST /api/bookings/:id/cancel
pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    requester: Requester,
    Path(id): Path<String>,
) -> Result<Json<Booking>, AppError> {
    let booking = state
        .bookings
        .cancel_booking(&id, requester.id(), Utc::now().naive_utc())
        .await?;
    Ok(Json(booking))
}

// POST /api/bookings/:id/check-in
pub async fn check_in(
    State(state): State<Arc<AppState>>,
    requester: Requester,
    Path(id): Path<String>,
) -> Result<Json<Booking>, AppError> {
    let booking = state
        .bookings
        .check_in(&id, requester.id(), Utc::now().naive_utc())
        .await?;
    Ok(Json(booking))
}

// GET /api/bookings/:id/calendar.ics
pub async fn download_ics(
    State(state): State<Arc<AppState>>,
    requester: Requester,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let (booking, workspace) = visible_booking(&state, &requester, &id)?;
    let check_in_url = state.bookings.check_in_url(&booking.id);
    let ics = calendar::generate_ics(&booking, &workspace, &check_in_url);
    let disposition = format!("attachment; filename=\"booking-{}.ics\"", booking.id);

    Ok((
        [
            (header::CONTENT_TYPE, "text/calendar; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        ics,
    )
        .into_response())
}
