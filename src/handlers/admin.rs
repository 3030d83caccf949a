use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::Utc;

use crate::errors::AppError;
use crate::handlers::auth::check_admin;
use crate::models::Booking;
use crate::state::AppState;

// POST /api/admin/bookings/:id/complete
pub async fn complete_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Booking>, AppError> {
    check_admin(&headers, &state.config.admin_token)?;

    let booking = state
        .bookings
        .complete_booking(&id, Utc::now().naive_utc())
        .await?;

    tracing::info!(booking_id = %booking.id, "booking completed by admin");
    Ok(Json(booking))
}
