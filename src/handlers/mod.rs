use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

pub mod admin;
pub mod auth;
pub mod bookings;
pub mod health;
pub mod owner;
pub mod profiles;
pub mod workspaces;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/profiles", post(profiles::create_profile))
        .route("/api/profiles/me", get(profiles::me))
        .route(
            "/api/workspaces",
            get(workspaces::list_workspaces).post(workspaces::create_workspace),
        )
        .route(
            "/api/workspaces/:id",
            get(workspaces::get_workspace)
                .patch(workspaces::update_workspace)
                .delete(workspaces::delete_workspace),
        )
        .route(
            "/api/workspaces/:id/availability",
            get(workspaces::check_availability),
        )
        .route(
            "/api/workspaces/:id/bookings",
            get(workspaces::workspace_bookings),
        )
        .route(
            "/api/bookings",
            get(bookings::list_bookings).post(bookings::create_booking),
        )
        .route("/api/bookings/history", get(bookings::booking_history))
        .route("/api/bookings/:id", get(bookings::get_booking))
        .route("/api/bookings/:id/cancel", post(bookings::cancel_booking))
        .route("/api/bookings/:id/check-in", post(bookings::check_in))
        .route(
            "/api/bookings/:id/calendar.ics",
            get(bookings::download_ics),
        )
        .route(
            "/api/admin/bookings/:id/complete",
            post(admin::complete_booking),
        )
        .route("/api/owner/workspaces", get(workspaces::owner_workspaces))
        .route("/api/owner/events", get(owner::events_stream))
        .with_state(state)
}
