use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};

use crate::db::queries;
use crate::errors::{AppError, BookingError};
use crate::handlers::auth::Requester;
use crate::models::{Booking, BookingStatus, Workspace, WorkspaceFilter};
use crate::services::{availability, pricing};
use crate::state::AppState;

fn check_rates(hourly: Option<i64>, daily: i64, monthly: Option<i64>) -> Result<(), AppError> {
    let rates = [hourly, Some(daily), monthly];
    if rates.iter().flatten().any(|rate| *rate < 0) {
        return Err(AppError::BadRequest("rates must not be negative".to_string()));
    }
    if rates.iter().flatten().any(|rate| *rate > pricing::MAX_RATE) {
        return Err(AppError::BadRequest(format!(
            "rates must not exceed {}",
            pricing::MAX_RATE
        )));
    }
    Ok(())
}

fn required(field: &str, value: &str) -> Result<String, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::BadRequest(format!("{field} must not be blank")));
    }
    Ok(value.to_string())
}

// POST /api/workspaces
#[derive(Deserialize)]
pub struct CreateWorkspaceRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub location: String,
    pub category: String,
    pub hourly_rate: Option<i64>,
    pub daily_rate: i64,
    pub monthly_rate: Option<i64>,
    #[serde(default)]
    pub images: Vec<String>,
}

pub async fn create_workspace(
    State(state): State<Arc<AppState>>,
    requester: Requester,
    Json(body): Json<CreateWorkspaceRequest>,
) -> Result<(StatusCode, Json<Workspace>), AppError> {
    requester.require_owner()?;

    let name = body.name.trim().to_string();
    let location = body.location.trim().to_string();
    let category = body.category.trim().to_string();
    if name.is_empty() || location.is_empty() || category.is_empty() {
        return Err(AppError::BadRequest(
            "name, location and category are required".to_string(),
        ));
    }

    check_rates(body.hourly_rate, body.daily_rate, body.monthly_rate)?;

    let workspace = Workspace {
        id: uuid::Uuid::new_v4().to_string(),
        owner_id: requester.id().to_string(),
        name,
        description: body.description.trim().to_string(),
        location,
        category,
        hourly_rate: body.hourly_rate,
        daily_rate: body.daily_rate,
        monthly_rate: body.monthly_rate,
        images: body.images,
        created_at: chrono::Utc::now().naive_utc(),
    };

    {
        let db = state.conn()?;
        queries::insert_workspace(&db, &workspace)?;
    }

    tracing::info!(workspace_id = %workspace.id, owner_id = %workspace.owner_id, "workspace listed");

    Ok((StatusCode::CREATED, Json(workspace)))
}

// GET /api/workspaces
pub async fn list_workspaces(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<WorkspaceFilter>,
) -> Result<Json<Vec<Workspace>>, AppError> {
    let filter = filter.normalized();
    let workspaces = {
        let db = state.conn()?;
        queries::list_workspaces(&db, &filter)?
    };
    Ok(Json(workspaces))
}

fn load_workspace(state: &AppState, id: &str) -> Result<Workspace, AppError> {
    let workspace = {
        let db = state.conn()?;
        queries::get_workspace(&db, id)?
    };
    workspace.ok_or_else(|| AppError::NotFound(format!("workspace {id}")))
}

fn owned_workspace(state: &AppState, requester: &Requester, id: &str) -> Result<Workspace, AppError> {
    let workspace = load_workspace(state, id)?;
    if workspace.owner_id != requester.id() {
        return Err(AppError::Forbidden(
            "only the workspace owner can manage it".to_string(),
        ));
    }
    Ok(workspace)
}

// GET /api/workspaces/:id
pub async fn get_workspace(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Workspace>, AppError> {
    Ok(Json(load_workspace(&state, &id)?))
}

/// Distinguishes an explicit `null` from a missing field.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

// PATCH /api/workspaces/:id
#[derive(Deserialize)]
pub struct UpdateWorkspaceRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub category: Option<String>,
    /// `null` clears the hourly rate; an absent field leaves it alone.
    #[serde(default, deserialize_with = "present")]
    pub hourly_rate: Option<Option<i64>>,
    pub daily_rate: Option<i64>,
    #[serde(default, deserialize_with = "present")]
    pub monthly_rate: Option<Option<i64>>,
    pub images: Option<Vec<String>>,
}

pub async fn update_workspace(
    State(state): State<Arc<AppState>>,
    requester: Requester,
    Path(id): Path<String>,
    Json(body): Json<UpdateWorkspaceRequest>,
) -> Result<Json<Workspace>, AppError> {
    let mut workspace = owned_workspace(&state, &requester, &id)?;

    if let Some(name) = body.name {
        workspace.name = required("name", &name)?;
    }
    if let Some(location) = body.location {
        workspace.location = required("location", &location)?;
    }
    if let Some(category) = body.category {
        workspace.category = required("category", &category)?;
    }
    if let Some(description) = body.description {
        workspace.description = description.trim().to_string();
    }
    if let Some(hourly_rate) = body.hourly_rate {
        workspace.hourly_rate = hourly_rate;
    }
    if let Some(daily_rate) = body.daily_rate {
        workspace.daily_rate = daily_rate;
    }
    if let Some(monthly_rate) = body.monthly_rate {
        workspace.monthly_rate = monthly_rate;
    }
    if let Some(images) = body.images {
        workspace.images = images;
    }
    check_rates(workspace.hourly_rate, workspace.daily_rate, workspace.monthly_rate)?;

    let updated = {
        let db = state.conn()?;
        queries::update_workspace(&db, &workspace)?
    };
    if !updated {
        return Err(AppError::NotFound(format!("workspace {id}")));
    }

    tracing::info!(workspace_id = %workspace.id, "workspace updated");
    Ok(Json(workspace))
}

// DELETE /api/workspaces/:id
pub async fn delete_workspace(
    State(state): State<Arc<AppState>>,
    requester: Requester,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let workspace = owned_workspace(&state, &requester, &id)?;

    let deleted = {
        let db = state.conn()?;
        queries::delete_workspace(&db, &workspace.id)?
    };
    if !deleted {
        // Booking history references the workspace and must survive.
        return Err(AppError::Conflict(format!(
            "workspace {id} has bookings and cannot be deleted"
        )));
    }

    tracing::info!(workspace_id = %workspace.id, "workspace deleted");
    Ok(StatusCode::NO_CONTENT)
}

// GET /api/owner/workspaces
pub async fn owner_workspaces(
    State(state): State<Arc<AppState>>,
    requester: Requester,
) -> Result<Json<Vec<Workspace>>, AppError> {
    requester.require_owner()?;
    let workspaces = {
        let db = state.conn()?;
        queries::list_owner_workspaces(&db, requester.id())?
    };
    Ok(Json(workspaces))
}

// GET /api/workspaces/:id/availability?start=..&end=..
#[derive(Deserialize)]
pub struct AvailabilityQuery {
    pub start: String,
    pub end: String,
}

#[derive(Serialize)]
pub struct BusyInterval {
    start_time: NaiveDateTime,
    end_time: NaiveDateTime,
}

#[derive(Serialize)]
pub struct AvailabilityResponse {
    workspace_id: String,
    start_time: NaiveDateTime,
    end_time: NaiveDateTime,
    available: bool,
    conflicts: Vec<BusyInterval>,
}

pub async fn check_availability(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<AvailabilityResponse>, AppError> {
    let start = availability::parse_timestamp(&query.start)?;
    let end = availability::parse_timestamp(&query.end)?;
    let (start, end) = availability::normalize_interval(start, end)?;

    let store = state.bookings.store();
    if store
        .get_workspace(&id)
        .await
        .map_err(BookingError::from)?
        .is_none()
    {
        return Err(AppError::NotFound(format!("workspace {id}")));
    }

    // Only the busy intervals are exposed; who holds them stays private.
    let conflicts: Vec<BusyInterval> =
        availability::conflicting_bookings(store, &id, start, end)
            .await?
            .into_iter()
            .map(|b| BusyInterval {
                start_time: b.start_time,
                end_time: b.end_time,
            })
            .collect();

    Ok(Json(AvailabilityResponse {
        workspace_id: id,
        start_time: start,
        end_time: end,
        available: conflicts.is_empty(),
        conflicts,
    }))
}

// GET /api/workspaces/:id/bookings
#[derive(Deserialize)]
pub struct StatusQuery {
    pub status: Option<String>,
}

impl StatusQuery {
    pub fn parsed(&self) -> Result<Option<BookingStatus>, AppError> {
        match self.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            None => Ok(None),
            Some(raw) => BookingStatus::parse(raw)
                .map(Some)
                .ok_or_else(|| AppError::BadRequest(format!("unknown booking status: {raw}"))),
        }
    }
}

pub async fn workspace_bookings(
    State(state): State<Arc<AppState>>,
    requester: Requester,
    Path(id): Path<String>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<Vec<Booking>>, AppError> {
    let status = query.parsed()?;
    let workspace = owned_workspace(&state, &requester, &id)?;

    let bookings = {
        let db = state.conn()?;
        queries::bookings_for_workspace(&db, &workspace.id, status)?
    };
    Ok(Json(bookings))
}
