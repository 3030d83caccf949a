use std::collections::HashSet;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::response::sse::{Event, Sse};
use chrono::Utc;
use serde::Deserialize;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::{BroadcastStream, IntervalStream};
use tokio_stream::StreamExt;

use crate::db::queries;
use crate::errors::AppError;
use crate::handlers::auth::authenticate;
use crate::state::AppState;

// GET /api/owner/events?token=..
#[derive(Deserialize)]
pub struct OwnerEventsQuery {
    pub token: Option<String>,
}

fn sse_event(name: &str, payload: &impl serde::Serialize) -> Event {
    let data = serde_json::to_string(payload).unwrap_or_default();
    Event::default().event(name).data(data)
}

/// Live booking feed for an owner's workspaces. Opens with the bookings that
/// currently hold a slot, then streams every change.
pub async fn events_stream(
    State(state): State<Arc<AppState>>,
    Query(query): Query<OwnerEventsQuery>,
) -> Result<Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>>, AppError> {
    // EventSource can't set headers, so the session token rides in the query.
    let token = query.token.as_deref().unwrap_or("");
    let owner = authenticate(&state, token)?;
    owner.require_owner()?;

    // Subscribe before the snapshot read so nothing committed in between is lost.
    let rx = state.bookings.subscribe();
    let now = Utc::now().naive_utc();

    let (workspace_ids, snapshot) = {
        let db = state.conn()?;
        let workspaces = queries::list_owner_workspaces(&db, owner.id())?;
        let mut snapshot = Vec::new();
        for workspace in &workspaces {
            snapshot.extend(
                queries::active_bookings_for_workspace(&db, &workspace.id)?
                    .into_iter()
                    .filter(|b| b.end_time > now),
            );
        }
        let ids: HashSet<String> = workspaces.into_iter().map(|w| w.id).collect();
        (ids, snapshot)
    };

    tracing::info!(
        owner_id = %owner.id(),
        workspaces = workspace_ids.len(),
        "owner subscribed to booking events"
    );

    let snapshot_stream = tokio_stream::iter(
        snapshot
            .into_iter()
            .map(|booking| Ok::<_, Infallible>(sse_event("booking_snapshot", &booking))),
    );

    let live_stream = BroadcastStream::new(rx).filter_map(move |result| match result {
        Ok(event) if workspace_ids.contains(&event.booking.workspace_id) => {
            Some(Ok(sse_event("booking_event", &event)))
        }
        Ok(_) => None,
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            tracing::warn!(skipped, "owner event stream lagged");
            None
        }
    });

    let keepalive_stream = IntervalStream::new(tokio::time::interval(Duration::from_secs(30)))
        .map(|_| Ok(Event::default().comment("keepalive")));

    Ok(Sse::new(snapshot_stream.chain(live_stream).merge(keepalive_stream)))
}
