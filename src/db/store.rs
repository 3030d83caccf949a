use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use rusqlite::Connection;

use super::queries;
use crate::errors::BookingError;
use crate::models::{Booking, BookingStatus, Workspace};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store's exclusion constraint rejected an overlapping active booking.
    #[error("overlapping booking rejected by store")]
    Overlap,

    #[error("{0}")]
    Unavailable(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        if queries::is_overlap_violation(&e) {
            StoreError::Overlap
        } else {
            StoreError::Unavailable(e.to_string())
        }
    }
}

impl From<StoreError> for BookingError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Overlap => BookingError::Conflict,
            StoreError::Unavailable(msg) => BookingError::StoreUnavailable(msg),
        }
    }
}

/// The durable primitives the booking core depends on: filtered reads,
/// a constraint-checked insert and a conditional status update.
#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn get_workspace(&self, id: &str) -> Result<Option<Workspace>, StoreError>;

    async fn get_booking(&self, id: &str) -> Result<Option<Booking>, StoreError>;

    /// Pending, confirmed and checked-in bookings of a workspace.
    async fn active_bookings_for_workspace(
        &self,
        workspace_id: &str,
    ) -> Result<Vec<Booking>, StoreError>;

    /// Must fail with [`StoreError::Overlap`] if the row would overlap an
    /// active booking on the same workspace.
    async fn insert_booking(&self, booking: &Booking) -> Result<(), StoreError>;

    /// Moves `id` from `from` to `to` only if it is still in `from`.
    async fn transition_status(
        &self,
        id: &str,
        from: BookingStatus,
        to: BookingStatus,
        check_in_time: Option<NaiveDateTime>,
        now: NaiveDateTime,
    ) -> Result<bool, StoreError>;
}

// Lifecycle of one store call, shared between the caller and the blocking task.
const QUEUED: u8 = 0;
const RUNNING: u8 = 1;
const ABANDONED: u8 = 2;

pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    timeout: Duration,
}

impl SqliteStore {
    pub fn new(conn: Arc<Mutex<Connection>>, timeout: Duration) -> Self {
        Self { conn, timeout }
    }

    /// Runs `f` on the blocking pool, bounded by the store timeout.
    ///
    /// A call that times out while still waiting for the connection is
    /// abandoned and never touches the database. A call that already holds
    /// the connection when the timeout fires is awaited to completion (it is
    /// bounded by the connection's `busy_timeout`) and its real result is
    /// returned, so `Unavailable` always means nothing was written.
    async fn call<T, F>(&self, op: &'static str, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        let phase = Arc::new(AtomicU8::new(QUEUED));
        let task_phase = Arc::clone(&phase);

        let mut task = tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|_| StoreError::Unavailable("database lock poisoned".to_string()))?;
            if task_phase
                .compare_exchange(QUEUED, RUNNING, Ordering::SeqCst, Ordering::SeqCst)
                .is_err()
            {
                return Err(StoreError::Unavailable(format!("{op} abandoned")));
            }
            f(&conn).map_err(StoreError::from)
        });

        let joined = match tokio::time::timeout(self.timeout, &mut task).await {
            Ok(joined) => joined,
            Err(_) => {
                let abandoned = phase
                    .compare_exchange(QUEUED, ABANDONED, Ordering::SeqCst, Ordering::SeqCst)
                    .is_ok();
                if abandoned {
                    tracing::warn!(op, timeout_ms = self.timeout.as_millis() as u64, "store call timed out");
                    return Err(StoreError::Unavailable(format!("{op} timed out")));
                }
                tracing::warn!(op, "store call overran its timeout, waiting for the result");
                task.await
            }
        };

        match joined {
            Ok(result) => result,
            Err(e) => Err(StoreError::Unavailable(format!("{op} task failed: {e}"))),
        }
    }
}

#[async_trait]
impl BookingStore for SqliteStore {
    async fn get_workspace(&self, id: &str) -> Result<Option<Workspace>, StoreError> {
        let id = id.to_string();
        self.call("get_workspace", move |conn| queries::get_workspace(conn, &id))
            .await
    }

    async fn get_booking(&self, id: &str) -> Result<Option<Booking>, StoreError> {
        let id = id.to_string();
        self.call("get_booking", move |conn| queries::get_booking(conn, &id))
            .await
    }

    async fn active_bookings_for_workspace(
        &self,
        workspace_id: &str,
    ) -> Result<Vec<Booking>, StoreError> {
        let workspace_id = workspace_id.to_string();
        self.call("active_bookings_for_workspace", move |conn| {
            queries::active_bookings_for_workspace(conn, &workspace_id)
        })
        .await
    }

    async fn insert_booking(&self, booking: &Booking) -> Result<(), StoreError> {
        let booking = booking.clone();
        self.call("insert_booking", move |conn| {
            queries::insert_booking(conn, &booking)
        })
        .await
    }

    async fn transition_status(
        &self,
        id: &str,
        from: BookingStatus,
        to: BookingStatus,
        check_in_time: Option<NaiveDateTime>,
        now: NaiveDateTime,
    ) -> Result<bool, StoreError> {
        let id = id.to_string();
        self.call("transition_status", move |conn| {
            queries::transition_booking_status(conn, &id, from, to, check_in_time.as_ref(), &now)
        })
        .await
    }
}
