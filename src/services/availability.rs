use chrono::{NaiveDateTime, SubsecRound};

use crate::db::BookingStore;
use crate::errors::BookingError;
use crate::models::Booking;

/// Half-open interval overlap. Intervals that only touch (`a_end == b_start`)
/// do not overlap, so back-to-back bookings are legal.
pub fn overlaps(
    a_start: &NaiveDateTime,
    a_end: &NaiveDateTime,
    b_start: &NaiveDateTime,
    b_end: &NaiveDateTime,
) -> bool {
    a_start < b_end && a_end > b_start
}

/// Truncates both ends to whole seconds (the store's precision) and checks
/// `start < end`.
pub fn normalize_interval(
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> Result<(NaiveDateTime, NaiveDateTime), BookingError> {
    let start = start.trunc_subsecs(0);
    let end = end.trunc_subsecs(0);
    if start >= end {
        return Err(BookingError::InvalidInterval(format!(
            "start {start} must be before end {end}"
        )));
    }
    Ok((start, end))
}

/// Parses a client timestamp: RFC 3339 (any offset, converted to UTC) or a
/// naive `YYYY-MM-DD HH:MM[:SS]` / `YYYY-MM-DDTHH:MM[:SS]` taken as UTC.
pub fn parse_timestamp(s: &str) -> Result<NaiveDateTime, BookingError> {
    let s = s.trim();
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Ok(dt.naive_utc());
    }
    const FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .ok_or_else(|| BookingError::InvalidInterval(format!("malformed timestamp: {s:?}")))
}

/// Active bookings that overlap the candidate interval.
pub fn find_conflicts<'a>(
    existing: &'a [Booking],
    start: &NaiveDateTime,
    end: &NaiveDateTime,
) -> Vec<&'a Booking> {
    existing
        .iter()
        .filter(|b| b.is_active() && overlaps(&b.start_time, &b.end_time, start, end))
        .collect()
}

/// Reads the workspace's current bookings and returns the ones that would
/// conflict with `[start, end)`. Read-only; never retries.
pub async fn conflicting_bookings(
    store: &dyn BookingStore,
    workspace_id: &str,
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> Result<Vec<Booking>, BookingError> {
    let (start, end) = normalize_interval(start, end)?;
    let existing = store.active_bookings_for_workspace(workspace_id).await?;
    Ok(find_conflicts(&existing, &start, &end)
        .into_iter()
        .cloned()
        .collect())
}

pub async fn is_available(
    store: &dyn BookingStore,
    workspace_id: &str,
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> Result<bool, BookingError> {
    Ok(conflicting_bookings(store, workspace_id, start, end)
        .await?
        .is_empty())
}
