use chrono::NaiveDateTime;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};

use crate::models::{Booking, BookingStatus, Profile, UserType, Workspace, WorkspaceFilter};

/// Fixed-width UTC timestamp format. The overlap trigger relies on string
/// order matching time order.
pub const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn format_ts(ts: &NaiveDateTime) -> String {
    ts.format(TS_FORMAT).to_string()
}

fn parse_ts(idx: usize, s: &str) -> rusqlite::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, TS_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn parse_opt_ts(idx: usize, s: Option<String>) -> rusqlite::Result<Option<NaiveDateTime>> {
    s.map(|s| parse_ts(idx, &s)).transpose()
}

// ── Profiles ──

pub fn insert_profile(conn: &Connection, profile: &Profile) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO profiles (id, first_name, last_name, business_name, user_type, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            profile.id,
            profile.first_name,
            profile.last_name,
            profile.business_name,
            profile.user_type.as_str(),
            format_ts(&profile.created_at),
        ],
    )?;
    Ok(())
}

pub fn get_profile(conn: &Connection, id: &str) -> rusqlite::Result<Option<Profile>> {
    conn.query_row(
        "SELECT id, first_name, last_name, business_name, user_type, created_at
         FROM profiles WHERE id = ?1",
        params![id],
        |row| {
            let user_type: String = row.get(4)?;
            let created_at: String = row.get(5)?;
            Ok(Profile {
                id: row.get(0)?,
                first_name: row.get(1)?,
                last_name: row.get(2)?,
                business_name: row.get(3)?,
                user_type: UserType::parse(&user_type),
                created_at: parse_ts(5, &created_at)?,
            })
        },
    )
    .optional()
}

// ── Workspaces ──

const WORKSPACE_COLUMNS: &str = "id, owner_id, name, description, location, category, \
     hourly_rate, daily_rate, monthly_rate, images, created_at";

pub fn insert_workspace(conn: &Connection, workspace: &Workspace) -> rusqlite::Result<()> {
    let images = serde_json::to_string(&workspace.images)
        .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

    conn.execute(
        "INSERT INTO workspaces (id, owner_id, name, description, location, category,
                                 hourly_rate, daily_rate, monthly_rate, images, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            workspace.id,
            workspace.owner_id,
            workspace.name,
            workspace.description,
            workspace.location,
            workspace.category,
            workspace.hourly_rate,
            workspace.daily_rate,
            workspace.monthly_rate,
            images,
            format_ts(&workspace.created_at),
        ],
    )?;
    Ok(())
}

pub fn get_workspace(conn: &Connection, id: &str) -> rusqlite::Result<Option<Workspace>> {
    conn.query_row(
        &format!("SELECT {WORKSPACE_COLUMNS} FROM workspaces WHERE id = ?1"),
        params![id],
        parse_workspace_row,
    )
    .optional()
}

pub fn list_workspaces(
    conn: &Connection,
    filter: &WorkspaceFilter,
) -> rusqlite::Result<Vec<Workspace>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {WORKSPACE_COLUMNS} FROM workspaces
         WHERE (?1 IS NULL OR category = ?1) AND (?2 IS NULL OR location = ?2)
         ORDER BY created_at DESC, name ASC"
    ))?;

    let rows = stmt.query_map(
        params![filter.category, filter.location],
        parse_workspace_row,
    )?;
    rows.collect()
}

pub fn list_owner_workspaces(conn: &Connection, owner_id: &str) -> rusqlite::Result<Vec<Workspace>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {WORKSPACE_COLUMNS} FROM workspaces WHERE owner_id = ?1 ORDER BY name ASC"
    ))?;
    let rows = stmt.query_map(params![owner_id], parse_workspace_row)?;
    rows.collect()
}

/// Rewrites the editable fields of a workspace. Ownership and creation time never change.
pub fn update_workspace(conn: &Connection, workspace: &Workspace) -> rusqlite::Result<bool> {
    let images = serde_json::to_string(&workspace.images)
        .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

    let changed = conn.execute(
        "UPDATE workspaces
         SET name = ?2, description = ?3, location = ?4, category = ?5,
             hourly_rate = ?6, daily_rate = ?7, monthly_rate = ?8, images = ?9
         WHERE id = ?1",
        params![
            workspace.id,
            workspace.name,
            workspace.description,
            workspace.location,
            workspace.category,
            workspace.hourly_rate,
            workspace.daily_rate,
            workspace.monthly_rate,
            images,
        ],
    )?;
    Ok(changed == 1)
}

/// Deletes a workspace that has never been booked. Returns false when the
/// workspace is missing or has booking history.
pub fn delete_workspace(conn: &Connection, id: &str) -> rusqlite::Result<bool> {
    let changed = conn.execute(
        "DELETE FROM workspaces
         WHERE id = ?1 AND NOT EXISTS (SELECT 1 FROM bookings WHERE workspace_id = ?1)",
        params![id],
    )?;
    Ok(changed == 1)
}

fn parse_workspace_row(row: &rusqlite::Row) -> rusqlite::Result<Workspace> {
    let images_json: String = row.get(9)?;
    let images: Vec<String> = serde_json::from_str(&images_json)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(9, Type::Text, Box::new(e)))?;
    let created_at: String = row.get(10)?;

    Ok(Workspace {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        location: row.get(4)?,
        category: row.get(5)?,
        hourly_rate: row.get(6)?,
        daily_rate: row.get(7)?,
        monthly_rate: row.get(8)?,
        images,
        created_at: parse_ts(10, &created_at)?,
    })
}

// ── Bookings ──

const BOOKING_COLUMNS: &str = "id, workspace_id, requester_id, start_time, end_time, status, \
     total_price, payment_reference, check_in_time, created_at, updated_at";

/// Inserts a booking. Overlapping active bookings are rejected by the
/// `bookings_no_overlap_insert` trigger; see [`is_overlap_violation`].
pub fn insert_booking(conn: &Connection, booking: &Booking) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO bookings (id, workspace_id, requester_id, start_time, end_time, status,
                               total_price, payment_reference, check_in_time, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            booking.id,
            booking.workspace_id,
            booking.requester_id,
            format_ts(&booking.start_time),
            format_ts(&booking.end_time),
            booking.status.as_str(),
            booking.total_price,
            booking.payment_reference,
            booking.check_in_time.as_ref().map(format_ts),
            format_ts(&booking.created_at),
            format_ts(&booking.updated_at),
        ],
    )?;
    Ok(())
}

pub fn is_overlap_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(e, Some(msg)) => {
            e.code == rusqlite::ErrorCode::ConstraintViolation && msg.contains("booking_overlap")
        }
        _ => false,
    }
}

pub fn get_booking(conn: &Connection, id: &str) -> rusqlite::Result<Option<Booking>> {
    conn.query_row(
        &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1"),
        params![id],
        parse_booking_row,
    )
    .optional()
}

/// Bookings on a workspace that still hold their slot.
pub fn active_bookings_for_workspace(
    conn: &Connection,
    workspace_id: &str,
) -> rusqlite::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings
         WHERE workspace_id = ?1 AND status IN ('pending', 'confirmed', 'checked_in')
         ORDER BY start_time ASC"
    ))?;
    let rows = stmt.query_map(params![workspace_id], parse_booking_row)?;
    rows.collect()
}

pub fn bookings_for_workspace(
    conn: &Connection,
    workspace_id: &str,
    status: Option<BookingStatus>,
) -> rusqlite::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings
         WHERE workspace_id = ?1 AND (?2 IS NULL OR status = ?2)
         ORDER BY start_time ASC"
    ))?;
    let rows = stmt.query_map(
        params![workspace_id, status.map(|s| s.as_str())],
        parse_booking_row,
    )?;
    rows.collect()
}

pub fn bookings_for_requester(
    conn: &Connection,
    requester_id: &str,
    status: Option<BookingStatus>,
) -> rusqlite::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings
         WHERE requester_id = ?1 AND (?2 IS NULL OR status = ?2)
         ORDER BY start_time DESC"
    ))?;
    let rows = stmt.query_map(
        params![requester_id, status.map(|s| s.as_str())],
        parse_booking_row,
    )?;
    rows.collect()
}

/// Compare-and-set status update. Returns `false` when the row is missing or
/// no longer in `from`, in which case nothing was written.
pub fn transition_booking_status(
    conn: &Connection,
    id: &str,
    from: BookingStatus,
    to: BookingStatus,
    check_in_time: Option<&NaiveDateTime>,
    now: &NaiveDateTime,
) -> rusqlite::Result<bool> {
    let count = conn.execute(
        "UPDATE bookings
         SET status = ?1,
             check_in_time = COALESCE(?2, check_in_time),
             updated_at = ?3
         WHERE id = ?4 AND status = ?5",
        params![
            to.as_str(),
            check_in_time.map(format_ts),
            format_ts(now),
            id,
            from.as_str(),
        ],
    )?;
    Ok(count > 0)
}

fn parse_booking_row(row: &rusqlite::Row) -> rusqlite::Result<Booking> {
    let start_time: String = row.get(3)?;
    let end_time: String = row.get(4)?;
    let status_str: String = row.get(5)?;
    let check_in_time: Option<String> = row.get(8)?;
    let created_at: String = row.get(9)?;
    let updated_at: String = row.get(10)?;

    let status = BookingStatus::parse(&status_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            5,
            Type::Text,
            format!("unknown booking status: {status_str}").into(),
        )
    })?;

    Ok(Booking {
        id: row.get(0)?,
        workspace_id: row.get(1)?,
        requester_id: row.get(2)?,
        start_time: parse_ts(3, &start_time)?,
        end_time: parse_ts(4, &end_time)?,
        status,
        total_price: row.get(6)?,
        payment_reference: row.get(7)?,
        check_in_time: parse_opt_ts(8, check_in_time)?,
        created_at: parse_ts(9, &created_at)?,
        updated_at: parse_ts(10, &updated_at)?,
    })
}
