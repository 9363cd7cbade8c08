use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, params_from_iter, Connection};

use crate::models::booking::parse_time;
use crate::models::{Booking, BookingStatus, Room, RoomStatus};

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const BOOKING_COLUMNS: &str =
    "id, room_id, customer_name, booking_date, start_time, end_time, status, notes, created_at, updated_at";

const ROOM_COLUMNS: &str = "id, room_number, status, current_session_start, assigned_staff, updated_at";

/// Upper bound on ids bound into one UPDATE, well under SQLite's variable limit.
pub const COMPLETE_CHUNK_SIZE: usize = 500;

// All timestamps are venue-local wall-clock time supplied by the caller.
fn timestamp(t: NaiveDateTime) -> String {
    t.format(TIMESTAMP_FORMAT).to_string()
}

fn parse_timestamp(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT).unwrap_or_default()
}

// Status values come from the enums' static names, never from user input.
fn status_list<'a>(statuses: impl IntoIterator<Item = &'a str>) -> String {
    statuses
        .into_iter()
        .map(|s| format!("'{s}'"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn active_statuses() -> String {
    status_list(BookingStatus::ACTIVE.iter().map(|s| s.as_str()))
}

// ── Rooms ──

pub fn create_room(conn: &Connection, room: &Room) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO rooms (id, room_number, status, current_session_start, assigned_staff, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            room.id,
            room.room_number,
            room.status.as_str(),
            room.current_session_start.map(timestamp),
            room.assigned_staff,
            timestamp(room.updated_at),
        ],
    )?;
    Ok(())
}

pub fn get_room(conn: &Connection, id: &str) -> anyhow::Result<Option<Room>> {
    let result = conn.query_row(
        &format!("SELECT {ROOM_COLUMNS} FROM rooms WHERE id = ?1"),
        params![id],
        |row| Ok(parse_room_row(row)),
    );

    match result {
        Ok(room) => Ok(Some(room?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_rooms(conn: &Connection) -> anyhow::Result<Vec<Room>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ROOM_COLUMNS} FROM rooms ORDER BY room_number ASC"
    ))?;
    let rows = stmt.query_map([], |row| Ok(parse_room_row(row)))?;

    let mut rooms = vec![];
    for row in rows {
        rooms.push(row??);
    }
    Ok(rooms)
}

/// Compare-and-set on room status: applies only while the room is in one of
/// `expected`. Returns whether a row changed.
///
/// Moving to `Available` always clears the session marker; other targets
/// store `session_start` as given.
pub fn transition_room(
    conn: &Connection,
    id: &str,
    expected: &[RoomStatus],
    to: RoomStatus,
    session_start: Option<NaiveDateTime>,
    now: NaiveDateTime,
) -> anyhow::Result<bool> {
    if expected.is_empty() {
        return Ok(false);
    }
    let session_start = match to {
        RoomStatus::Available => None,
        _ => session_start.map(timestamp),
    };
    let sql = format!(
        "UPDATE rooms SET status = ?1, current_session_start = ?2, updated_at = ?3
         WHERE id = ?4 AND status IN ({})",
        status_list(expected.iter().map(|s| s.as_str()))
    );
    let count = conn.execute(
        &sql,
        params![to.as_str(), session_start, timestamp(now), id],
    )?;
    Ok(count > 0)
}

/// Frees an occupied room. Zero rows changed means the room had already left
/// `occupied`, which is not an error.
pub fn release_occupied_room(conn: &Connection, id: &str, now: NaiveDateTime) -> anyhow::Result<bool> {
    transition_room(conn, id, &[RoomStatus::Occupied], RoomStatus::Available, None, now)
}

/// Frees a room held `reserved` by bookings that ended without a check-in.
pub fn clear_lapsed_reservation(conn: &Connection, id: &str, now: NaiveDateTime) -> anyhow::Result<bool> {
    transition_room(conn, id, &[RoomStatus::Reserved], RoomStatus::Available, None, now)
}

fn parse_room_row(row: &rusqlite::Row) -> anyhow::Result<Room> {
    let id: String = row.get(0)?;
    let room_number: String = row.get(1)?;
    let status_str: String = row.get(2)?;
    let session_start_str: Option<String> = row.get(3)?;
    let assigned_staff: Option<String> = row.get(4)?;
    let updated_at_str: String = row.get(5)?;

    let current_session_start = session_start_str
        .as_deref()
        .and_then(|s| NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT).ok());
    let updated_at = parse_timestamp(&updated_at_str);

    Ok(Room {
        id,
        room_number,
        status: RoomStatus::parse(&status_str),
        current_session_start,
        assigned_staff,
        updated_at,
    })
}

// ── Bookings ──

pub fn create_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO bookings ({BOOKING_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"
        ),
        params![
            booking.id,
            booking.room_id,
            booking.customer_name,
            booking.booking_date.format(DATE_FORMAT).to_string(),
            booking.start_time.format(TIME_FORMAT).to_string(),
            booking.end_time.format(TIME_FORMAT).to_string(),
            booking.status.as_str(),
            booking.notes,
            timestamp(booking.created_at),
            timestamp(booking.updated_at),
        ],
    )?;
    Ok(())
}

pub fn get_booking_by_id(conn: &Connection, id: &str) -> anyhow::Result<Option<Booking>> {
    let result = conn.query_row(
        &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1"),
        params![id],
        |row| Ok(parse_booking_row(row)),
    );

    match result {
        Ok(booking) => Ok(Some(booking?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_bookings(
    conn: &Connection,
    status_filter: Option<BookingStatus>,
    date_filter: Option<NaiveDate>,
    limit: i64,
) -> anyhow::Result<Vec<Booking>> {
    let mut clauses = vec![];
    let mut values: Vec<String> = vec![];
    if let Some(status) = status_filter {
        values.push(status.as_str().to_string());
        clauses.push(format!("status = ?{}", values.len()));
    }
    if let Some(date) = date_filter {
        values.push(date.format(DATE_FORMAT).to_string());
        clauses.push(format!("booking_date = ?{}", values.len()));
    }
    let where_sql = if clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", clauses.join(" AND "))
    };
    let sql = format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings {where_sql}
         ORDER BY booking_date DESC, start_time DESC LIMIT {}",
        limit.max(0)
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(values.iter()), |row| {
        Ok(parse_booking_row(row))
    })?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

/// Active bookings dated on or before `today`. Over-selects same-day bookings
/// that have not ended yet; callers compare end instants themselves.
pub fn get_expiry_candidates(conn: &Connection, today: NaiveDate) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings
         WHERE status IN ({}) AND booking_date <= ?1
         ORDER BY booking_date ASC, end_time ASC",
        active_statuses()
    ))?;

    let rows = stmt.query_map(params![today.format(DATE_FORMAT).to_string()], |row| {
        Ok(parse_booking_row(row))
    })?;

    // A corrupt row must not stall expiry for everything else.
    let mut bookings = vec![];
    for row in rows {
        match row? {
            Ok(booking) => bookings.push(booking),
            Err(e) => tracing::warn!(error = %e, "skipping unparseable booking"),
        }
    }
    Ok(bookings)
}

/// Active bookings for one room on one date, used for overlap checks.
pub fn get_active_bookings_for_room_on(
    conn: &Connection,
    room_id: &str,
    date: NaiveDate,
) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings
         WHERE room_id = ?1 AND booking_date = ?2 AND status IN ({})
         ORDER BY start_time ASC",
        active_statuses()
    ))?;

    let rows = stmt.query_map(
        params![room_id, date.format(DATE_FORMAT).to_string()],
        |row| Ok(parse_booking_row(row)),
    )?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

pub fn has_active_booking_from(
    conn: &Connection,
    room_id: &str,
    from_date: NaiveDate,
) -> anyhow::Result<bool> {
    let count: i64 = conn.query_row(
        &format!(
            "SELECT COUNT(*) FROM bookings
             WHERE room_id = ?1 AND booking_date >= ?2 AND status IN ({})",
            active_statuses()
        ),
        params![room_id, from_date.format(DATE_FORMAT).to_string()],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Marks the given bookings completed in one transaction, binding at most
/// [`COMPLETE_CHUNK_SIZE`] ids per statement. Rows that already left
/// pending/confirmed are skipped, so the count can be lower than `ids`.
pub fn mark_bookings_completed(
    conn: &mut Connection,
    ids: &[String],
    now: NaiveDateTime,
) -> anyhow::Result<usize> {
    if ids.is_empty() {
        return Ok(0);
    }

    let now = timestamp(now);
    let tx = conn.transaction()?;
    let mut count = 0;
    for chunk in ids.chunks(COMPLETE_CHUNK_SIZE) {
        let placeholders = (0..chunk.len())
            .map(|i| format!("?{}", i + 2))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE bookings SET status = '{}', updated_at = ?1
             WHERE id IN ({placeholders}) AND status IN ({})",
            BookingStatus::Completed.as_str(),
            active_statuses()
        );

        let mut values: Vec<&str> = Vec::with_capacity(chunk.len() + 1);
        values.push(&now);
        values.extend(chunk.iter().map(String::as_str));

        count += tx.execute(&sql, params_from_iter(values))?;
    }
    tx.commit()?;
    Ok(count)
}

/// Guarded booking status change: applies only from one of `expected`.
pub fn transition_booking(
    conn: &Connection,
    id: &str,
    expected: &[BookingStatus],
    to: BookingStatus,
    now: NaiveDateTime,
) -> anyhow::Result<bool> {
    if expected.is_empty() {
        return Ok(false);
    }
    let sql = format!(
        "UPDATE bookings SET status = ?1, updated_at = ?2 WHERE id = ?3 AND status IN ({})",
        status_list(expected.iter().map(|s| s.as_str()))
    );
    let count = conn.execute(&sql, params![to.as_str(), timestamp(now), id])?;
    Ok(count > 0)
}

fn parse_booking_row(row: &rusqlite::Row) -> anyhow::Result<Booking> {
    let id: String = row.get(0)?;
    let room_id: String = row.get(1)?;
    let customer_name: Option<String> = row.get(2)?;
    let booking_date_str: String = row.get(3)?;
    let start_time_str: String = row.get(4)?;
    let end_time_str: String = row.get(5)?;
    let status_str: String = row.get(6)?;
    let notes: Option<String> = row.get(7)?;
    let created_at_str: String = row.get(8)?;
    let updated_at_str: String = row.get(9)?;

    let booking_date = NaiveDate::parse_from_str(&booking_date_str, DATE_FORMAT)
        .map_err(|e| anyhow::anyhow!("booking {id} has invalid date {booking_date_str:?}: {e}"))?;
    let start_time = parse_time(&start_time_str)
        .ok_or_else(|| anyhow::anyhow!("booking {id} has invalid start time {start_time_str:?}"))?;
    let end_time = parse_time(&end_time_str)
        .ok_or_else(|| anyhow::anyhow!("booking {id} has invalid end time {end_time_str:?}"))?;
    let created_at = parse_timestamp(&created_at_str);
    let updated_at = parse_timestamp(&updated_at_str);

    Ok(Booking {
        id,
        room_id,
        customer_name,
        booking_date,
        start_time,
        end_time,
        status: BookingStatus::parse(&status_str),
        notes,
        created_at,
        updated_at,
    })
}
