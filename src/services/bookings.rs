use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rusqlite::Connection;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Booking, BookingStatus, Room, RoomStatus};

#[derive(Debug, Clone)]
pub struct NewBooking {
    pub room_id: String,
    pub booking_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub customer_name: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewRoom {
    pub room_number: String,
    pub assigned_staff: Option<String>,
}

pub fn create_room(conn: &Connection, new: NewRoom, now: NaiveDateTime) -> Result<Room, AppError> {
    let room_number = new.room_number.trim().to_string();
    if room_number.is_empty() {
        return Err(AppError::Validation("room_number must not be empty".to_string()));
    }

    let room = Room {
        id: uuid::Uuid::new_v4().to_string(),
        room_number,
        status: RoomStatus::Available,
        current_session_start: None,
        assigned_staff: new.assigned_staff,
        updated_at: now,
    };
    queries::create_room(conn, &room)?;
    tracing::info!(room_id = %room.id, room_number = %room.room_number, "room created");
    Ok(room)
}

/// Creates a pending booking and marks an idle room reserved.
pub fn create_booking(
    conn: &Connection,
    new: NewBooking,
    now: NaiveDateTime,
) -> Result<Booking, AppError> {
    if new.end_time <= new.start_time {
        return Err(AppError::Validation(
            "end_time must be later than start_time on the same date".to_string(),
        ));
    }
    if new.booking_date.and_time(new.end_time) <= now {
        return Err(AppError::Validation("booking window has already ended".to_string()));
    }

    if queries::get_room(conn, &new.room_id)?.is_none() {
        return Err(AppError::NotFound(format!("room {}", new.room_id)));
    }

    let existing = queries::get_active_bookings_for_room_on(conn, &new.room_id, new.booking_date)?;
    if let Some(clash) = existing
        .iter()
        .find(|b| b.overlaps(new.booking_date, new.start_time, new.end_time))
    {
        return Err(AppError::Conflict(format!(
            "room is already booked {}-{} by booking {}",
            clash.start_time.format("%H:%M"),
            clash.end_time.format("%H:%M"),
            clash.id
        )));
    }

    let booking = Booking {
        id: uuid::Uuid::new_v4().to_string(),
        room_id: new.room_id,
        customer_name: new.customer_name,
        booking_date: new.booking_date,
        start_time: new.start_time,
        end_time: new.end_time,
        status: BookingStatus::Pending,
        notes: new.notes,
        created_at: now,
        updated_at: now,
    };
    queries::create_booking(conn, &booking)?;

    queries::transition_room(
        conn,
        &booking.room_id,
        &[RoomStatus::Available],
        RoomStatus::Reserved,
        None,
        now,
    )?;

    tracing::info!(booking_id = %booking.id, room_id = %booking.room_id, "booking created");
    Ok(booking)
}

pub fn confirm_booking(conn: &Connection, id: &str, now: NaiveDateTime) -> Result<Booking, AppError> {
    let booking = load_booking(conn, id)?;
    if !queries::transition_booking(conn, id, &[BookingStatus::Pending], BookingStatus::Confirmed, now)? {
        return Err(AppError::Conflict(format!(
            "booking {id} is {} and cannot be confirmed",
            booking.status.as_str()
        )));
    }
    load_booking(conn, id)
}

/// Starts the session for an active booking: the booking is confirmed and its
/// room becomes occupied from `now`.
pub fn check_in(conn: &Connection, id: &str, now: NaiveDateTime) -> Result<(Booking, Room), AppError> {
    let booking = load_booking(conn, id)?;
    if booking.status.is_terminal() {
        return Err(AppError::Conflict(format!(
            "booking {id} is {} and cannot be checked in",
            booking.status.as_str()
        )));
    }

    let occupied = queries::transition_room(
        conn,
        &booking.room_id,
        &[RoomStatus::Available, RoomStatus::Reserved],
        RoomStatus::Occupied,
        Some(now),
        now,
    )?;
    if !occupied {
        return Err(AppError::Conflict(format!(
            "room {} is not free for check-in",
            booking.room_id
        )));
    }

    queries::transition_booking(
        conn,
        id,
        &[BookingStatus::Pending],
        BookingStatus::Confirmed,
        now,
    )?;

    let room = queries::get_room(conn, &booking.room_id)?
        .ok_or_else(|| AppError::NotFound(format!("room {}", booking.room_id)))?;
    tracing::info!(booking_id = %id, room_id = %room.id, "checked in");
    Ok((load_booking(conn, id)?, room))
}

/// Cancels an active booking and frees its room when nothing else claims it
/// from `now`'s date on.
pub fn cancel_booking(conn: &Connection, id: &str, now: NaiveDateTime) -> Result<Booking, AppError> {
    let booking = load_booking(conn, id)?;
    let already_final = || {
        AppError::Conflict(format!("booking {id} is already {}", booking.status.as_str()))
    };
    if booking.status.is_terminal() {
        return Err(already_final());
    }
    // Guarded again in case a concurrent writer finished it first.
    if !queries::transition_booking(conn, id, &BookingStatus::ACTIVE, BookingStatus::Cancelled, now)? {
        return Err(already_final());
    }

    if !queries::has_active_booking_from(conn, &booking.room_id, now.date())? {
        let released = queries::transition_room(
            conn,
            &booking.room_id,
            &[RoomStatus::Reserved, RoomStatus::Occupied],
            RoomStatus::Available,
            None,
            now,
        )?;
        if released {
            tracing::info!(room_id = %booking.room_id, "room released after cancellation");
        }
    }

    tracing::info!(booking_id = %id, "booking cancelled");
    load_booking(conn, id)
}

fn load_booking(conn: &Connection, id: &str) -> Result<Booking, AppError> {
    queries::get_booking_by_id(conn, id)?.ok_or_else(|| AppError::NotFound(format!("booking {id}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn setup_db() -> Connection {
        db::init_db(":memory:").unwrap()
    }

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    fn t(s: &str) -> NaiveTime {
        NaiveTime::parse_from_str(s, "%H:%M").unwrap()
    }

    fn new_booking(room_id: &str, start: &str, end: &str) -> NewBooking {
        NewBooking {
            room_id: room_id.to_string(),
            booking_date: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            start_time: t(start),
            end_time: t(end),
            customer_name: Some("Alice".to_string()),
            notes: None,
        }
    }

    fn add_room(conn: &Connection) -> Room {
        create_room(
            conn,
            NewRoom {
                room_number: "VIP 1".to_string(),
                assigned_staff: None,
            },
            dt("2024-01-10 08:00"),
        )
        .unwrap()
    }

    #[test]
    fn test_create_booking_reserves_room() {
        let conn = setup_db();
        let room = add_room(&conn);

        let booking = create_booking(&conn, new_booking(&room.id, "18:00", "20:00"), dt("2024-01-10 09:00")).unwrap();
        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(queries::get_room(&conn, &room.id).unwrap().unwrap().status, RoomStatus::Reserved);
    }

    #[test]
    fn test_create_booking_rejects_overlap() {
        let conn = setup_db();
        let room = add_room(&conn);
        create_booking(&conn, new_booking(&room.id, "18:00", "20:00"), dt("2024-01-10 09:00")).unwrap();

        let err = create_booking(&conn, new_booking(&room.id, "19:00", "21:00"), dt("2024-01-10 09:00")).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        // Back-to-back is fine.
        assert!(create_booking(&conn, new_booking(&room.id, "20:00", "22:00"), dt("2024-01-10 09:00")).is_ok());
    }

    #[test]
    fn test_create_booking_validation() {
        let conn = setup_db();
        let room = add_room(&conn);

        let backwards = create_booking(&conn, new_booking(&room.id, "20:00", "18:00"), dt("2024-01-10 09:00"));
        assert!(matches!(backwards, Err(AppError::Validation(_))));

        let ended = create_booking(&conn, new_booking(&room.id, "07:00", "08:00"), dt("2024-01-10 09:00"));
        assert!(matches!(ended, Err(AppError::Validation(_))));

        let no_room = create_booking(&conn, new_booking("missing", "18:00", "20:00"), dt("2024-01-10 09:00"));
        assert!(matches!(no_room, Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_confirm_only_from_pending() {
        let conn = setup_db();
        let room = add_room(&conn);
        let booking = create_booking(&conn, new_booking(&room.id, "18:00", "20:00"), dt("2024-01-10 09:00")).unwrap();

        let now = dt("2024-01-10 10:00");
        let confirmed = confirm_booking(&conn, &booking.id, now).unwrap();
        assert_eq!(confirmed.status, BookingStatus::Confirmed);
        assert_eq!(confirmed.updated_at, now);
        assert!(matches!(confirm_booking(&conn, &booking.id, now), Err(AppError::Conflict(_))));
        assert!(matches!(confirm_booking(&conn, "missing", now), Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_check_in_occupies_room() {
        let conn = setup_db();
        let room = add_room(&conn);
        let booking = create_booking(&conn, new_booking(&room.id, "18:00", "20:00"), dt("2024-01-10 09:00")).unwrap();

        let (booking, room) = check_in(&conn, &booking.id, dt("2024-01-10 18:02")).unwrap();
        assert_eq!(booking.status, BookingStatus::Confirmed);
        assert_eq!(room.status, RoomStatus::Occupied);
        assert_eq!(room.current_session_start, Some(dt("2024-01-10 18:02")));

        // Room is busy now.
        assert!(matches!(
            check_in(&conn, &booking.id, dt("2024-01-10 18:05")),
            Err(AppError::Conflict(_))
        ));
    }

    #[test]
    fn test_cancel_releases_room_when_unclaimed() {
        let conn = setup_db();
        let room = add_room(&conn);
        let first = create_booking(&conn, new_booking(&room.id, "18:00", "20:00"), dt("2024-01-10 09:00")).unwrap();
        let second = create_booking(&conn, new_booking(&room.id, "20:00", "22:00"), dt("2024-01-10 09:00")).unwrap();
        let now = dt("2024-01-10 10:00");

        cancel_booking(&conn, &first.id, now).unwrap();
        assert_eq!(queries::get_room(&conn, &room.id).unwrap().unwrap().status, RoomStatus::Reserved);

        let cancelled = cancel_booking(&conn, &second.id, now).unwrap();
        assert_eq!(cancelled.status, BookingStatus::Cancelled);
        let freed = queries::get_room(&conn, &room.id).unwrap().unwrap();
        assert_eq!(freed.status, RoomStatus::Available);

        assert!(matches!(cancel_booking(&conn, &second.id, now), Err(AppError::Conflict(_))));
    }

    #[test]
    fn test_terminal_bookings_cannot_check_in_or_cancel() {
        let conn = setup_db();
        let room = add_room(&conn);
        let booking = create_booking(&conn, new_booking(&room.id, "18:00", "20:00"), dt("2024-01-10 09:00")).unwrap();
        let mut conn = conn;
        queries::mark_bookings_completed(&mut conn, &[booking.id.clone()], dt("2024-01-10 20:01")).unwrap();

        let check_in_err = check_in(&conn, &booking.id, dt("2024-01-10 20:05")).unwrap_err();
        assert!(matches!(check_in_err, AppError::Conflict(ref m) if m.contains("completed")));
        assert_eq!(queries::get_room(&conn, &room.id).unwrap().unwrap().status, RoomStatus::Reserved);

        let cancel_err = cancel_booking(&conn, &booking.id, dt("2024-01-10 20:05")).unwrap_err();
        assert!(matches!(cancel_err, AppError::Conflict(ref m) if m.contains("already completed")));
    }
}
