use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::Connection;

use crate::db::queries;
use crate::models::Booking;

/// Storage operations the reconciliation job needs. Write methods stamp
/// `updated_at` with the venue-local `now` they are given.
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Active bookings dated on or before `today`.
    async fn expiry_candidates(&self, today: NaiveDate) -> anyhow::Result<Vec<Booking>>;

    /// Batch-marks bookings completed; returns how many rows changed.
    async fn mark_completed(&self, booking_ids: &[String], now: NaiveDateTime) -> anyhow::Result<usize>;

    /// Whether any active booking dated `from` or later still claims the room.
    async fn has_active_booking(&self, room_id: &str, from: NaiveDate) -> anyhow::Result<bool>;

    /// Moves the room to available only if it is currently occupied.
    async fn release_room(&self, room_id: &str, now: NaiveDateTime) -> anyhow::Result<bool>;

    /// Moves the room to available only if it is currently reserved.
    async fn clear_reservation(&self, room_id: &str, now: NaiveDateTime) -> anyhow::Result<bool>;
}

pub struct SqliteStore {
    db: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn new(db: Arc<Mutex<Connection>>) -> Self {
        Self { db }
    }

    fn conn(&self) -> anyhow::Result<MutexGuard<'_, Connection>> {
        self.db
            .lock()
            .map_err(|_| anyhow::anyhow!("database lock poisoned"))
    }
}

#[async_trait]
impl BookingStore for SqliteStore {
    async fn expiry_candidates(&self, today: NaiveDate) -> anyhow::Result<Vec<Booking>> {
        let conn = self.conn()?;
        queries::get_expiry_candidates(&conn, today)
    }

    async fn mark_completed(&self, booking_ids: &[String], now: NaiveDateTime) -> anyhow::Result<usize> {
        let mut conn = self.conn()?;
        queries::mark_bookings_completed(&mut conn, booking_ids, now)
    }

    async fn has_active_booking(&self, room_id: &str, from: NaiveDate) -> anyhow::Result<bool> {
        let conn = self.conn()?;
        queries::has_active_booking_from(&conn, room_id, from)
    }

    async fn release_room(&self, room_id: &str, now: NaiveDateTime) -> anyhow::Result<bool> {
        let conn = self.conn()?;
        queries::release_occupied_room(&conn, room_id, now)
    }

    async fn clear_reservation(&self, room_id: &str, now: NaiveDateTime) -> anyhow::Result<bool> {
        let conn = self.conn()?;
        queries::clear_lapsed_reservation(&conn, room_id, now)
    }
}
