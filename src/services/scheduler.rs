use std::sync::Arc;
use std::time::Duration;

use crate::models::ReconcileOutcome;
use crate::services::reconcile::run_reconciliation;
use crate::state::AppState;

/// Runs the reconciliation job every `period`. Ticks run one after another, so
/// this ticker never overlaps itself; failures are logged and the next tick
/// retries.
pub async fn run_ticker(state: Arc<AppState>, period: Duration) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        interval.tick().await;
        match run_reconciliation(state.store.as_ref(), &state.clock).await {
            Ok(ReconcileOutcome::NothingExpired { checked }) => {
                tracing::debug!(checked, "scheduled reconcile: nothing expired");
            }
            Ok(ReconcileOutcome::Reconciled(summary)) => {
                tracing::info!(
                    bookings_updated = summary.bookings_updated,
                    rooms_updated = summary.rooms_updated,
                    "scheduled reconcile finished"
                );
            }
            Err(e) => {
                tracing::error!(error = %e, "scheduled reconcile failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

    use crate::clock::{FixedClock, VenueClock};
    use crate::config::AppConfig;
    use crate::db::{self, queries};
    use crate::models::{Booking, BookingStatus, Room, RoomStatus};
    use crate::services::store::SqliteStore;

    #[tokio::test]
    async fn test_ticker_expires_bookings() {
        let db = Arc::new(Mutex::new(db::init_db(":memory:").unwrap()));
        {
            let conn = db.lock().unwrap();
            let now = NaiveDateTime::parse_from_str("2024-01-10 12:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
            queries::create_room(
                &conn,
                &Room {
                    id: "r1".to_string(),
                    room_number: "1".to_string(),
                    status: RoomStatus::Occupied,
                    current_session_start: Some(now),
                    assigned_staff: None,
                    updated_at: now,
                },
            )
            .unwrap();
            queries::create_booking(
                &conn,
                &Booking {
                    id: "b1".to_string(),
                    room_id: "r1".to_string(),
                    customer_name: None,
                    booking_date: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
                    start_time: NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
                    end_time: NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
                    status: BookingStatus::Confirmed,
                    notes: None,
                    created_at: now,
                    updated_at: now,
                },
            )
            .unwrap();
        }

        let instant = NaiveDateTime::parse_from_str("2024-01-10 14:01:00", "%Y-%m-%d %H:%M:%S")
            .unwrap()
            .and_utc();
        let state = Arc::new(AppState {
            db: db.clone(),
            config: AppConfig {
                port: 0,
                database_url: ":memory:".to_string(),
                venue_utc_offset_minutes: 0,
                reconcile_interval_secs: 60,
            },
            clock: VenueClock::utc(Arc::new(FixedClock::new(instant))),
            store: Arc::new(SqliteStore::new(db.clone())),
        });

        // The first tick fires immediately.
        let handle = tokio::spawn(run_ticker(state, Duration::from_secs(60)));
        tokio::time::sleep(Duration::from_millis(200)).await;
        handle.abort();

        let conn = db.lock().unwrap();
        let booking = queries::get_booking_by_id(&conn, "b1").unwrap().unwrap();
        assert_eq!(booking.status, BookingStatus::Completed);
        assert_eq!(queries::get_room(&conn, "r1").unwrap().unwrap().status, RoomStatus::Available);
    }
}
