//! Booking expiry and room reconciliation.
//!
//! A run scans active bookings dated today or earlier, keeps the ones whose
//! end instant has passed, marks them completed in one batch, then frees each
//! affected room that no other active booking still claims. An `occupied`
//! room is released; a room still `reserved` belonged to a no-show and has
//! its reservation cleared.
//!
//! Room release is check-then-act: a booking created between the claim check
//! and the guarded update can still find its room freed. The updates only
//! apply to rooms still in the expected status, so the worst case is a missed
//! or premature release, never a double one. Runs take no lock; overlapping
//! runs converge because every write is conditional on current status.

use chrono::NaiveDateTime;

use crate::clock::VenueClock;
use crate::models::{
    Booking, ExpiredSet, ReconcileOutcome, ReconcileSummary, ReleaseOutcome, RoomRelease,
};
use crate::services::store::BookingStore;

#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("failed to scan for expired bookings: {0:#}")]
    Scan(anyhow::Error),

    #[error("failed to mark expired bookings completed: {0:#}")]
    Transition(anyhow::Error),
}

/// Splits out the candidates whose window closed strictly before `now`.
pub fn classify_expired(candidates: &[Booking], now: NaiveDateTime) -> ExpiredSet {
    let mut expired = ExpiredSet::default();
    for booking in candidates.iter().filter(|b| b.is_expired_at(now)) {
        expired.booking_ids.push(booking.id.clone());
        expired.room_ids.push(booking.room_id.clone());
    }
    expired
}

pub async fn run_reconciliation(
    store: &dyn BookingStore,
    clock: &VenueClock,
) -> Result<ReconcileOutcome, ReconcileError> {
    let now = clock.now_local();
    let today = now.date();

    let candidates = store
        .expiry_candidates(today)
        .await
        .map_err(ReconcileError::Scan)?;
    let checked = candidates.len();

    let expired = classify_expired(&candidates, now);
    if expired.is_empty() {
        tracing::info!(checked, %now, "no expired bookings found");
        return Ok(ReconcileOutcome::NothingExpired { checked });
    }

    tracing::info!(checked, expired = expired.booking_ids.len(), %now, "expiring bookings");

    let bookings_updated = store
        .mark_completed(&expired.booking_ids, now)
        .await
        .map_err(ReconcileError::Transition)?;

    let mut rooms = Vec::new();
    for room_id in expired.distinct_rooms() {
        rooms.push(release_room(store, room_id, now).await);
    }

    let rooms_updated = rooms.iter().filter(|r| r.outcome.frees_room()).count();

    let summary = ReconcileSummary {
        checked,
        expired: expired.booking_ids.len(),
        bookings_updated,
        rooms_updated,
        rooms,
    };

    tracing::info!(
        bookings_updated,
        rooms_updated,
        rooms_failed = summary.failed_rooms(),
        "reconciliation finished"
    );

    Ok(ReconcileOutcome::Reconciled(summary))
}

async fn release_room(store: &dyn BookingStore, room_id: String, now: NaiveDateTime) -> RoomRelease {
    match try_release_room(store, &room_id, now).await {
        Ok(outcome) => {
            tracing::debug!(room_id = %room_id, ?outcome, "room checked");
            RoomRelease {
                room_id,
                outcome,
                error: None,
            }
        }
        Err(e) => {
            let message = format!("{e:#}");
            tracing::warn!(room_id = %room_id, error = %message, "failed to release room");
            RoomRelease {
                room_id,
                outcome: ReleaseOutcome::Failed,
                error: Some(message),
            }
        }
    }
}

async fn try_release_room(
    store: &dyn BookingStore,
    room_id: &str,
    now: NaiveDateTime,
) -> anyhow::Result<ReleaseOutcome> {
    if store.has_active_booking(room_id, now.date()).await? {
        return Ok(ReleaseOutcome::StillClaimed);
    }

    if store.release_room(room_id, now).await? {
        tracing::info!(room_id, "room released");
        return Ok(ReleaseOutcome::Released);
    }

    if store.clear_reservation(room_id, now).await? {
        tracing::info!(room_id, "lapsed reservation cleared");
        return Ok(ReleaseOutcome::ReservationCleared);
    }

    Ok(ReleaseOutcome::NotOccupied)
}
