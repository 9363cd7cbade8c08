use serde::Serialize;

/// Bookings whose window has closed, plus the rooms they referenced.
/// `room_ids` keeps one entry per expired booking, so it may repeat.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpiredSet {
    pub booking_ids: Vec<String>,
    pub room_ids: Vec<String>,
}

impl ExpiredSet {
    pub fn is_empty(&self) -> bool {
        self.booking_ids.is_empty()
    }

    /// Distinct room ids in first-seen order.
    pub fn distinct_rooms(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        self.room_ids
            .iter()
            .filter(|id| seen.insert(id.as_str()))
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseOutcome {
    /// Room moved from occupied to available.
    Released,
    /// Room held for a no-show moved from reserved to available.
    ReservationCleared,
    /// Another active booking still claims the room.
    StillClaimed,
    /// Room was neither occupied nor reserved; the guarded updates matched nothing.
    NotOccupied,
    Failed,
}

impl ReleaseOutcome {
    pub fn frees_room(&self) -> bool {
        matches!(self, ReleaseOutcome::Released | ReleaseOutcome::ReservationCleared)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RoomRelease {
    pub room_id: String,
    pub outcome: ReleaseOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconcileSummary {
    pub checked: usize,
    pub expired: usize,
    pub bookings_updated: usize,
    pub rooms_updated: usize,
    pub rooms: Vec<RoomRelease>,
}

impl ReconcileSummary {
    pub fn failed_rooms(&self) -> usize {
        self.rooms
            .iter()
            .filter(|r| r.outcome == ReleaseOutcome::Failed)
            .count()
    }
}

#[derive(Debug, Clone)]
pub enum ReconcileOutcome {
    NothingExpired { checked: usize },
    Reconciled(ReconcileSummary),
}
