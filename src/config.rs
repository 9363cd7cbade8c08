use std::env;

use chrono::FixedOffset;

use crate::clock::utc_offset;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    /// Minutes east of UTC for venue wall-clock time. No DST.
    pub venue_utc_offset_minutes: i32,
    /// Period of the in-process reconcile ticker; 0 leaves scheduling to an external caller.
    pub reconcile_interval_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "roomsync.db".to_string()),
            venue_utc_offset_minutes: env::var("VENUE_UTC_OFFSET_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
            reconcile_interval_secs: env::var("RECONCILE_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
        }
    }

    pub fn venue_offset(&self) -> FixedOffset {
        match FixedOffset::east_opt(self.venue_utc_offset_minutes * 60) {
            Some(offset) => offset,
            None => {
                tracing::warn!(
                    minutes = self.venue_utc_offset_minutes,
                    "venue UTC offset out of range, using UTC"
                );
                utc_offset()
            }
        }
    }
}
