use std::sync::{Arc, Mutex};

use chrono::{DateTime, FixedOffset, NaiveDateTime, Offset, Utc};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to a settable instant, for tests and replays.
pub struct FixedClock {
    instant: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(instant: DateTime<Utc>) -> Self {
        Self {
            instant: Mutex::new(instant),
        }
    }

    pub fn set(&self, instant: DateTime<Utc>) {
        if let Ok(mut guard) = self.instant.lock() {
            *guard = instant;
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        match self.instant.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

/// Venue wall-clock view over a [`Clock`].
///
/// Bookings carry no timezone, so the venue is modelled as a fixed UTC offset
/// with no daylight-saving adjustment.
#[derive(Clone)]
pub struct VenueClock {
    clock: Arc<dyn Clock>,
    offset: FixedOffset,
}

impl VenueClock {
    pub fn new(clock: Arc<dyn Clock>, offset: FixedOffset) -> Self {
        Self { clock, offset }
    }

    pub fn utc(clock: Arc<dyn Clock>) -> Self {
        Self::new(clock, utc_offset())
    }

    pub fn now_local(&self) -> NaiveDateTime {
        self.clock.now().with_timezone(&self.offset).naive_local()
    }
}

pub fn utc_offset() -> FixedOffset {
    Utc.fix()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn utc(s: &str) -> DateTime<Utc> {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
            .unwrap()
            .and_utc()
    }

    #[test]
    fn test_fixed_clock_can_be_moved() {
        let clock = FixedClock::new(utc("2024-01-10 14:01:00"));
        assert_eq!(clock.now(), utc("2024-01-10 14:01:00"));
        clock.set(utc("2024-01-10 13:59:00"));
        assert_eq!(clock.now(), utc("2024-01-10 13:59:00"));
    }

    #[test]
    fn test_venue_offset_shifts_today() {
        let clock = Arc::new(FixedClock::new(utc("2024-01-10 20:30:00")));
        let venue = VenueClock::new(clock, FixedOffset::east_opt(7 * 3600).unwrap());
        assert_eq!(venue.now_local().date(), NaiveDate::from_ymd_opt(2024, 1, 11).unwrap());
        assert_eq!(
            venue.now_local(),
            NaiveDateTime::parse_from_str("2024-01-11 03:30:00", "%Y-%m-%d %H:%M:%S").unwrap()
        );
    }

    #[test]
    fn test_utc_venue_matches_clock() {
        let clock = Arc::new(FixedClock::new(utc("2024-01-10 23:59:59")));
        let venue = VenueClock::utc(clock);
        assert_eq!(venue.now_local().date(), NaiveDate::from_ymd_opt(2024, 1, 10).unwrap());
    }
}
