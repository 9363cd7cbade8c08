use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    pub room_id: String,
    pub customer_name: Option<String>,
    pub booking_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub status: BookingStatus,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Booking {
    /// Venue-local wall-clock instant at which the booking window closes.
    pub fn end_instant(&self) -> NaiveDateTime {
        self.booking_date.and_time(self.end_time)
    }

    /// True once `now` is strictly past the end of the booking window.
    pub fn is_expired_at(&self, now: NaiveDateTime) -> bool {
        now > self.end_instant()
    }

    pub fn overlaps(&self, date: NaiveDate, start: NaiveTime, end: NaiveTime) -> bool {
        self.booking_date == date && self.start_time < end && self.end_time > start
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl BookingStatus {
    pub const ACTIVE: [BookingStatus; 2] = [BookingStatus::Pending, BookingStatus::Confirmed];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "confirmed" => BookingStatus::Confirmed,
            "cancelled" => BookingStatus::Cancelled,
            "completed" => BookingStatus::Completed,
            _ => BookingStatus::Pending,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Confirmed)
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }
}

/// Accepts `HH:MM` and the `HH:MM:SS` form some clients send.
pub fn parse_time(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .ok()
}

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn booking(date: &str, start: &str, end: &str, status: BookingStatus) -> Booking {
        let created = NaiveDateTime::parse_from_str("2024-01-01 00:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
        Booking {
            id: "b-1".to_string(),
            room_id: "r-1".to_string(),
            customer_name: None,
            booking_date: parse_date(date).unwrap(),
            start_time: parse_time(start).unwrap(),
            end_time: parse_time(end).unwrap(),
            status,
            notes: None,
            created_at: created,
            updated_at: created,
        }
    }

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn test_expiry_is_strict() {
        let b = booking("2024-01-10", "12:00", "14:00", BookingStatus::Confirmed);
        assert!(!b.is_expired_at(at("2024-01-10 13:59:00")));
        assert!(!b.is_expired_at(at("2024-01-10 14:00:00")));
        assert!(b.is_expired_at(at("2024-01-10 14:00:01")));
        assert!(b.is_expired_at(at("2024-01-11 09:00:00")));
    }

    #[test]
    fn test_parse_time_formats() {
        assert_eq!(parse_time("14:00"), NaiveTime::from_hms_opt(14, 0, 0));
        assert_eq!(parse_time("14:00:30"), NaiveTime::from_hms_opt(14, 0, 30));
        assert!(parse_time("25:00").is_none());
        assert!(parse_time("2pm").is_none());
    }

    #[test]
    fn test_status_round_trip_and_activity() {
        for status in [
            BookingStatus::Pending,
            BookingStatus::Confirmed,
            BookingStatus::Cancelled,
            BookingStatus::Completed,
        ] {
            assert_eq!(BookingStatus::parse(status.as_str()), status);
        }
        assert!(BookingStatus::Pending.is_active());
        assert!(BookingStatus::Confirmed.is_active());
        assert!(BookingStatus::Cancelled.is_terminal());
        assert!(BookingStatus::Completed.is_terminal());
    }

    #[test]
    fn test_overlap_adjacent_is_free() {
        let b = booking("2024-01-10", "10:00", "11:00", BookingStatus::Confirmed);
        let date = parse_date("2024-01-10").unwrap();
        assert!(b.overlaps(date, parse_time("10:30").unwrap(), parse_time("11:30").unwrap()));
        assert!(!b.overlaps(date, parse_time("11:00").unwrap(), parse_time("12:00").unwrap()));
        let other_day = parse_date("2024-01-11").unwrap();
        assert!(!b.overlaps(other_day, parse_time("10:30").unwrap(), parse_time("11:30").unwrap()));
    }
}
