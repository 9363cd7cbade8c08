pub mod booking;
pub mod reconcile;
pub mod room;

pub use booking::{Booking, BookingStatus};
pub use reconcile::{ExpiredSet, ReconcileOutcome, ReconcileSummary, ReleaseOutcome, RoomRelease};
pub use room::{Room, RoomStatus};
