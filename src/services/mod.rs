pub mod bookings;
pub mod reconcile;
pub mod scheduler;
pub mod store;
