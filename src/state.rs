use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::clock::VenueClock;
use crate::config::AppConfig;
use crate::services::store::BookingStore;

pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub config: AppConfig,
    pub clock: VenueClock,
    pub store: Arc<dyn BookingStore>,
}
