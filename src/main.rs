use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use roomsync::clock::{SystemClock, VenueClock};
use roomsync::config::AppConfig;
use roomsync::db;
use roomsync::handlers;
use roomsync::services::scheduler;
use roomsync::services::store::SqliteStore;
use roomsync::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;
    let db = Arc::new(Mutex::new(conn));

    let offset = config.venue_offset();
    tracing::info!("venue clock offset: {offset} (fixed, no DST)");

    let state = Arc::new(AppState {
        db: db.clone(),
        config: config.clone(),
        clock: VenueClock::new(Arc::new(SystemClock), offset),
        store: Arc::new(SqliteStore::new(db)),
    });

    if config.reconcile_interval_secs > 0 {
        let period = Duration::from_secs(config.reconcile_interval_secs);
        tracing::info!("reconcile ticker every {}s", config.reconcile_interval_secs);
        tokio::spawn(scheduler::run_ticker(state.clone(), period));
    }

    let app = handlers::router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
