//! Recompute every player's rating from the finished match history.
//!
//! Maintenance tool: run it while the API server is stopped.

use std::sync::Arc;

use cuprank_backend::config::settings::get_config;
use cuprank_backend::db::{get_connection_pool, PgMatchStore};
use cuprank_backend::services::{BackfillService, MaintenanceGate};
use cuprank_backend::telemetry::{get_subscriber, init_subscriber};

#[tokio::main]
async fn main() {
    let config = get_config().expect("Failed to read the config.");
    let subscriber = get_subscriber(
        "backfill_ratings".into(),
        config.application.log_level.clone(),
        std::io::stdout
    );
    init_subscriber(subscriber);

    let pool = get_connection_pool(&config.database)
        .expect("Failed to create Postgres connection pool");
    let store = PgMatchStore::new(pool);
    if let Err(e) = store.migrate().await {
        tracing::error!("Failed to run database migrations: {}", e);
        std::process::exit(1);
    }

    let service = BackfillService::new(Arc::new(store), config.rating, MaintenanceGate::new());
    match service.run_backfill().await {
        Ok(report) => {
            for warning in &report.warnings {
                tracing::warn!("{}", warning);
            }
            tracing::info!(
                "Recomputed {} matches for {} players",
                report.matches_processed,
                report.players_updated
            );
        }
        Err(e) => {
            tracing::error!("Backfill failed: {}", e);
            std::process::exit(1);
        }
    }
}
