//! Delete every match still ONGOING, with its shots and roster links.
//!
//! Maintenance tool: run it while the API server is stopped.

use std::sync::Arc;

use cuprank_backend::config::settings::get_config;
use cuprank_backend::db::{get_connection_pool, PgMatchStore};
use cuprank_backend::services::{CleanupService, MaintenanceGate};
use cuprank_backend::telemetry::{get_subscriber, init_subscriber};

#[tokio::main]
async fn main() {
    let config = get_config().expect("Failed to read the config.");
    let subscriber = get_subscriber(
        "delete_ongoing".into(),
        config.application.log_level.clone(),
        std::io::stdout
    );
    init_subscriber(subscriber);

    let pool = get_connection_pool(&config.database)
        .expect("Failed to create Postgres connection pool");
    let service = CleanupService::new(Arc::new(PgMatchStore::new(pool)), MaintenanceGate::new());

    match service.delete_ongoing().await {
        Ok(report) => {
            if report.matches_deleted == 0 {
                tracing::info!("No ongoing matches to delete");
            }
            for match_id in &report.match_ids {
                tracing::info!("Deleted match {}", match_id);
            }
        }
        Err(e) => {
            tracing::error!("Cleanup failed: {}", e);
            std::process::exit(1);
        }
    }
}
