use std::net::TcpListener;
use std::sync::Arc;

use cuprank_backend::run;
use cuprank_backend::config::settings::get_config;
use cuprank_backend::db::{get_connection_pool, PgMatchStore};
use cuprank_backend::telemetry::{get_subscriber, init_subscriber};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Panic if we can't read the config
    let config = get_config().expect("Failed to read the config.");

    let subscriber = get_subscriber(
        "cuprank-backend".into(),
        config.application.log_level.clone(),
        std::io::stdout
    );
    init_subscriber(subscriber);

    // Only try to establish connection when actually used
    let connection_pool = get_connection_pool(&config.database)
        .expect("Failed to create Postgres connection pool");
    let store = PgMatchStore::new(connection_pool);
    if let Err(e) = store.migrate().await {
        tracing::error!("Failed to run database migrations: {}", e);
        std::process::exit(1);
    }

    let address = config.application.address();
    let listener = TcpListener::bind(&address)?;
    tracing::info!(
        "Listening on {} (k_factor={}, initial_rating={})",
        address,
        config.rating.k_factor,
        config.rating.initial_rating
    );

    run(
        listener,
        Arc::new(store),
        config.rating,
        config.application.allowed_origins.clone(),
    )?.await
}
