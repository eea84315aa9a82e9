use actix_web::{http, web, App, HttpServer};
use actix_web::dev::Server;
use tracing_actix_web::TracingLogger;
use std::net::TcpListener;
use std::sync::Arc;
use actix_cors::Cors;

pub mod config;
mod routes;
mod handlers;
pub mod models;
pub mod db;
pub mod error;
pub mod game;
pub mod services;
pub mod telemetry;
use crate::routes::init_routes;
use crate::db::store::MatchStore;
use crate::game::rating::EloConfig;
use crate::services::{BackfillService, CleanupService, MaintenanceGate, MatchService, PlayerService};

pub fn run(
    listener: TcpListener,
    store: Arc<dyn MatchStore>,
    rating: EloConfig,
    allowed_origins: Vec<String>,
) -> Result<Server, std::io::Error> {
    // One gate shared by every service of this process
    let gate = MaintenanceGate::new();

    // Wrap using web::Data, which boils down to an Arc smart pointer
    let match_service = web::Data::new(MatchService::new(store.clone(), rating, gate.clone()));
    let player_service = web::Data::new(PlayerService::new(store.clone(), rating.initial_rating));
    let backfill_service = web::Data::new(BackfillService::new(store.clone(), rating, gate.clone()));
    let cleanup_service = web::Data::new(CleanupService::new(store, gate));

    let server = HttpServer::new(move || {
        let cors = allowed_origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
            .allowed_methods(vec!["GET", "POST"])
            .allowed_headers(vec![
                http::header::ACCEPT,
                http::header::CONTENT_TYPE,
            ])
            .max_age(3600);

        App::new()
            .wrap(TracingLogger::default())
            .wrap(cors)
            .app_data(match_service.clone())
            .app_data(player_service.clone())
            .app_data(backfill_service.clone())
            .app_data(cleanup_service.clone())
            .configure(init_routes)
    })
    .listen(listener)?
    .run();

    Ok(server)
}
