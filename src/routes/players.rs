// src/routes/players.rs
use actix_web::{get, post, web, HttpResponse, Result};
use uuid::Uuid;

use crate::handlers::player_handler;
use crate::models::player::CreatePlayerRequest;
use crate::services::PlayerService;

/// Register a new player at the initial rating
#[post("")]
async fn create_player(
    body: web::Json<CreatePlayerRequest>,
    service: web::Data<PlayerService>,
) -> Result<HttpResponse> {
    player_handler::create_player(body, service).await
}

/// Leaderboard
#[get("")]
async fn list_players(service: web::Data<PlayerService>) -> Result<HttpResponse> {
    player_handler::list_players(service).await
}

#[get("/{player_id}")]
async fn get_player(
    path: web::Path<Uuid>,
    service: web::Data<PlayerService>,
) -> Result<HttpResponse> {
    player_handler::get_player_profile(path.into_inner(), service).await
}

/// Head-to-head and teammate aggregates
#[get("/{player_id}/matchups")]
async fn get_matchups(
    path: web::Path<Uuid>,
    service: web::Data<PlayerService>,
) -> Result<HttpResponse> {
    player_handler::get_matchups(path.into_inner(), service).await
}

#[get("/{player_id}/matchups/partners")]
async fn get_partners(
    path: web::Path<Uuid>,
    service: web::Data<PlayerService>,
) -> Result<HttpResponse> {
    player_handler::get_partners(path.into_inner(), service).await
}
