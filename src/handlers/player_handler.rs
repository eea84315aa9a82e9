use actix_web::{web, HttpResponse, Result};
use uuid::Uuid;

use crate::handlers::error_response;
use crate::models::common::ApiResponse;
use crate::models::player::CreatePlayerRequest;
use crate::services::PlayerService;

#[tracing::instrument(
    name = "Create player",
    skip(body, service),
    fields(name = %body.name)
)]
pub async fn create_player(
    body: web::Json<CreatePlayerRequest>,
    service: web::Data<PlayerService>,
) -> Result<HttpResponse> {
    match service.create_player(&body.name).await {
        Ok(player) => Ok(HttpResponse::Created().json(ApiResponse::success("Player created", player))),
        Err(e) => {
            tracing::warn!("Failed to create player: {}", e);
            Ok(error_response(&e))
        }
    }
}

pub async fn list_players(service: web::Data<PlayerService>) -> Result<HttpResponse> {
    match service.list_players().await {
        Ok(players) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            format!("{} players", players.len()),
            players,
        ))),
        Err(e) => Ok(error_response(&e)),
    }
}

#[tracing::instrument(name = "Get player profile", skip(service), fields(player_id = %player_id))]
pub async fn get_player_profile(
    player_id: Uuid,
    service: web::Data<PlayerService>,
) -> Result<HttpResponse> {
    match service.profile(player_id).await {
        Ok(profile) => Ok(HttpResponse::Ok().json(ApiResponse::success("Player profile", profile))),
        Err(e) => Ok(error_response(&e)),
    }
}

#[tracing::instrument(name = "Get player matchups", skip(service), fields(player_id = %player_id))]
pub async fn get_matchups(
    player_id: Uuid,
    service: web::Data<PlayerService>,
) -> Result<HttpResponse> {
    match service.matchups(player_id).await {
        Ok(matchups) => Ok(HttpResponse::Ok().json(ApiResponse::success("Player matchups", matchups))),
        Err(e) => Ok(error_response(&e)),
    }
}

/// Teammate aggregates only
pub async fn get_partners(
    player_id: Uuid,
    service: web::Data<PlayerService>,
) -> Result<HttpResponse> {
    match service.matchups(player_id).await {
        Ok(matchups) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            "Player partners",
            matchups.by_partners,
        ))),
        Err(e) => Ok(error_response(&e)),
    }
}
