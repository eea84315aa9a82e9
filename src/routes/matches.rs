// src/routes/matches.rs
use actix_web::{get, post, web, HttpResponse, Result};
use uuid::Uuid;

use crate::handlers::match_handler;
use crate::models::game_match::{CreateMatchRequest, EndMatchRequest, MatchHistoryQuery};
use crate::models::shot::UndoShotRequest;
use crate::services::MatchService;

/// Start a new match between two rosters
#[post("")]
async fn create_match(
    body: web::Json<CreateMatchRequest>,
    service: web::Data<MatchService>,
) -> Result<HttpResponse> {
    match_handler::create_match(body, service).await
}

/// Match history, newest first, optionally filtered by status
#[get("")]
async fn get_match_history(
    query: web::Query<MatchHistoryQuery>,
    service: web::Data<MatchService>,
) -> Result<HttpResponse> {
    match_handler::get_match_history(query, service).await
}

#[get("/{match_id}")]
async fn get_match(
    path: web::Path<Uuid>,
    service: web::Data<MatchService>,
) -> Result<HttpResponse> {
    match_handler::get_match(path.into_inner(), service).await
}

/// Live cup count derived from the shot log
#[get("/{match_id}/remaining_cups")]
async fn get_remaining_cups(
    path: web::Path<Uuid>,
    service: web::Data<MatchService>,
) -> Result<HttpResponse> {
    match_handler::get_remaining_cups(path.into_inner(), service).await
}

#[get("/{match_id}/recap")]
async fn get_recap(
    path: web::Path<Uuid>,
    service: web::Data<MatchService>,
) -> Result<HttpResponse> {
    match_handler::get_recap(path.into_inner(), service).await
}

/// Finish the match and apply rating changes
#[post("/{match_id}/end")]
async fn end_match(
    path: web::Path<Uuid>,
    body: web::Json<EndMatchRequest>,
    service: web::Data<MatchService>,
) -> Result<HttpResponse> {
    match_handler::end_match(path.into_inner(), body, service).await
}

#[post("/{match_id}/undo")]
async fn undo_shot(
    path: web::Path<Uuid>,
    body: web::Json<UndoShotRequest>,
    service: web::Data<MatchService>,
) -> Result<HttpResponse> {
    match_handler::undo_shot(path.into_inner(), body, service).await
}
