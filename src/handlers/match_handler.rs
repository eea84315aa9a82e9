use actix_web::{web, HttpResponse, Result};
use uuid::Uuid;

use crate::handlers::error_response;
use crate::models::common::ApiResponse;
use crate::models::game_match::{CreateMatchRequest, EndMatchRequest, MatchHistoryQuery, MatchStatus};
use crate::models::shot::UndoShotRequest;
use crate::services::MatchService;

#[tracing::instrument(
    name = "Create match",
    skip(body, service),
    fields(team_a = body.team_a.len(), team_b = body.team_b.len())
)]
pub async fn create_match(
    body: web::Json<CreateMatchRequest>,
    service: web::Data<MatchService>,
) -> Result<HttpResponse> {
    match service.create_match(&body.team_a, &body.team_b).await {
        Ok(created) => Ok(HttpResponse::Created().json(ApiResponse::success("Match created", created))),
        Err(e) => {
            tracing::warn!("Failed to create match: {}", e);
            Ok(error_response(&e))
        }
    }
}

pub async fn get_match(match_id: Uuid, service: web::Data<MatchService>) -> Result<HttpResponse> {
    match service.get_match(match_id).await {
        Ok(found) => Ok(HttpResponse::Ok().json(ApiResponse::success("Match", found))),
        Err(e) => Ok(error_response(&e)),
    }
}

#[tracing::instrument(name = "Get match history", skip(query, service), fields(status = ?query.status))]
pub async fn get_match_history(
    query: web::Query<MatchHistoryQuery>,
    service: web::Data<MatchService>,
) -> Result<HttpResponse> {
    let status = match query.status.as_deref().map(str::parse::<MatchStatus>).transpose() {
        Ok(status) => status,
        Err(e) => return Ok(error_response(&e)),
    };

    match service.match_history(status).await {
        Ok(matches) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            format!("{} matches", matches.len()),
            matches,
        ))),
        Err(e) => Ok(error_response(&e)),
    }
}

pub async fn get_remaining_cups(match_id: Uuid, service: web::Data<MatchService>) -> Result<HttpResponse> {
    match service.remaining_cups(match_id).await {
        Ok(remaining) => Ok(HttpResponse::Ok().json(ApiResponse::success("Remaining cups", remaining))),
        Err(e) => Ok(error_response(&e)),
    }
}

pub async fn get_recap(match_id: Uuid, service: web::Data<MatchService>) -> Result<HttpResponse> {
    match service.recap(match_id).await {
        Ok(shots) => Ok(HttpResponse::Ok().json(ApiResponse::success("Match recap", shots))),
        Err(e) => Ok(error_response(&e)),
    }
}

#[tracing::instrument(
    name = "End match",
    skip(body, service),
    fields(match_id = %match_id, winner = %body.winner)
)]
pub async fn end_match(
    match_id: Uuid,
    body: web::Json<EndMatchRequest>,
    service: web::Data<MatchService>,
) -> Result<HttpResponse> {
    let request = body.into_inner();
    match service
        .end_match(match_id, &request.winner, request.remaining_cups)
        .await
    {
        Ok(result) => Ok(HttpResponse::Ok().json(ApiResponse::success("Match finished", result))),
        Err(e) => {
            tracing::warn!("Failed to end match {}: {}", match_id, e);
            Ok(error_response(&e))
        }
    }
}

#[tracing::instrument(
    name = "Undo shot",
    skip(body, service),
    fields(match_id = %match_id, side = %body.side, sequence = body.sequence)
)]
pub async fn undo_shot(
    match_id: Uuid,
    body: web::Json<UndoShotRequest>,
    service: web::Data<MatchService>,
) -> Result<HttpResponse> {
    match service.undo_shot(match_id, &body.side, body.sequence).await {
        Ok(removed) => Ok(HttpResponse::Ok().json(ApiResponse::success("Shot removed", removed))),
        Err(e) => Ok(error_response(&e)),
    }
}
