use actix_web::{web, HttpResponse, Result};

use crate::handlers::error_response;
use crate::models::common::ApiResponse;
use crate::models::shot::{RecordBounceRequest, RecordShotRequest};
use crate::services::MatchService;

#[tracing::instrument(
    name = "Record shot",
    skip(body, service),
    fields(match_id = %body.match_id, player_id = %body.player_id, cup = body.cup, hit = body.hit)
)]
pub async fn record_shot(
    body: web::Json<RecordShotRequest>,
    service: web::Data<MatchService>,
) -> Result<HttpResponse> {
    match service
        .record_shot(body.match_id, body.player_id, &body.side, body.cup, body.hit, body.sequence)
        .await
    {
        Ok(shot) => Ok(HttpResponse::Created().json(ApiResponse::success("Shot recorded", shot))),
        Err(e) => {
            tracing::warn!("Rejected shot for match {}: {}", body.match_id, e);
            Ok(error_response(&e))
        }
    }
}

#[tracing::instrument(
    name = "Record bounce shot",
    skip(body, service),
    fields(match_id = %body.match_id, player_id = %body.player_id, cups = ?body.cups)
)]
pub async fn record_bounce(
    body: web::Json<RecordBounceRequest>,
    service: web::Data<MatchService>,
) -> Result<HttpResponse> {
    match service
        .record_bounce_shot(body.match_id, body.player_id, &body.side, &body.cups, body.sequence)
        .await
    {
        Ok(shot) => Ok(HttpResponse::Created().json(ApiResponse::success("Bounce recorded", shot))),
        Err(e) => {
            tracing::warn!("Rejected bounce for match {}: {}", body.match_id, e);
            Ok(error_response(&e))
        }
    }
}
