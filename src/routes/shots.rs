// src/routes/shots.rs
use actix_web::{post, web, HttpResponse, Result};

use crate::handlers::shot_handler;
use crate::models::shot::{RecordBounceRequest, RecordShotRequest};
use crate::services::MatchService;

#[post("")]
async fn record_shot(
    body: web::Json<RecordShotRequest>,
    service: web::Data<MatchService>,
) -> Result<HttpResponse> {
    shot_handler::record_shot(body, service).await
}

/// One throw that takes out two cups
#[post("/bounce")]
async fn record_bounce(
    body: web::Json<RecordBounceRequest>,
    service: web::Data<MatchService>,
) -> Result<HttpResponse> {
    shot_handler::record_bounce(body, service).await
}
