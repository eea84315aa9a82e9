// src/routes/admin.rs
use actix_web::{post, web, HttpResponse, Result};

use crate::handlers::admin::maintenance_handler;
use crate::services::{BackfillService, CleanupService};

#[post("/backfill")]
async fn run_backfill(service: web::Data<BackfillService>) -> Result<HttpResponse> {
    maintenance_handler::run_backfill(service).await
}

#[post("/cleanup_ongoing")]
async fn cleanup_ongoing(service: web::Data<CleanupService>) -> Result<HttpResponse> {
    maintenance_handler::cleanup_ongoing(service).await
}
