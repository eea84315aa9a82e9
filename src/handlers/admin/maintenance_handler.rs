use actix_web::{web, HttpResponse, Result};

use crate::handlers::error_response;
use crate::models::common::ApiResponse;
use crate::services::{BackfillService, CleanupService};

/// POST /admin/backfill - Recompute every rating from the finished match history
#[tracing::instrument(name = "Backfill ratings", skip(service))]
pub async fn run_backfill(service: web::Data<BackfillService>) -> Result<HttpResponse> {
    match service.run_backfill().await {
        Ok(report) => {
            for warning in &report.warnings {
                tracing::warn!("{}", warning);
            }
            Ok(HttpResponse::Ok().json(ApiResponse::success("Ratings recomputed", report)))
        }
        Err(e) => {
            tracing::error!("Backfill failed: {}", e);
            Ok(error_response(&e))
        }
    }
}

/// POST /admin/cleanup_ongoing - Delete abandoned matches that never finished
#[tracing::instrument(name = "Cleanup ongoing matches", skip(service))]
pub async fn cleanup_ongoing(service: web::Data<CleanupService>) -> Result<HttpResponse> {
    match service.delete_ongoing().await {
        Ok(report) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            format!("Deleted {} ongoing matches", report.matches_deleted),
            report,
        ))),
        Err(e) => {
            tracing::error!("Cleanup failed: {}", e);
            Ok(error_response(&e))
        }
    }
}
