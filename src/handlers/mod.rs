use actix_web::HttpResponse;

use crate::error::GameError;
use crate::models::common::ApiResponse;

pub mod admin;
pub mod backend_health_handler;
pub mod match_handler;
pub mod player_handler;
pub mod shot_handler;

/// Translate a domain failure into the error envelope with its status code
pub fn error_response(error: &GameError) -> HttpResponse {
    let body = ApiResponse::<()>::error(error.to_string());
    match error {
        GameError::Validation(_) => HttpResponse::BadRequest().json(body),
        GameError::NotFound(_) => HttpResponse::NotFound().json(body),
        GameError::Consistency(_) => HttpResponse::Conflict().json(body),
        GameError::TransactionFailure(_) => {
            tracing::error!("Persistence failure: {}", error);
            HttpResponse::InternalServerError().json(body)
        }
    }
}
