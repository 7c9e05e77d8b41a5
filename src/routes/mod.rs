// Route exports
pub mod feed;
pub mod matches;
pub mod sessions;

use actix_web::{web, HttpResponse};
use std::sync::Arc;
use validator::Validate;

use crate::core::{EngineError, SwipeEngine};
use crate::models::ErrorResponse;
pub use sessions::SessionRegistry;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionRegistry>,
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(matches::configure)
            .configure(feed::configure),
    );
}

pub(crate) fn error_response(error: &str, status_code: u16, message: impl ToString) -> HttpResponse {
    let body = ErrorResponse {
        error: error.to_string(),
        message: message.to_string(),
        status_code,
    };
    match status_code {
        400 => HttpResponse::BadRequest().json(body),
        403 => HttpResponse::Forbidden().json(body),
        404 => HttpResponse::NotFound().json(body),
        409 => HttpResponse::Conflict().json(body),
        _ => HttpResponse::InternalServerError().json(body),
    }
}

pub(crate) fn engine_error_response(e: &EngineError) -> HttpResponse {
    match e {
        EngineError::InvalidDirection(_) => error_response("Invalid direction", 400, e),
        EngineError::UnknownProfile(_) => error_response("Unknown profile", 404, e),
        EngineError::MatchNotFound(_) => error_response("Match not found", 404, e),
        EngineError::GestureRejected(_) => error_response("Gesture rejected", 409, e),
        EngineError::Storage(_) | EngineError::Sync(_) | EngineError::Serialization(_) => {
            tracing::error!("Engine failure: {}", e);
            error_response("Internal error", 500, e)
        }
    }
}

pub(crate) fn validation_response<T: Validate>(req: &T) -> Option<HttpResponse> {
    req.validate().err().map(|errors| {
        tracing::info!("Validation failed: {:?}", errors);
        error_response("Validation failed", 400, errors)
    })
}

/// Resolve the caller's engine or produce the error response
pub(crate) async fn session(
    state: &AppState,
    user_id: &str,
) -> Result<Arc<SwipeEngine>, HttpResponse> {
    state
        .sessions
        .engine(user_id)
        .await
        .map_err(|e| engine_error_response(&e))
}
