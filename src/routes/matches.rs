use actix_web::{web, HttpResponse, Responder};

use crate::models::{AttachConversationRequest, HealthResponse, MatchesResponse, UserQuery};
use crate::routes::{engine_error_response, session, validation_response, AppState};

/// Configure health and match routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/matches", web::get().to(get_matches))
        .route("/matches/{match_id}/read", web::post().to(mark_read))
        .route("/matches/{match_id}", web::delete().to(delete_match))
        .route(
            "/matches/{match_id}/conversation",
            web::post().to(attach_conversation),
        );
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    tracing::trace!("Health check with {} live sessions", state.sessions.session_count());

    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Resolved matches for a user, most recently updated first
///
/// GET /api/v1/matches?userId={userId}
async fn get_matches(state: web::Data<AppState>, query: web::Query<UserQuery>) -> impl Responder {
    if let Some(invalid) = validation_response(&*query) {
        return invalid;
    }
    let engine = match session(&state, &query.user_id).await {
        Ok(engine) => engine,
        Err(response) => return response,
    };

    HttpResponse::Ok().json(MatchesResponse {
        matches: engine.matches(),
    })
}

/// POST /api/v1/matches/{matchId}/read?userId={userId}
async fn mark_read(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<UserQuery>,
) -> impl Responder {
    if let Some(invalid) = validation_response(&*query) {
        return invalid;
    }
    let engine = match session(&state, &query.user_id).await {
        Ok(engine) => engine,
        Err(response) => return response,
    };

    match engine.mark_read(&path).await {
        Ok(m) => HttpResponse::Ok().json(m),
        Err(e) => engine_error_response(&e),
    }
}

/// Unmatch. There is no undo.
///
/// DELETE /api/v1/matches/{matchId}?userId={userId}
async fn delete_match(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<UserQuery>,
) -> impl Responder {
    if let Some(invalid) = validation_response(&*query) {
        return invalid;
    }
    let engine = match session(&state, &query.user_id).await {
        Ok(engine) => engine,
        Err(response) => return response,
    };

    match engine.delete_match(&path).await {
        Ok(m) => {
            tracing::info!("{} unmatched {}", query.user_id, m.id);
            HttpResponse::NoContent().finish()
        }
        Err(e) => engine_error_response(&e),
    }
}

/// Link a conversation created elsewhere to a match
///
/// POST /api/v1/matches/{matchId}/conversation?userId={userId}
///
/// Request body:
/// ```json
/// { "conversationId": "string" }
/// ```
async fn attach_conversation(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<UserQuery>,
    req: web::Json<AttachConversationRequest>,
) -> impl Responder {
    if let Some(invalid) = validation_response(&*query).or_else(|| validation_response(&*req)) {
        return invalid;
    }
    let engine = match session(&state, &query.user_id).await {
        Ok(engine) => engine,
        Err(response) => return response,
    };

    match engine.attach_conversation(&path, &req.conversation_id).await {
        Ok(m) => HttpResponse::Ok().json(m),
        Err(e) => engine_error_response(&e),
    }
}
