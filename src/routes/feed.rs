use actix_web::{web, HttpResponse, Responder};
use serde_json::json;

use crate::core::{FeedView, SwipeEngine, SwipeOutcome};
use crate::models::{
    FeedResponse, PendingLikesResponse, SearchFilter, SeedProfilesRequest, SwipeRequest,
    SwipeResponse, UserQuery,
};
use crate::routes::{engine_error_response, error_response, session, validation_response, AppState};

/// Configure feed, swipe and likes routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/feed", web::get().to(get_feed))
        .route("/feed/reset", web::post().to(reset_feed))
        .route("/feed/refresh", web::post().to(refresh_feed))
        .route("/feed/filter", web::put().to(set_filter))
        .route("/swipes", web::post().to(record_swipe))
        .route("/likes", web::get().to(get_likes))
        .route("/saved", web::get().to(get_saved))
        .route("/profiles", web::put().to(seed_profiles))
        .route("/gesture", web::get().to(get_gesture));
}

fn feed_response(engine: &SwipeEngine, view: FeedView) -> FeedResponse {
    let current = view
        .current_id()
        .and_then(|id| engine.feed_profile(id));
    FeedResponse {
        profile_ids: view.profile_ids,
        current_index: view.current_index,
        current,
        used_fallback: view.used_fallback,
    }
}

/// GET /api/v1/feed?userId={userId}
async fn get_feed(state: web::Data<AppState>, query: web::Query<UserQuery>) -> impl Responder {
    if let Some(invalid) = validation_response(&*query) {
        return invalid;
    }
    let engine = match session(&state, &query.user_id).await {
        Ok(engine) => engine,
        Err(response) => return response,
    };

    let view = engine.feed();
    HttpResponse::Ok().json(feed_response(&engine, view))
}

/// POST /api/v1/feed/reset?userId={userId}
///
/// Clears swipe history locally and on the backend, then restarts the feed.
async fn reset_feed(state: web::Data<AppState>, query: web::Query<UserQuery>) -> impl Responder {
    if let Some(invalid) = validation_response(&*query) {
        return invalid;
    }
    let engine = match session(&state, &query.user_id).await {
        Ok(engine) => engine,
        Err(response) => return response,
    };

    match engine.reset_history().await {
        Ok(view) => HttpResponse::Ok().json(feed_response(&engine, view)),
        Err(e) => engine_error_response(&e),
    }
}

/// POST /api/v1/feed/refresh?userId={userId}
async fn refresh_feed(state: web::Data<AppState>, query: web::Query<UserQuery>) -> impl Responder {
    if let Some(invalid) = validation_response(&*query) {
        return invalid;
    }
    let engine = match session(&state, &query.user_id).await {
        Ok(engine) => engine,
        Err(response) => return response,
    };

    match engine.refresh_feed().await {
        Ok(view) => HttpResponse::Ok().json(feed_response(&engine, view)),
        Err(e) => engine_error_response(&e),
    }
}

/// PUT /api/v1/feed/filter?userId={userId}
async fn set_filter(
    state: web::Data<AppState>,
    query: web::Query<UserQuery>,
    filter: web::Json<SearchFilter>,
) -> impl Responder {
    if let Some(invalid) = validation_response(&*query) {
        return invalid;
    }
    let engine = match session(&state, &query.user_id).await {
        Ok(engine) => engine,
        Err(response) => return response,
    };

    let view = engine.set_filter(filter.into_inner());
    HttpResponse::Ok().json(feed_response(&engine, view))
}

/// Record a swipe
///
/// POST /api/v1/swipes
///
/// Request body:
/// ```json
/// {
///   "userId": "string",
///   "targetUserId": "string",
///   "direction": "left|right|up"
/// }
/// ```
async fn record_swipe(state: web::Data<AppState>, req: web::Json<SwipeRequest>) -> impl Responder {
    if let Some(invalid) = validation_response(&*req) {
        return invalid;
    }
    let engine = match session(&state, &req.user_id).await {
        Ok(engine) => engine,
        Err(response) => return response,
    };

    match engine.swipe_named(&req.target_user_id, &req.direction).await {
        Ok(outcome) => {
            tracing::debug!("Swipe {} -> {} processed", req.user_id, req.target_user_id);
            HttpResponse::Ok().json(SwipeResponse {
                action: outcome.action(),
                matched: outcome.matched().cloned(),
                saved_listing: outcome.saved_listing().cloned(),
                duplicate: matches!(outcome, SwipeOutcome::Duplicate),
            })
        }
        Err(e) => engine_error_response(&e),
    }
}

/// People who like the user and are waiting for an answer
///
/// GET /api/v1/likes?userId={userId}
async fn get_likes(state: web::Data<AppState>, query: web::Query<UserQuery>) -> impl Responder {
    if !state.sessions.settings().features.likes_you {
        return error_response("Feature disabled", 403, "Likes you is not enabled");
    }
    if let Some(invalid) = validation_response(&*query) {
        return invalid;
    }
    let engine = match session(&state, &query.user_id).await {
        Ok(engine) => engine,
        Err(response) => return response,
    };

    HttpResponse::Ok().json(PendingLikesResponse {
        pending_likes: engine.pending_likes(),
    })
}

/// GET /api/v1/saved?userId={userId}
async fn get_saved(state: web::Data<AppState>, query: web::Query<UserQuery>) -> impl Responder {
    if let Some(invalid) = validation_response(&*query) {
        return invalid;
    }
    let engine = match session(&state, &query.user_id).await {
        Ok(engine) => engine,
        Err(response) => return response,
    };

    HttpResponse::Ok().json(json!({ "savedListings": engine.saved_listings() }))
}

/// Seed candidate profiles for local development
///
/// PUT /api/v1/profiles
async fn seed_profiles(
    state: web::Data<AppState>,
    req: web::Json<SeedProfilesRequest>,
) -> impl Responder {
    if let Some(invalid) = validation_response(&*req) {
        return invalid;
    }

    let count = state.sessions.seed_profiles(req.into_inner().profiles);
    HttpResponse::Ok().json(json!({ "seeded": count }))
}

/// Drag thresholds and animation timing for card stacks
///
/// GET /api/v1/gesture
async fn get_gesture(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(&state.sessions.settings().gesture)
}
