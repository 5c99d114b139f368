// src/routes.rs

use axum::{
    Router,
    http::Method,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{achievement, activity, attempt, quiz},
    state::AppState,
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (quizzes, attempts, activity, achievements).
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (stores + session registry).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        "http://localhost:3000".parse().unwrap(),
        "http://127.0.0.1:3000".parse().unwrap(),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let quiz_routes = Router::new().route("/", get(quiz::list_quizzes));

    let attempt_routes = Router::new()
        .route("/", post(attempt::start_attempt))
        .route(
            "/{session_id}",
            get(attempt::get_session).delete(attempt::discard_attempt),
        )
        .route("/{session_id}/answer", post(attempt::select_answer))
        .route("/{session_id}/next", post(attempt::next_question))
        .route("/{session_id}/prev", post(attempt::prev_question))
        .route("/{session_id}/restart", post(attempt::restart_attempt))
        .route("/{session_id}/submit", post(attempt::submit_attempt));

    let activity_routes = Router::new()
        .route("/mistake-review", post(activity::record_mistake_review))
        .route("/revisit", post(activity::record_revisit))
        .route("/retake", post(activity::record_retake));

    let achievement_routes = Router::new().route("/{actor_id}", get(achievement::get_achievements));

    Router::new()
        .nest("/api/quizzes", quiz_routes)
        .nest("/api/attempts", attempt_routes)
        .nest("/api/activity", activity_routes)
        .nest("/api/achievements", achievement_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
