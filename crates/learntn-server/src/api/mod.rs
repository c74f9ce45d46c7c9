//! API module for the LearnTn server

pub mod error;
pub mod extract;
pub mod handlers;
pub mod state;

use axum::{
    routing::{delete, get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use state::AppState;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Health check endpoint
///
/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
    })
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    // CORS configuration for the browser front end
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        // Credentials
        .route("/api/auth/register", post(handlers::register))
        .route("/api/auth/login", post(handlers::login))
        .route("/api/auth/refresh", post(handlers::refresh))
        .route("/api/auth/logout", post(handlers::logout))
        .route("/api/auth/profile", get(handlers::profile))
        // Enrollments
        .route("/api/enrollments", post(handlers::enroll))
        .route("/api/enrollments/my", get(handlers::my_enrollments))
        .route("/api/enrollments/{course_id}", delete(handlers::drop_course))
        .route("/api/enrollments/course/{course_id}", get(handlers::course_roster))
        // Progress
        .route("/api/progress/start", post(handlers::start_lesson))
        .route("/api/progress/complete", post(handlers::complete_lesson))
        .route("/api/progress/course/{course_id}", get(handlers::course_progress))
        .route("/api/progress/leaderboard", get(handlers::leaderboard))
        // Lessons
        .route("/api/lessons/{lesson_id}/summarize", post(handlers::summarize_lesson))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
