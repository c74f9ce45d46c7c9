//! Progress handlers
//!
//! Start and complete run through the engine; every route here is gated by
//! role before any state is touched.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    Json,
};
use learntn_core::{Operation, Progress};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::extract::Authenticated;
use crate::api::state::AppState;
use crate::engine::{CompletionOutcome, CourseProgress, LeaderboardEntry};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonRequest {
    pub lesson_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct StartResponse {
    pub progress: Progress,
}

#[derive(Debug, Serialize)]
pub struct LeaderboardResponse {
    pub leaderboard: Vec<LeaderboardEntry>,
}

fn lesson_id(payload: Result<Json<LessonRequest>, JsonRejection>) -> Result<Uuid, ApiError> {
    let Json(request) = payload?;
    request
        .lesson_id
        .ok_or_else(|| ApiError::BadRequest("lessonId is required".into()))
}

/// POST /api/progress/start
pub async fn start_lesson(
    State(state): State<Arc<AppState>>,
    auth: Authenticated,
    payload: Result<Json<LessonRequest>, JsonRejection>,
) -> Result<Json<StartResponse>, ApiError> {
    let claims = auth.require(&state, Operation::StartLesson)?;
    let lesson_id = lesson_id(payload)?;

    let progress = state.engine.start(claims.id, lesson_id).await?;
    Ok(Json(StartResponse { progress }))
}

/// POST /api/progress/complete
pub async fn complete_lesson(
    State(state): State<Arc<AppState>>,
    auth: Authenticated,
    payload: Result<Json<LessonRequest>, JsonRejection>,
) -> Result<Json<CompletionOutcome>, ApiError> {
    let claims = auth.require(&state, Operation::CompleteLesson)?;
    let lesson_id = lesson_id(payload)?;

    Ok(Json(state.engine.complete(claims.id, lesson_id).await?))
}

/// GET /api/progress/course/{courseId}
pub async fn course_progress(
    State(state): State<Arc<AppState>>,
    auth: Authenticated,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<CourseProgress>, ApiError> {
    let claims = auth.require(&state, Operation::ViewCourseProgress)?;
    let Path(course_id) = path?;

    Ok(Json(state.engine.course_progress(claims.id, course_id).await?))
}

/// GET /api/progress/leaderboard
pub async fn leaderboard(
    State(state): State<Arc<AppState>>,
    auth: Authenticated,
) -> Result<Json<LeaderboardResponse>, ApiError> {
    let claims = auth.require(&state, Operation::ViewLeaderboard)?;
    let leaderboard = state
        .engine
        .leaderboard(claims.id, state.leaderboard_limit)
        .await?;

    Ok(Json(LeaderboardResponse { leaderboard }))
}
