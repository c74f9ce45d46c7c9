//! Lesson summary handler

use axum::{
    extract::{rejection::PathRejection, Path, State},
    Json,
};
use learntn_core::Operation;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::extract::Authenticated;
use crate::api::state::AppState;
use crate::engine::LessonSummary;

/// Serve the cached summary, generating it on the first request
///
/// POST /api/lessons/{lessonId}/summarize
pub async fn summarize_lesson(
    State(state): State<Arc<AppState>>,
    auth: Authenticated,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<LessonSummary>, ApiError> {
    auth.require(&state, Operation::SummarizeLesson)?;
    let Path(lesson_id) = path?;

    let summary = state
        .engine
        .summarize(lesson_id, state.summarizer.as_ref())
        .await?;
    Ok(Json(summary))
}
