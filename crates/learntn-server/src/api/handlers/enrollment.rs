//! Enrollment handlers

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    Json,
};
use learntn_core::{Enrollment, Operation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::extract::Authenticated;
use crate::api::state::AppState;
use crate::engine::RosterEntry;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollRequest {
    pub course_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct EnrollmentResponse {
    pub enrollment: Enrollment,
}

#[derive(Debug, Serialize)]
pub struct EnrollmentListResponse {
    pub enrollments: Vec<Enrollment>,
}

#[derive(Debug, Serialize)]
pub struct RosterResponse {
    pub enrollments: Vec<RosterEntry>,
}

/// POST /api/enrollments
pub async fn enroll(
    State(state): State<Arc<AppState>>,
    auth: Authenticated,
    payload: Result<Json<EnrollRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<EnrollmentResponse>), ApiError> {
    let claims = auth.require(&state, Operation::Enroll)?;
    let Json(request) = payload?;
    let course_id = request
        .course_id
        .ok_or_else(|| ApiError::BadRequest("courseId is required".into()))?;

    let enrollment = state.engine.enroll(claims.id, course_id).await?;
    Ok((StatusCode::CREATED, Json(EnrollmentResponse { enrollment })))
}

/// GET /api/enrollments/my
pub async fn my_enrollments(
    State(state): State<Arc<AppState>>,
    auth: Authenticated,
) -> Result<Json<EnrollmentListResponse>, ApiError> {
    let claims = auth.require(&state, Operation::ListEnrollments)?;

    Ok(Json(EnrollmentListResponse {
        enrollments: state.engine.my_enrollments(claims.id).await?,
    }))
}

/// DELETE /api/enrollments/{courseId}
pub async fn drop_course(
    State(state): State<Arc<AppState>>,
    auth: Authenticated,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let claims = auth.require(&state, Operation::DropCourse)?;
    let Path(course_id) = path?;
    state.engine.drop_course(claims.id, course_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/enrollments/course/{courseId}
pub async fn course_roster(
    State(state): State<Arc<AppState>>,
    auth: Authenticated,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<RosterResponse>, ApiError> {
    let claims = auth.require(&state, Operation::ViewRoster)?;
    let Path(course_id) = path?;

    Ok(Json(RosterResponse {
        enrollments: state.engine.roster(claims.id, course_id).await?,
    }))
}
