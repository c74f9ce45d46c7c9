//! Enrollment lifecycle

use chrono::Utc;
use learntn_core::{check_owner, Enrollment, EnrollmentStatus, IdentitySummary};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use super::{ProgressEngine, ProgressError, Result};
use crate::storage::StorageError;

/// One roster line: the enrollment row plus the enrolled student
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    #[serde(flatten)]
    pub enrollment: Enrollment,
    /// `None` if the identity row no longer exists
    pub student: Option<IdentitySummary>,
}

impl ProgressEngine {
    /// Enroll a student in a catalog course
    ///
    /// A dropped enrollment is reactivated in place; earlier lesson progress
    /// is kept and never awards XP twice.
    pub async fn enroll(&self, student_id: Uuid, course_id: Uuid) -> Result<Enrollment> {
        self.catalog
            .course(course_id)
            .await?
            .ok_or_else(|| ProgressError::NotFound("Course".into()))?;

        match self
            .store
            .create_enrollment(Enrollment::new(student_id, course_id, Utc::now()))
            .await
        {
            Ok(enrollment) => {
                info!(student_id = %student_id, course_id = %course_id, "Enrollment created");
                Ok(enrollment)
            }
            Err(StorageError::AlreadyExists(_)) => {
                match self.store.reactivate_enrollment(student_id, course_id).await? {
                    Some(enrollment) => {
                        info!(student_id = %student_id, course_id = %course_id, "Enrollment reactivated");
                        Ok(enrollment)
                    }
                    None => Err(ProgressError::Conflict("Already enrolled in this course".into())),
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Mark an enrollment dropped
    pub async fn drop_course(&self, student_id: Uuid, course_id: Uuid) -> Result<()> {
        let updated = self
            .store
            .set_enrollment_status(student_id, course_id, EnrollmentStatus::Dropped)
            .await?;
        if !updated {
            return Err(ProgressError::NotFound("Enrollment".into()));
        }

        info!(student_id = %student_id, course_id = %course_id, "Enrollment dropped");
        Ok(())
    }

    pub async fn my_enrollments(&self, student_id: Uuid) -> Result<Vec<Enrollment>> {
        Ok(self.store.list_student_enrollments(student_id).await?)
    }

    /// Enrollments of a course with their students, visible only to the course owner
    pub async fn roster(&self, actor_id: Uuid, course_id: Uuid) -> Result<Vec<RosterEntry>> {
        let course = self
            .catalog
            .course(course_id)
            .await?
            .ok_or_else(|| ProgressError::NotFound("Course".into()))?;

        check_owner(actor_id, course.owner_id).map_err(|e| {
            warn!(actor_id = %actor_id, course_id = %course_id, "Roster requested by non-owner");
            ProgressError::Forbidden(e.to_string())
        })?;

        let enrollments = self.store.list_course_enrollments(course_id).await?;
        let mut roster = Vec::with_capacity(enrollments.len());
        for enrollment in enrollments {
            let student = self
                .store
                .get_identity(enrollment.student_id)
                .await?
                .map(|identity| identity.summary());
            roster.push(RosterEntry { enrollment, student });
        }
        Ok(roster)
    }
}
