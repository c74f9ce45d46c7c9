//! In-memory storage backend
//!
//! Default storage implementation using lock-guarded hashmaps.
//! Suitable for development and single-instance deployments.
//! Data is lost on restart.
//!
//! Compound operations run under one write guard. When two maps are needed
//! the progress map is locked before the identity map.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use learntn_core::{
    leaderboard_order, Enrollment, EnrollmentStatus, Identity, Progress, Role, XpAward,
};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

use super::{CompletionRecord, LearningStore, StorageError};

fn poisoned<T>(_: PoisonError<T>) -> StorageError {
    StorageError::Poisoned
}

/// In-memory learning store implementation
#[derive(Debug, Default)]
pub struct MemoryStore {
    identities: RwLock<HashMap<Uuid, Identity>>,
    enrollments: RwLock<HashMap<(Uuid, Uuid), Enrollment>>,
    progress: RwLock<HashMap<(Uuid, Uuid), Progress>>,
}

impl MemoryStore {
    /// Create a new in-memory store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LearningStore for MemoryStore {
    // =========================================================================
    // Identities
    // =========================================================================

    async fn create_identity(&self, identity: Identity) -> Result<Identity, StorageError> {
        let mut identities = self.identities.write().map_err(poisoned)?;
        if identities.values().any(|existing| existing.email == identity.email) {
            return Err(StorageError::AlreadyExists(format!("identity {}", identity.email)));
        }
        info!(identity_id = %identity.id, role = %identity.role, "Registered identity");
        identities.insert(identity.id, identity.clone());
        Ok(identity)
    }

    async fn get_identity(&self, id: Uuid) -> Result<Option<Identity>, StorageError> {
        let identities = self.identities.read().map_err(poisoned)?;
        Ok(identities.get(&id).cloned())
    }

    async fn find_identity_by_email(&self, email: &str) -> Result<Option<Identity>, StorageError> {
        let identities = self.identities.read().map_err(poisoned)?;
        Ok(identities.values().find(|i| i.email == email).cloned())
    }

    async fn leaderboard(&self, limit: usize) -> Result<Vec<Identity>, StorageError> {
        let identities = self.identities.read().map_err(poisoned)?;
        let mut learners: Vec<Identity> = identities
            .values()
            .filter(|i| i.role == Role::Learner)
            .cloned()
            .collect();
        learners.sort_by(leaderboard_order);
        learners.truncate(limit);
        Ok(learners)
    }

    // =========================================================================
    // Refresh Slot
    // =========================================================================

    async fn set_refresh_token(&self, id: Uuid, token: Option<&str>) -> Result<(), StorageError> {
        let mut identities = self.identities.write().map_err(poisoned)?;
        let identity = identities
            .get_mut(&id)
            .ok_or_else(|| StorageError::NotFound(format!("identity {}", id)))?;
        identity.refresh_token = token.map(str::to_string);
        Ok(())
    }

    async fn compare_and_swap_refresh_token(
        &self,
        id: Uuid,
        expected: &str,
        replacement: &str,
    ) -> Result<bool, StorageError> {
        let mut identities = self.identities.write().map_err(poisoned)?;
        match identities.get_mut(&id) {
            Some(identity) if identity.refresh_token.as_deref() == Some(expected) => {
                identity.refresh_token = Some(replacement.to_string());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    // =========================================================================
    // Enrollments
    // =========================================================================

    async fn create_enrollment(&self, enrollment: Enrollment) -> Result<Enrollment, StorageError> {
        let mut enrollments = self.enrollments.write().map_err(poisoned)?;
        let key = (enrollment.student_id, enrollment.course_id);
        if enrollments.contains_key(&key) {
            return Err(StorageError::AlreadyExists(format!(
                "enrollment {}/{}",
                enrollment.student_id, enrollment.course_id
            )));
        }
        enrollments.insert(key, enrollment.clone());
        Ok(enrollment)
    }

    async fn get_enrollment(
        &self,
        student_id: Uuid,
        course_id: Uuid,
    ) -> Result<Option<Enrollment>, StorageError> {
        let enrollments = self.enrollments.read().map_err(poisoned)?;
        Ok(enrollments.get(&(student_id, course_id)).cloned())
    }

    async fn list_student_enrollments(&self, student_id: Uuid) -> Result<Vec<Enrollment>, StorageError> {
        let enrollments = self.enrollments.read().map_err(poisoned)?;
        let mut mine: Vec<Enrollment> = enrollments
            .values()
            .filter(|e| e.student_id == student_id)
            .cloned()
            .collect();
        mine.sort_by(|a, b| b.enrolled_at.cmp(&a.enrolled_at).then_with(|| a.id.cmp(&b.id)));
        Ok(mine)
    }

    async fn list_course_enrollments(&self, course_id: Uuid) -> Result<Vec<Enrollment>, StorageError> {
        let enrollments = self.enrollments.read().map_err(poisoned)?;
        let mut roster: Vec<Enrollment> = enrollments
            .values()
            .filter(|e| e.course_id == course_id)
            .cloned()
            .collect();
        roster.sort_by(|a, b| a.enrolled_at.cmp(&b.enrolled_at).then_with(|| a.id.cmp(&b.id)));
        Ok(roster)
    }

    async fn set_enrollment_status(
        &self,
        student_id: Uuid,
        course_id: Uuid,
        status: EnrollmentStatus,
    ) -> Result<bool, StorageError> {
        let mut enrollments = self.enrollments.write().map_err(poisoned)?;
        match enrollments.get_mut(&(student_id, course_id)) {
            Some(enrollment) => {
                enrollment.status = status;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn complete_enrollment(&self, student_id: Uuid, course_id: Uuid) -> Result<bool, StorageError> {
        let mut enrollments = self.enrollments.write().map_err(poisoned)?;
        match enrollments.get_mut(&(student_id, course_id)) {
            Some(enrollment) if enrollment.status == EnrollmentStatus::Active => {
                enrollment.status = EnrollmentStatus::Completed;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn reactivate_enrollment(
        &self,
        student_id: Uuid,
        course_id: Uuid,
    ) -> Result<Option<Enrollment>, StorageError> {
        let mut enrollments = self.enrollments.write().map_err(poisoned)?;
        match enrollments.get_mut(&(student_id, course_id)) {
            Some(enrollment) if enrollment.status == EnrollmentStatus::Dropped => {
                enrollment.status = EnrollmentStatus::Active;
                debug!(student_id = %student_id, course_id = %course_id, "Enrollment reactivated");
                Ok(Some(enrollment.clone()))
            }
            _ => Ok(None),
        }
    }

    // =========================================================================
    // Progress
    // =========================================================================

    async fn start_progress(&self, progress: Progress) -> Result<Progress, StorageError> {
        let mut rows = self.progress.write().map_err(poisoned)?;
        let stored = rows
            .entry((progress.student_id, progress.lesson_id))
            .or_insert(progress);
        Ok(stored.clone())
    }

    async fn record_completion(
        &self,
        student_id: Uuid,
        lesson_id: Uuid,
        xp_reward: u64,
        now: DateTime<Utc>,
    ) -> Result<CompletionRecord, StorageError> {
        let mut rows = self.progress.write().map_err(poisoned)?;
        let mut identities = self.identities.write().map_err(poisoned)?;

        let identity = identities
            .get_mut(&student_id)
            .ok_or_else(|| StorageError::NotFound(format!("identity {}", student_id)))?;

        let row = rows
            .entry((student_id, lesson_id))
            .or_insert_with(|| Progress::started(student_id, lesson_id, now));

        if !row.mark_completed(xp_reward, now) {
            debug!(student_id = %student_id, lesson_id = %lesson_id, "Lesson already completed");
            return Ok(CompletionRecord::AlreadyCompleted(row.clone()));
        }

        let award = XpAward::apply(identity.xp, identity.level, xp_reward);
        identity.xp = award.xp;
        identity.level = award.level;

        Ok(CompletionRecord::Completed {
            progress: row.clone(),
            award,
        })
    }

    async fn get_progress(
        &self,
        student_id: Uuid,
        lesson_id: Uuid,
    ) -> Result<Option<Progress>, StorageError> {
        let rows = self.progress.read().map_err(poisoned)?;
        Ok(rows.get(&(student_id, lesson_id)).cloned())
    }

    async fn list_progress(
        &self,
        student_id: Uuid,
        lesson_ids: &[Uuid],
    ) -> Result<Vec<Progress>, StorageError> {
        let rows = self.progress.read().map_err(poisoned)?;
        Ok(lesson_ids
            .iter()
            .filter_map(|lesson_id| rows.get(&(student_id, *lesson_id)).cloned())
            .collect())
    }
}
