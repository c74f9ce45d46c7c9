//! Lesson start/completion and the course progress projection

use chrono::{DateTime, Utc};
use learntn_core::{Enrollment, LessonFact, Progress};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{ProgressEngine, ProgressError, Result};
use crate::storage::CompletionRecord;

/// Result of a `complete` call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionOutcome {
    pub already_completed: bool,
    /// XP awarded by this call (0 on a repeat)
    pub xp_earned: u64,
    #[serde(rename = "totalXP")]
    pub total_xp: u64,
    pub level: u64,
    pub leveled_up: bool,
    pub course_completed: bool,
    pub completed_lessons: usize,
    pub total_lessons: usize,
}

/// One lesson's row in a course progress projection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonProgress {
    pub lesson_id: Uuid,
    pub lesson_title: String,
    pub position: i32,
    pub xp_reward: u64,
    pub is_completed: bool,
    pub xp_earned: u64,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSummary {
    pub total_lessons: usize,
    pub completed_count: usize,
    #[serde(rename = "totalXP")]
    pub total_xp: u64,
    pub percent_complete: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseProgress {
    pub course_id: Uuid,
    pub progress: Vec<LessonProgress>,
    pub summary: ProgressSummary,
}

/// `completed / total` as a percentage rounded half up; 0 for an empty course
pub fn percent_complete(completed: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    let completed = completed.min(total) as u64;
    let total = total as u64;
    ((2 * 100 * completed + total) / (2 * total)) as u32
}

struct CourseTally {
    completed: usize,
    total: usize,
}

impl CourseTally {
    fn is_complete(&self) -> bool {
        self.total > 0 && self.completed == self.total
    }
}

impl ProgressEngine {
    /// Record that a student opened a lesson
    ///
    /// Returns the existing row unchanged if there is one.
    pub async fn start(&self, student_id: Uuid, lesson_id: Uuid) -> Result<Progress> {
        let lesson = self.require_lesson(lesson_id).await?;
        let progress = self
            .store
            .start_progress(Progress::started(student_id, lesson.id, Utc::now()))
            .await?;

        debug!(student_id = %student_id, lesson_id = %lesson.id, state = ?progress.state(), "Lesson started");
        Ok(progress)
    }

    /// Complete a lesson, award its XP once and update course completion
    pub async fn complete(&self, student_id: Uuid, lesson_id: Uuid) -> Result<CompletionOutcome> {
        let lesson = self.require_lesson(lesson_id).await?;
        self.require_enrollment(student_id, lesson.course_id).await?;

        let record = self
            .store
            .record_completion(student_id, lesson.id, lesson.xp_reward, Utc::now())
            .await?;

        let mut outcome = match record {
            CompletionRecord::Completed { award, .. } => {
                info!(
                    student_id = %student_id,
                    lesson_id = %lesson.id,
                    xp_earned = award.awarded,
                    total_xp = award.xp,
                    "Lesson completed"
                );
                if award.leveled_up() {
                    info!(
                        student_id = %student_id,
                        from = award.previous_level,
                        to = award.level,
                        "Level up"
                    );
                }
                CompletionOutcome {
                    already_completed: false,
                    xp_earned: award.awarded,
                    total_xp: award.xp,
                    level: award.level,
                    leveled_up: award.leveled_up(),
                    course_completed: false,
                    completed_lessons: 0,
                    total_lessons: 0,
                }
            }
            CompletionRecord::AlreadyCompleted(_) => {
                debug!(student_id = %student_id, lesson_id = %lesson.id, "Repeat completion, no XP");
                let identity = self
                    .store
                    .get_identity(student_id)
                    .await?
                    .ok_or_else(|| ProgressError::NotFound("Identity".into()))?;
                CompletionOutcome {
                    already_completed: true,
                    xp_earned: 0,
                    total_xp: identity.xp,
                    level: identity.level,
                    leveled_up: false,
                    course_completed: false,
                    completed_lessons: 0,
                    total_lessons: 0,
                }
            }
        };

        // Counted after the completion has committed, so the last of two
        // concurrent completions always sees both rows.
        let tally = self.reconcile_course(student_id, lesson.course_id).await?;
        outcome.course_completed = tally.is_complete();
        outcome.completed_lessons = tally.completed;
        outcome.total_lessons = tally.total;
        Ok(outcome)
    }

    /// Per-lesson progress for a course, ordered by lesson position
    ///
    /// A missed enrollment flip is repaired here.
    pub async fn course_progress(&self, student_id: Uuid, course_id: Uuid) -> Result<CourseProgress> {
        let lessons = self.catalog.course_lessons(course_id).await?;
        let rows = self.progress_by_lesson(student_id, &lessons).await?;

        let progress: Vec<LessonProgress> = lessons
            .iter()
            .map(|lesson| {
                let row = rows.get(&lesson.id);
                LessonProgress {
                    lesson_id: lesson.id,
                    lesson_title: lesson.title.clone(),
                    position: lesson.position,
                    xp_reward: lesson.xp_reward,
                    is_completed: row.is_some_and(|p| p.is_completed),
                    xp_earned: row.map_or(0, |p| p.xp_earned),
                    started_at: row.and_then(|p| p.started_at),
                    completed_at: row.and_then(|p| p.completed_at),
                }
            })
            .collect();

        let completed_count = progress.iter().filter(|p| p.is_completed).count();
        let tally = CourseTally {
            completed: completed_count,
            total: progress.len(),
        };
        if tally.is_complete() {
            self.flip_enrollment(student_id, course_id).await?;
        }

        let summary = ProgressSummary {
            total_lessons: progress.len(),
            completed_count,
            total_xp: progress.iter().map(|p| p.xp_earned).sum(),
            percent_complete: percent_complete(completed_count, progress.len()),
        };

        Ok(CourseProgress {
            course_id,
            progress,
            summary,
        })
    }

    pub(super) async fn require_lesson(&self, lesson_id: Uuid) -> Result<LessonFact> {
        self.catalog
            .lesson(lesson_id)
            .await?
            .ok_or_else(|| ProgressError::NotFound("Lesson".into()))
    }

    /// Active or completed enrollment; a finished course still accepts repeat completions
    async fn require_enrollment(&self, student_id: Uuid, course_id: Uuid) -> Result<Enrollment> {
        match self.store.get_enrollment(student_id, course_id).await? {
            Some(enrollment) if enrollment.permits_progress() => Ok(enrollment),
            Some(_) => {
                warn!(student_id = %student_id, course_id = %course_id, "Completion on dropped enrollment");
                Err(ProgressError::Forbidden("Your enrollment in this course was dropped".into()))
            }
            None => {
                warn!(student_id = %student_id, course_id = %course_id, "Completion without enrollment");
                Err(ProgressError::Forbidden("You are not enrolled in this course".into()))
            }
        }
    }

    async fn progress_by_lesson(
        &self,
        student_id: Uuid,
        lessons: &[LessonFact],
    ) -> Result<HashMap<Uuid, Progress>> {
        let ids: Vec<Uuid> = lessons.iter().map(|l| l.id).collect();
        let rows = self.store.list_progress(student_id, &ids).await?;
        Ok(rows.into_iter().map(|p| (p.lesson_id, p)).collect())
    }

    async fn reconcile_course(&self, student_id: Uuid, course_id: Uuid) -> Result<CourseTally> {
        let lessons = self.catalog.course_lessons(course_id).await?;
        let rows = self.progress_by_lesson(student_id, &lessons).await?;
        let tally = CourseTally {
            completed: rows.values().filter(|p| p.is_completed).count(),
            total: lessons.len(),
        };

        if tally.is_complete() {
            self.flip_enrollment(student_id, course_id).await?;
        }
        Ok(tally)
    }

    async fn flip_enrollment(&self, student_id: Uuid, course_id: Uuid) -> Result<()> {
        if self.store.complete_enrollment(student_id, course_id).await? {
            info!(student_id = %student_id, course_id = %course_id, "Course completed");
        }
        Ok(())
    }
}
