//! Lesson summary cache

use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use super::{ProgressEngine, ProgressError, Result};
use crate::catalog::Summarizer;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonSummary {
    pub lesson_id: Uuid,
    pub summary: String,
    /// True when the slot was already populated and no summarizer ran
    pub cached: bool,
}

impl ProgressEngine {
    /// Return the lesson's cached summary, generating and storing it on a miss
    pub async fn summarize(&self, lesson_id: Uuid, summarizer: &dyn Summarizer) -> Result<LessonSummary> {
        let lesson = self.require_lesson(lesson_id).await?;

        if let Some(summary) = self.catalog.cached_summary(lesson.id).await? {
            return Ok(LessonSummary {
                lesson_id: lesson.id,
                summary,
                cached: true,
            });
        }

        let content = self
            .catalog
            .lesson_content(lesson.id)
            .await?
            .ok_or_else(|| ProgressError::NotFound("Lesson content".into()))?;
        let generated = summarizer.summarize(&content).await?;
        let summary = self.catalog.fill_summary(lesson.id, generated).await?;

        info!(lesson_id = %lesson.id, "Stored lesson summary");
        Ok(LessonSummary {
            lesson_id: lesson.id,
            summary,
            cached: false,
        })
    }
}
