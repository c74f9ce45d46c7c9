//! Catalog and summarizer collaborators
//!
//! Course and lesson content is owned elsewhere. The engine only reads the
//! facts it needs (XP reward, lesson to course mapping, lesson ordering) and
//! the per-lesson summary cache slot.

use async_trait::async_trait;
use learntn_core::{CourseFact, LessonFact};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{PoisonError, RwLock};
use tracing::info;
use uuid::Uuid;

use crate::storage::StorageError;

/// XP reward for a lesson that does not name one
pub const DEFAULT_XP_REWARD: u64 = 10;

/// Read access to course and lesson facts
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn lesson(&self, id: Uuid) -> Result<Option<LessonFact>, StorageError>;

    async fn course(&self, id: Uuid) -> Result<Option<CourseFact>, StorageError>;

    /// Lessons of a course ordered by position, then id
    async fn course_lessons(&self, course_id: Uuid) -> Result<Vec<LessonFact>, StorageError>;

    /// Text content of a lesson
    async fn lesson_content(&self, id: Uuid) -> Result<Option<String>, StorageError>;

    /// The populated summary slot of a lesson, if any
    async fn cached_summary(&self, id: Uuid) -> Result<Option<String>, StorageError>;

    /// Store `summary` unless the slot is already populated; returns the
    /// value left in the slot
    async fn fill_summary(&self, id: Uuid, summary: String) -> Result<String, StorageError>;
}

#[derive(Debug, Clone)]
struct LessonEntry {
    fact: LessonFact,
    content: String,
    summary: Option<String>,
}

/// Catalog held in memory, optionally seeded from a JSON file
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    courses: RwLock<HashMap<Uuid, CourseFact>>,
    lessons: RwLock<HashMap<Uuid, LessonEntry>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CatalogFile {
    #[serde(default)]
    courses: Vec<CourseRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CourseRecord {
    id: Uuid,
    owner_id: Uuid,
    title: String,
    #[serde(default)]
    lessons: Vec<LessonRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LessonRecord {
    id: Uuid,
    title: String,
    #[serde(default)]
    content: String,
    #[serde(default = "default_xp_reward")]
    xp_reward: u64,
    #[serde(default = "default_position")]
    position: i32,
    #[serde(default)]
    summary: Option<String>,
}

fn default_xp_reward() -> u64 {
    DEFAULT_XP_REWARD
}

fn default_position() -> i32 {
    1
}

fn poisoned<T>(_: PoisonError<T>) -> StorageError {
    StorageError::Poisoned
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a catalog from a JSON document of the form
    /// `{"courses": [{"id", "ownerId", "title", "lessons": [...]}]}`
    pub fn from_json(json: &str) -> Result<Self, StorageError> {
        let file: CatalogFile =
            serde_json::from_str(json).map_err(|e| StorageError::Serialization(e.to_string()))?;

        let catalog = Self::new();
        for course in file.courses {
            let course_id = course.id;
            catalog.add_course(CourseFact {
                id: course.id,
                owner_id: course.owner_id,
                title: course.title,
            })?;
            for lesson in course.lessons {
                catalog.insert_lesson(LessonEntry {
                    fact: LessonFact {
                        id: lesson.id,
                        course_id,
                        title: lesson.title,
                        xp_reward: lesson.xp_reward,
                        position: lesson.position,
                    },
                    content: lesson.content,
                    summary: lesson.summary.filter(|s| !s.is_empty()),
                })?;
            }
        }
        Ok(catalog)
    }

    /// Load a catalog from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| StorageError::NotFound(format!("catalog {}: {}", path.display(), e)))?;
        let catalog = Self::from_json(&json)?;
        info!(
            path = %path.display(),
            courses = catalog.course_count(),
            "Loaded catalog"
        );
        Ok(catalog)
    }

    pub fn add_course(&self, course: CourseFact) -> Result<(), StorageError> {
        self.courses.write().map_err(poisoned)?.insert(course.id, course);
        Ok(())
    }

    pub fn add_lesson(&self, lesson: LessonFact, content: impl Into<String>) -> Result<(), StorageError> {
        self.insert_lesson(LessonEntry {
            fact: lesson,
            content: content.into(),
            summary: None,
        })
    }

    fn insert_lesson(&self, entry: LessonEntry) -> Result<(), StorageError> {
        self.lessons.write().map_err(poisoned)?.insert(entry.fact.id, entry);
        Ok(())
    }

    fn course_count(&self) -> usize {
        self.courses.read().map(|c| c.len()).unwrap_or_default()
    }
}

#[async_trait]
impl Catalog for MemoryCatalog {
    async fn lesson(&self, id: Uuid) -> Result<Option<LessonFact>, StorageError> {
        let lessons = self.lessons.read().map_err(poisoned)?;
        Ok(lessons.get(&id).map(|entry| entry.fact.clone()))
    }

    async fn course(&self, id: Uuid) -> Result<Option<CourseFact>, StorageError> {
        let courses = self.courses.read().map_err(poisoned)?;
        Ok(courses.get(&id).cloned())
    }

    async fn course_lessons(&self, course_id: Uuid) -> Result<Vec<LessonFact>, StorageError> {
        let lessons = self.lessons.read().map_err(poisoned)?;
        let mut facts: Vec<LessonFact> = lessons
            .values()
            .filter(|entry| entry.fact.course_id == course_id)
            .map(|entry| entry.fact.clone())
            .collect();
        facts.sort_by(|a, b| a.position.cmp(&b.position).then_with(|| a.id.cmp(&b.id)));
        Ok(facts)
    }

    async fn lesson_content(&self, id: Uuid) -> Result<Option<String>, StorageError> {
        let lessons = self.lessons.read().map_err(poisoned)?;
        Ok(lessons.get(&id).map(|entry| entry.content.clone()))
    }

    async fn cached_summary(&self, id: Uuid) -> Result<Option<String>, StorageError> {
        let lessons = self.lessons.read().map_err(poisoned)?;
        Ok(lessons.get(&id).and_then(|entry| entry.summary.clone()))
    }

    async fn fill_summary(&self, id: Uuid, summary: String) -> Result<String, StorageError> {
        let mut lessons = self.lessons.write().map_err(poisoned)?;
        let entry = lessons
            .get_mut(&id)
            .ok_or_else(|| StorageError::NotFound(format!("lesson {}", id)))?;
        Ok(entry.summary.get_or_insert(summary).clone())
    }
}

// =============================================================================
// Summarizer
// =============================================================================

/// Errors from a summarization backend
#[derive(Debug, thiserror::Error)]
pub enum SummaryError {
    #[error("Nothing to summarize")]
    EmptyContent,

    #[error("Summarizer unavailable: {0}")]
    Unavailable(String),
}

/// Produces a short summary of lesson text
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, content: &str) -> Result<String, SummaryError>;
}

/// Keeps the leading sentences of the content
#[derive(Debug, Clone)]
pub struct LeadSentenceSummarizer {
    max_sentences: usize,
}

impl LeadSentenceSummarizer {
    pub fn new(max_sentences: usize) -> Self {
        Self {
            max_sentences: max_sentences.max(1),
        }
    }
}

impl Default for LeadSentenceSummarizer {
    fn default() -> Self {
        Self::new(3)
    }
}

#[async_trait]
impl Summarizer for LeadSentenceSummarizer {
    async fn summarize(&self, content: &str) -> Result<String, SummaryError> {
        let text = content.split_whitespace().collect::<Vec<_>>().join(" ");
        if text.is_empty() {
            return Err(SummaryError::EmptyContent);
        }

        let mut end = text.len();
        let mut sentences = 0;
        let mut chars = text.char_indices().peekable();
        while let Some((idx, c)) = chars.next() {
            let at_boundary = matches!(chars.peek(), None | Some((_, ' ')));
            if matches!(c, '.' | '!' | '?') && at_boundary {
                sentences += 1;
                if sentences == self.max_sentences {
                    end = idx + c.len_utf8();
                    break;
                }
            }
        }

        Ok(text[..end].to_string())
    }
}
