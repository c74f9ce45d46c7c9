//! Progression engine
//!
//! Records lesson starts and completions, awards XP, aggregates course
//! completion and serves the read-side projections (course progress,
//! leaderboard, enrollments, lesson summaries).
//!
//! The engine never holds a lock across steps. Every check-then-act is a
//! single [`LearningStore`] call, so concurrent requests for the same student
//! cannot both observe "not yet completed".

mod enrollment;
mod leaderboard;
mod progress;
mod summary;

pub use enrollment::RosterEntry;
pub use leaderboard::LeaderboardEntry;
pub use progress::{percent_complete, CompletionOutcome, CourseProgress, LessonProgress, ProgressSummary};
pub use summary::LessonSummary;

use std::sync::Arc;

use crate::catalog::{Catalog, SummaryError};
use crate::storage::{LearningStore, StorageError};

/// Errors from engine operations
#[derive(Debug, thiserror::Error)]
pub enum ProgressError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Summary failed: {0}")]
    Summary(#[from] SummaryError),
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, ProgressError>;

/// Owns every write to progress rows and completion-triggered enrollment
/// status changes
#[derive(Clone)]
pub struct ProgressEngine {
    store: Arc<dyn LearningStore>,
    catalog: Arc<dyn Catalog>,
}

impl ProgressEngine {
    pub fn new(store: Arc<dyn LearningStore>, catalog: Arc<dyn Catalog>) -> Self {
        Self { store, catalog }
    }

    pub fn store(&self) -> &Arc<dyn LearningStore> {
        &self.store
    }

    pub fn catalog(&self) -> &Arc<dyn Catalog> {
        &self.catalog
    }
}
