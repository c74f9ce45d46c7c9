//! Storage abstraction for the progression service
//!
//! A trait-based abstraction over identity, enrollment and progress rows,
//! with an in-memory backend (default) and a PostgreSQL backend.
//!
//! Every check-then-act the engine relies on is a single trait method so that
//! each backend can make it atomic:
//! - refresh-slot compare-and-swap
//! - progress insert-if-absent
//! - progress transition to completed together with the XP award
//! - enrollment flip from active to completed
//! - enrollment flip from dropped back to active

pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use memory::MemoryStore;
#[cfg(feature = "postgres")]
pub use postgres::PostgresStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use learntn_auth::{AuthError, RefreshSlotStore, TokenSubject};
use learntn_core::{Enrollment, EnrollmentStatus, Identity, Progress, XpAward};
use std::fmt::Debug;
use std::sync::Arc;
use uuid::Uuid;

/// Error type for storage operations
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Storage lock poisoned")]
    Poisoned,
}

/// Outcome of a completion attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionRecord {
    /// This call moved the row to completed and awarded the XP
    Completed { progress: Progress, award: XpAward },
    /// The row was already completed; nothing changed
    AlreadyCompleted(Progress),
}

/// Storage backend trait for progression state
///
/// Implementations must be thread-safe and support concurrent access.
#[async_trait]
pub trait LearningStore: Send + Sync + Debug {
    // =========================================================================
    // Identities
    // =========================================================================

    /// Insert a new identity; fails with `AlreadyExists` on a duplicate email
    async fn create_identity(&self, identity: Identity) -> Result<Identity, StorageError>;

    /// Get an identity by id
    async fn get_identity(&self, id: Uuid) -> Result<Option<Identity>, StorageError>;

    /// Get an identity by (normalized) email
    async fn find_identity_by_email(&self, email: &str) -> Result<Option<Identity>, StorageError>;

    /// Learner identities by XP descending, then registration time, then id
    async fn leaderboard(&self, limit: usize) -> Result<Vec<Identity>, StorageError>;

    // =========================================================================
    // Refresh Slot
    // =========================================================================

    /// Overwrite (or clear) the refresh slot
    async fn set_refresh_token(&self, id: Uuid, token: Option<&str>) -> Result<(), StorageError>;

    /// Overwrite the refresh slot only if it holds exactly `expected`
    async fn compare_and_swap_refresh_token(
        &self,
        id: Uuid,
        expected: &str,
        replacement: &str,
    ) -> Result<bool, StorageError>;

    // =========================================================================
    // Enrollments
    // =========================================================================

    /// Insert a new enrollment; fails with `AlreadyExists` for a duplicate pair
    async fn create_enrollment(&self, enrollment: Enrollment) -> Result<Enrollment, StorageError>;

    /// Get the enrollment for a (student, course) pair
    async fn get_enrollment(
        &self,
        student_id: Uuid,
        course_id: Uuid,
    ) -> Result<Option<Enrollment>, StorageError>;

    /// A student's enrollments, newest first
    async fn list_student_enrollments(&self, student_id: Uuid) -> Result<Vec<Enrollment>, StorageError>;

    /// A course's enrollments, oldest first
    async fn list_course_enrollments(&self, course_id: Uuid) -> Result<Vec<Enrollment>, StorageError>;

    /// Set the status unconditionally; returns whether the enrollment exists
    async fn set_enrollment_status(
        &self,
        student_id: Uuid,
        course_id: Uuid,
        status: EnrollmentStatus,
    ) -> Result<bool, StorageError>;

    /// Flip `active -> completed`; returns whether this call flipped it
    async fn complete_enrollment(&self, student_id: Uuid, course_id: Uuid) -> Result<bool, StorageError>;

    /// Flip `dropped -> active`; returns the row only if this call flipped it
    async fn reactivate_enrollment(
        &self,
        student_id: Uuid,
        course_id: Uuid,
    ) -> Result<Option<Enrollment>, StorageError>;

    // =========================================================================
    // Progress
    // =========================================================================

    /// Insert a started row unless one exists; returns the stored row
    async fn start_progress(&self, progress: Progress) -> Result<Progress, StorageError>;

    /// Move the (student, lesson) row to completed and add `xp_reward` to the
    /// student's XP as one atomic step
    ///
    /// Only one caller per pair ever observes `Completed`.
    async fn record_completion(
        &self,
        student_id: Uuid,
        lesson_id: Uuid,
        xp_reward: u64,
        now: DateTime<Utc>,
    ) -> Result<CompletionRecord, StorageError>;

    /// Get the row for a (student, lesson) pair
    async fn get_progress(
        &self,
        student_id: Uuid,
        lesson_id: Uuid,
    ) -> Result<Option<Progress>, StorageError>;

    /// Rows for a student restricted to the given lessons
    async fn list_progress(
        &self,
        student_id: Uuid,
        lesson_ids: &[Uuid],
    ) -> Result<Vec<Progress>, StorageError>;
}

/// Exposes a store's refresh slots to the token service
#[derive(Debug, Clone)]
pub struct IdentitySlots {
    store: Arc<dyn LearningStore>,
}

impl IdentitySlots {
    pub fn new(store: Arc<dyn LearningStore>) -> Self {
        Self { store }
    }
}

impl From<StorageError> for AuthError {
    fn from(err: StorageError) -> Self {
        AuthError::Store(err.to_string())
    }
}

#[async_trait]
impl RefreshSlotStore for IdentitySlots {
    async fn load_subject(&self, id: Uuid) -> learntn_auth::Result<Option<TokenSubject>> {
        let identity = self.store.get_identity(id).await?;
        Ok(identity.as_ref().map(TokenSubject::from))
    }

    async fn store_refresh_token(&self, id: Uuid, token: &str) -> learntn_auth::Result<()> {
        Ok(self.store.set_refresh_token(id, Some(token)).await?)
    }

    async fn swap_refresh_token(
        &self,
        id: Uuid,
        expected: &str,
        replacement: &str,
    ) -> learntn_auth::Result<bool> {
        Ok(self
            .store
            .compare_and_swap_refresh_token(id, expected, replacement)
            .await?)
    }

    async fn clear_refresh_token(&self, id: Uuid) -> learntn_auth::Result<()> {
        Ok(self.store.set_refresh_token(id, None).await?)
    }
}
