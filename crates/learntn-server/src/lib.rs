//! LearnTn Server
//!
//! The identity & progression service of the LearnTn e-learning platform:
//! - Issues, rotates and revokes access/refresh credential pairs
//! - Gates every request on a verified identity and its role
//! - Records lesson starts and completions, awards XP exactly once
//! - Derives levels and marks enrollments completed when a course is done
//!
//! ## API Endpoints
//!
//! ### Credentials
//! - `POST /api/auth/register` - Create an identity and issue its first pair
//! - `POST /api/auth/login` - Issue a new pair
//! - `POST /api/auth/refresh` - Rotate a refresh token
//! - `POST /api/auth/logout` - Revoke the caller's refresh token
//! - `GET /api/auth/profile` - The caller's identity summary
//!
//! ### Enrollments
//! - `POST /api/enrollments` - Enroll in a course
//! - `GET /api/enrollments/my` - The caller's enrollments
//! - `DELETE /api/enrollments/{courseId}` - Drop a course
//! - `GET /api/enrollments/course/{courseId}` - Roster, for the course owner
//!
//! ### Progress
//! - `POST /api/progress/start` - Start a lesson
//! - `POST /api/progress/complete` - Complete a lesson
//! - `GET /api/progress/course/{courseId}` - Per-lesson progress and summary
//! - `GET /api/progress/leaderboard` - Top learners by XP
//!
//! ### Lessons
//! - `POST /api/lessons/{lessonId}/summarize` - Cached lesson summary

pub mod api;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod storage;

pub use api::create_router;
pub use api::state::AppState;
pub use catalog::{Catalog, LeadSentenceSummarizer, MemoryCatalog, Summarizer};
pub use config::ServerConfig;
pub use engine::{ProgressEngine, ProgressError};
pub use storage::{LearningStore, MemoryStore};
